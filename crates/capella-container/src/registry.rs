//! The container registry.
//!
//! All containers live behind opaque handles in one process-wide table.
//! Handle values are drawn from a monotonic counter and never reused, so a
//! handle that survives its container's destruction simply stops resolving
//! instead of aliasing a newer container.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use capella_error::{CapError, Result};
use capella_types::ElementKind;
use parking_lot::RwLock;

use crate::array::ValueArray;

/// Opaque handle naming a container in a [`ContainerRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerHandle(NonZeroU64);

impl ContainerHandle {
    /// The raw handle value for the C-style boundary. Never zero.
    pub const fn raw(self) -> u64 {
        self.0.get()
    }

    /// Reconstruct a handle from its raw value. Zero is the reserved null
    /// handle and yields `None`; a nonzero value that was never issued
    /// simply fails registry lookups.
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Owner of all live containers. Cheap to share; all access is through
/// handles.
#[derive(Debug)]
pub struct ContainerRegistry {
    next: AtomicU64,
    map: RwLock<HashMap<u64, ValueArray>>,
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            map: RwLock::new(HashMap::new()),
        }
    }

    fn next_handle(&self) -> ContainerHandle {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and would take centuries to wrap.
        ContainerHandle(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Allocate a fresh container of `kind` with `initial_size`
    /// default-valued elements.
    pub fn create(&self, kind: ElementKind, initial_size: usize) -> ContainerHandle {
        self.register(ValueArray::new(kind, initial_size))
    }

    /// Take ownership of an existing array and hand back its handle.
    pub fn register(&self, array: ValueArray) -> ContainerHandle {
        let handle = self.next_handle();
        self.map.write().insert(handle.raw(), array);
        handle
    }

    /// Whether the handle names a live container.
    pub fn is_valid(&self, handle: ContainerHandle) -> bool {
        self.map.read().contains_key(&handle.raw())
    }

    /// Whether the handle names a live container of the given kind.
    pub fn is_valid_kind(&self, handle: ContainerHandle, kind: ElementKind) -> bool {
        self.kind_of(handle) == Some(kind)
    }

    /// The element kind of a live container.
    pub fn kind_of(&self, handle: ContainerHandle) -> Option<ElementKind> {
        self.map.read().get(&handle.raw()).map(ValueArray::kind)
    }

    /// The element count of a live container.
    pub fn size_of(&self, handle: ContainerHandle) -> Result<usize> {
        self.with(handle, |array| Ok(array.len()))
    }

    /// Run `f` with shared access to the container. The registry lock is
    /// held for the duration of `f`; do not call back into the registry
    /// from inside.
    pub fn with<R>(
        &self,
        handle: ContainerHandle,
        f: impl FnOnce(&ValueArray) -> Result<R>,
    ) -> Result<R> {
        let map = self.map.read();
        let array = map.get(&handle.raw()).ok_or(CapError::BadContainer)?;
        f(array)
    }

    /// Run `f` with exclusive access to the container. Same reentrancy rule
    /// as [`with`](Self::with).
    pub fn with_mut<R>(
        &self,
        handle: ContainerHandle,
        f: impl FnOnce(&mut ValueArray) -> Result<R>,
    ) -> Result<R> {
        let mut map = self.map.write();
        let array = map.get_mut(&handle.raw()).ok_or(CapError::BadContainer)?;
        f(array)
    }

    /// Remove the container and return it by value, invalidating the
    /// handle.
    pub fn take(&self, handle: ContainerHandle) -> Result<ValueArray> {
        self.map
            .write()
            .remove(&handle.raw())
            .ok_or(CapError::BadContainer)
    }

    /// Move `src`'s contents into `dest`'s slot and invalidate `src`.
    ///
    /// The kinds need not match; the destination slot adopts the source
    /// array wholesale. Fails without touching either container if either
    /// handle is stale, or if the two handles are the same.
    pub fn assign(&self, dest: ContainerHandle, src: ContainerHandle) -> Result<()> {
        if dest == src {
            return Err(CapError::invalid_param("assign to self"));
        }
        let mut map = self.map.write();
        if !map.contains_key(&dest.raw()) || !map.contains_key(&src.raw()) {
            return Err(CapError::BadContainer);
        }
        if let Some(array) = map.remove(&src.raw()) {
            map.insert(dest.raw(), array);
        }
        Ok(())
    }

    /// Destroy the container behind `handle`. Idempotent; destroying a
    /// stale handle is a no-op.
    pub fn destroy(&self, handle: ContainerHandle) {
        self.map.write().remove(&handle.raw());
    }

    /// Number of live containers (leak checks in tests, shutdown
    /// accounting).
    pub fn live_count(&self) -> usize {
        self.map.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capella_types::CapValue;

    #[test]
    fn create_lookup_destroy() {
        let reg = ContainerRegistry::new();
        let h = reg.create(ElementKind::I32, 2);
        assert!(reg.is_valid(h));
        assert!(reg.is_valid_kind(h, ElementKind::I32));
        assert!(!reg.is_valid_kind(h, ElementKind::F64));
        assert_eq!(reg.size_of(h).unwrap(), 2);

        reg.destroy(h);
        assert!(!reg.is_valid(h));
        assert!(matches!(reg.size_of(h), Err(CapError::BadContainer)));
        // Second destroy of the same handle is a no-op.
        reg.destroy(h);
        assert_eq!(reg.live_count(), 0);
    }

    #[test]
    fn handles_are_never_reused() {
        let reg = ContainerRegistry::new();
        let first = reg.create(ElementKind::I32, 0);
        reg.destroy(first);
        let second = reg.create(ElementKind::I32, 0);
        assert_ne!(first, second);
        assert!(!reg.is_valid(first));
    }

    #[test]
    fn with_mut_edits_in_place() {
        let reg = ContainerRegistry::new();
        let h = reg.create(ElementKind::StrNarrow, 1);
        reg.with_mut(h, |a| a.set_string(0, "duplex")).unwrap();
        let text = reg.with(h, |a| a.get_string(0)).unwrap();
        assert_eq!(text, "duplex");
    }

    #[test]
    fn assign_moves_and_invalidates_source() {
        let reg = ContainerRegistry::new();
        let dest = reg.create(ElementKind::I32, 0);
        let src = reg.create(ElementKind::F64, 1);
        reg.with_mut(src, |a| a.set(0, CapValue::F64(300.0))).unwrap();

        reg.assign(dest, src).unwrap();
        assert!(!reg.is_valid(src));
        // Destination slot adopted the source array, kind included.
        assert_eq!(reg.kind_of(dest), Some(ElementKind::F64));
        let v = reg.with(dest, |a| a.get(0)).unwrap();
        assert_eq!(v, CapValue::F64(300.0));
    }

    #[test]
    fn assign_with_stale_handle_touches_nothing() {
        let reg = ContainerRegistry::new();
        let dest = reg.create(ElementKind::I32, 1);
        let src = reg.create(ElementKind::I32, 1);
        reg.destroy(src);

        assert!(matches!(reg.assign(dest, src), Err(CapError::BadContainer)));
        assert!(reg.is_valid(dest));
        assert_eq!(reg.size_of(dest).unwrap(), 1);

        assert!(matches!(
            reg.assign(dest, dest),
            Err(CapError::InvalidParam { .. })
        ));
    }

    #[test]
    fn take_returns_the_array_by_value() {
        let reg = ContainerRegistry::new();
        let h = reg.create(ElementKind::I32, 0);
        reg.with_mut(h, |a| a.push(CapValue::I32(600), 1)).unwrap();
        let array = reg.take(h).unwrap();
        assert_eq!(array.get(0).unwrap(), CapValue::I32(600));
        assert!(!reg.is_valid(h));
        assert!(reg.take(h).is_err());
    }

    #[test]
    fn raw_round_trip_and_null() {
        let reg = ContainerRegistry::new();
        let h = reg.create(ElementKind::I32, 0);
        let back = ContainerHandle::from_raw(h.raw()).unwrap();
        assert_eq!(back, h);
        assert!(ContainerHandle::from_raw(0).is_none());
    }

    #[test]
    fn concurrent_creates_yield_distinct_handles() {
        use std::sync::Arc;
        let reg = Arc::new(ContainerRegistry::new());
        let mut join = Vec::new();
        for _ in 0..8 {
            let reg = Arc::clone(&reg);
            join.push(std::thread::spawn(move || {
                (0..100)
                    .map(|_| reg.create(ElementKind::I32, 0).raw())
                    .collect::<Vec<_>>()
            }));
        }
        let mut all: Vec<u64> = join
            .into_iter()
            .flat_map(|j| j.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 800);
        assert_eq!(reg.live_count(), 800);
    }
}
