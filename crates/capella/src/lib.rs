//! capella: device-capability value marshalling and negotiation.
//!
//! [`CapClient`] is the flat public surface over the whole stack: it owns
//! the container registry, the negotiation engine for one transport, and
//! the open-device table. Applications create containers, negotiate
//! capability values against devices, and work with ranges and frames
//! entirely through handles issued here.
//!
//! ```no_run
//! use capella::{CapClient, CapId, OpClass, Transport};
//! # fn open(transport: Box<dyn Transport + Send>) -> capella::Result<()> {
//! let client = CapClient::new(transport);
//! let device = client.open_device();
//! let values = client.get_capability(device, CapId::new(0x1101), OpClass::Get, None, None)?;
//! println!("{} supported values", client.container_size(values)?);
//! client.destroy_container(values);
//! client.close_device(device)?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

pub use capella_container::{
    ContainerHandle, ContainerRegistry, Rounding, ValueArray, RANGE_SLOTS,
};
pub use capella_engine::{Negotiator, Transport, TransportFail};
pub use capella_error::{CapError, ConditionCode, Result};
pub use capella_types::{
    CapId, CapValue, ContainerKind, ContainerMask, DeviceId, ElementKind, Fix32, FrameComponent,
    FrameValue, OpClass, PrimitiveType,
};

use capella_container::range;

/// The capability client: one transport, one registry, any number of open
/// device sessions.
///
/// All methods take `&self`; the negotiator sits behind a mutex so a whole
/// {cache lookup, transport trial, cache record} sequence is one critical
/// section, and the registry handles its own locking.
pub struct CapClient {
    registry: ContainerRegistry,
    negotiator: Mutex<Negotiator>,
    devices: RwLock<HashSet<DeviceId>>,
    next_device: AtomicU64,
}

impl std::fmt::Debug for CapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapClient")
            .field("open_devices", &self.devices.read().len())
            .field("live_containers", &self.registry.live_count())
            .finish_non_exhaustive()
    }
}

impl CapClient {
    pub fn new(transport: Box<dyn Transport + Send>) -> Self {
        Self {
            registry: ContainerRegistry::new(),
            negotiator: Mutex::new(Negotiator::new(transport)),
            devices: RwLock::new(HashSet::new()),
            next_device: AtomicU64::new(1),
        }
    }

    /// Direct access to the registry (embedding, C shim).
    pub fn registry(&self) -> &ContainerRegistry {
        &self.registry
    }

    // ── Device sessions ─────────────────────────────────────────────────

    /// Open a device session. Session ids are monotonic and never reused,
    /// so nothing learned about a closed session can leak into a reopened
    /// device.
    pub fn open_device(&self) -> DeviceId {
        let raw = self.next_device.fetch_add(1, Ordering::Relaxed);
        let device = DeviceId::new(raw).unwrap_or_else(|| unreachable!("counter starts at 1"));
        self.devices.write().insert(device);
        debug!(%device, "device session opened");
        device
    }

    /// Close a device session and drop everything cached about it.
    pub fn close_device(&self, device: DeviceId) -> Result<()> {
        if !self.devices.write().remove(&device) {
            return Err(CapError::BadDevice);
        }
        self.negotiator.lock().forget_device(device);
        debug!(%device, "device session closed");
        Ok(())
    }

    pub fn is_open(&self, device: DeviceId) -> bool {
        self.devices.read().contains(&device)
    }

    fn check_open(&self, device: DeviceId) -> Result<()> {
        if self.is_open(device) {
            Ok(())
        } else {
            Err(CapError::BadDevice)
        }
    }

    // ── Containers ──────────────────────────────────────────────────────

    pub fn create_container(&self, kind: ElementKind, size: usize) -> ContainerHandle {
        self.registry.create(kind, size)
    }

    /// Destroy a container. Idempotent; stale handles are a no-op.
    pub fn destroy_container(&self, handle: ContainerHandle) {
        self.registry.destroy(handle);
    }

    pub fn container_size(&self, handle: ContainerHandle) -> Result<usize> {
        self.registry.size_of(handle)
    }

    pub fn container_kind(&self, handle: ContainerHandle) -> Option<ElementKind> {
        self.registry.kind_of(handle)
    }

    pub fn is_valid(&self, handle: ContainerHandle) -> bool {
        self.registry.is_valid(handle)
    }

    pub fn get_element(&self, handle: ContainerHandle, index: usize) -> Result<CapValue> {
        self.registry.with(handle, |a| a.get(index))
    }

    pub fn set_element(&self, handle: ContainerHandle, index: usize, value: CapValue) -> Result<()> {
        self.registry.with_mut(handle, |a| a.set(index, value))
    }

    /// Append `repeat` copies of `value`.
    pub fn add_element(&self, handle: ContainerHandle, value: CapValue, repeat: usize) -> Result<()> {
        self.registry.with_mut(handle, |a| a.push(value, repeat))
    }

    pub fn insert_element(
        &self,
        handle: ContainerHandle,
        at: usize,
        value: CapValue,
        repeat: usize,
    ) -> Result<()> {
        self.registry.with_mut(handle, |a| a.insert(at, value, repeat))
    }

    pub fn remove_elements(&self, handle: ContainerHandle, at: usize, count: usize) -> Result<()> {
        self.registry.with_mut(handle, |a| a.remove(at, count))
    }

    pub fn resize_container(&self, handle: ContainerHandle, new_len: usize) -> Result<()> {
        self.registry.with_mut(handle, |a| {
            a.resize(new_len);
            Ok(())
        })
    }

    /// Drop every element; the container stays valid with its kind intact.
    pub fn clear_container(&self, handle: ContainerHandle) -> Result<()> {
        self.registry.with_mut(handle, |a| {
            a.clear();
            Ok(())
        })
    }

    /// First index whose element equals `value` (tolerance applies to the
    /// real-valued kinds). A miss is `NotFound`, not an empty success.
    pub fn find_element(
        &self,
        handle: ContainerHandle,
        value: &CapValue,
        tolerance: f64,
    ) -> Result<usize> {
        self.registry
            .with(handle, |a| a.find(value, tolerance).ok_or(CapError::NotFound))
    }

    pub fn get_element_string(&self, handle: ContainerHandle, index: usize) -> Result<String> {
        self.registry.with(handle, |a| a.get_string(index))
    }

    pub fn set_element_string(&self, handle: ContainerHandle, index: usize, s: &str) -> Result<()> {
        self.registry.with_mut(handle, |a| a.set_string(index, s))
    }

    /// Value-copy `src` into `dest`. Kinds must match exactly.
    pub fn copy_container(&self, dest: ContainerHandle, src: ContainerHandle) -> Result<()> {
        let source = self.registry.with(src, |a| Ok(a.clone()))?;
        self.registry.with_mut(dest, |a| a.copy_from(&source))
    }

    /// Move `src`'s contents into `dest` and invalidate `src`.
    pub fn assign_container(&self, dest: ContainerHandle, src: ContainerHandle) -> Result<()> {
        self.registry.assign(dest, src)
    }

    // ── Capability negotiation ──────────────────────────────────────────

    /// Negotiate a read of `cap`. Returns a fresh container the caller
    /// owns (and must destroy).
    pub fn get_capability(
        &self,
        device: DeviceId,
        cap: CapId,
        op: OpClass,
        kind: Option<ContainerKind>,
        ty: Option<PrimitiveType>,
    ) -> Result<ContainerHandle> {
        self.check_open(device)?;
        self.negotiator
            .lock()
            .get(&self.registry, device, cap, op, kind, ty)
    }

    /// Negotiate a write of `cap` from the payload container. The payload
    /// is read, never consumed; the caller still owns it.
    pub fn set_capability(
        &self,
        device: DeviceId,
        cap: CapId,
        op: OpClass,
        kind: Option<ContainerKind>,
        ty: Option<PrimitiveType>,
        payload: ContainerHandle,
    ) -> Result<()> {
        self.check_open(device)?;
        self.negotiator
            .lock()
            .set(&self.registry, device, cap, op, kind, ty, payload)
    }

    /// Reset `cap` to its device default.
    pub fn reset_capability(
        &self,
        device: DeviceId,
        cap: CapId,
        ty: Option<PrimitiveType>,
    ) -> Result<()> {
        self.check_open(device)?;
        self.negotiator.lock().reset(device, cap, ty)
    }

    // ── Range helpers ───────────────────────────────────────────────────

    pub fn range_validate(&self, range: ContainerHandle) -> Result<()> {
        self.registry.with(range, range::validate)
    }

    pub fn range_count(&self, range: ContainerHandle) -> Result<u64> {
        self.registry.with(range, range::count)
    }

    /// Materialize a range into a new flat container of its grid values.
    pub fn range_expand(&self, range: ContainerHandle) -> Result<ContainerHandle> {
        let flat = self.registry.with(range, range::expand)?;
        Ok(self.registry.register(flat))
    }

    pub fn range_nearest(
        &self,
        range: ContainerHandle,
        input: f64,
        rounding: Rounding,
    ) -> Result<f64> {
        self.registry.with(range, |a| range::nearest(a, input, rounding))
    }

    pub fn range_position(&self, range: ContainerHandle, value: f64) -> Result<u64> {
        self.registry.with(range, |a| range::position_of(a, value))
    }

    // ── Frame helpers ───────────────────────────────────────────────────

    /// Create a one-element frame container holding the given rectangle.
    pub fn frame_create(&self, left: f64, top: f64, right: f64, bottom: f64) -> ContainerHandle {
        let frame = FrameValue::new(left, top, right, bottom);
        let mut array = ValueArray::new(ElementKind::Frame, 1);
        // A freshly sized one-element frame container cannot reject its
        // own kind at index 0.
        let _ = array.set(0, CapValue::Frame(frame));
        self.registry.register(array)
    }

    pub fn frame_get_all(&self, handle: ContainerHandle) -> Result<FrameValue> {
        self.registry.with(handle, |a| {
            a.get(0)?
                .as_frame()
                .copied()
                .ok_or_else(|| CapError::mismatch(ElementKind::Frame.name(), a.kind().name()))
        })
    }

    pub fn frame_set_all(&self, handle: ContainerHandle, frame: FrameValue) -> Result<()> {
        self.registry.with_mut(handle, |a| a.set(0, CapValue::Frame(frame)))
    }

    pub fn frame_get_component(
        &self,
        handle: ContainerHandle,
        which: FrameComponent,
    ) -> Result<f64> {
        Ok(self.frame_get_all(handle)?.component(which))
    }

    pub fn frame_set_component(
        &self,
        handle: ContainerHandle,
        which: FrameComponent,
        value: f64,
    ) -> Result<()> {
        let mut frame = self.frame_get_all(handle)?;
        frame.set_component(which, value);
        self.frame_set_all(handle, frame)
    }
}
