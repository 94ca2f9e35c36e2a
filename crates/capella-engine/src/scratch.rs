//! Scoped ownership of engine scratch containers.
//!
//! Every container the engine creates while negotiating must be destroyed
//! on every exit path. That contract is enforced structurally: the engine
//! only ever creates scratch through this guard, which destroys the
//! container on drop unless the handle is explicitly released to the
//! caller.

use capella_container::{ContainerHandle, ContainerRegistry};
use capella_types::ElementKind;

/// RAII guard over one registry container.
#[derive(Debug)]
pub struct ScratchContainer<'r> {
    registry: &'r ContainerRegistry,
    handle: ContainerHandle,
    released: bool,
}

impl<'r> ScratchContainer<'r> {
    /// Create a fresh container of `kind` with `size` default elements,
    /// owned by this guard.
    pub fn new(registry: &'r ContainerRegistry, kind: ElementKind, size: usize) -> Self {
        Self {
            registry,
            handle: registry.create(kind, size),
            released: false,
        }
    }

    /// The guarded handle. Valid for the lifetime of the guard.
    pub fn handle(&self) -> ContainerHandle {
        self.handle
    }

    /// Hand the container to the caller; the guard no longer destroys it.
    pub fn release(mut self) -> ContainerHandle {
        self.released = true;
        self.handle
    }
}

impl Drop for ScratchContainer<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.registry.destroy(self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroys_on_drop() {
        let registry = ContainerRegistry::new();
        let handle;
        {
            let scratch = ScratchContainer::new(&registry, ElementKind::I32, 3);
            handle = scratch.handle();
            assert!(registry.is_valid(handle));
        }
        assert!(!registry.is_valid(handle));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn release_transfers_ownership() {
        let registry = ContainerRegistry::new();
        let handle = {
            let scratch = ScratchContainer::new(&registry, ElementKind::F64, 5);
            scratch.release()
        };
        assert!(registry.is_valid(handle));
        registry.destroy(handle);
    }

    #[test]
    fn destroys_on_unwind() {
        let registry = ContainerRegistry::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scratch = ScratchContainer::new(&registry, ElementKind::I32, 1);
            panic!("mid-negotiation failure");
        }));
        assert!(result.is_err());
        assert_eq!(registry.live_count(), 0);
    }
}
