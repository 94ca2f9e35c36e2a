//! The per-device capability cache.
//!
//! One entry per (device, capability) remembers which container kind last
//! succeeded for each operation class, plus the learned primitive type.
//! Entries appear lazily on first successful negotiation and vanish when
//! the owning device session closes; device ids are never reused, so an
//! entry can never outlive its session into a reopened device.

use std::collections::HashMap;

use capella_types::{CapId, ContainerKind, DeviceId, OpClass, PrimitiveType};

/// What one capability has taught us so far.
#[derive(Debug, Clone, Copy, Default)]
struct CacheEntry {
    kinds: [Option<ContainerKind>; OpClass::COUNT],
    primitive: Option<PrimitiveType>,
}

/// Negotiation results keyed by (device, capability).
#[derive(Debug, Default)]
pub struct CapabilityCache {
    map: HashMap<(DeviceId, CapId), CacheEntry>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The container kind that last succeeded for this operation class.
    pub fn lookup(&self, device: DeviceId, cap: CapId, op: OpClass) -> Option<ContainerKind> {
        self.map
            .get(&(device, cap))
            .and_then(|e| e.kinds[op.index()])
    }

    /// The learned primitive type of this capability.
    pub fn lookup_type(&self, device: DeviceId, cap: CapId) -> Option<PrimitiveType> {
        self.map.get(&(device, cap)).and_then(|e| e.primitive)
    }

    /// Record a successful kind for one operation class. Idempotent
    /// overwrite.
    pub fn record(&mut self, device: DeviceId, cap: CapId, op: OpClass, kind: ContainerKind) {
        self.map.entry((device, cap)).or_default().kinds[op.index()] = Some(kind);
    }

    /// Record the capability's primitive type. Idempotent overwrite.
    pub fn record_type(&mut self, device: DeviceId, cap: CapId, ty: PrimitiveType) {
        self.map.entry((device, cap)).or_default().primitive = Some(ty);
    }

    /// Drop everything learned about one device session.
    pub fn forget_device(&mut self, device: DeviceId) {
        self.map.retain(|(d, _), _| *d != device);
    }

    /// Number of capabilities with at least one recorded fact.
    pub fn entry_count(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(raw: u64) -> DeviceId {
        DeviceId::new(raw).unwrap()
    }

    #[test]
    fn record_and_lookup_per_op_class() {
        let mut cache = CapabilityCache::new();
        let (d, c) = (dev(1), CapId::new(0x1101));
        assert_eq!(cache.lookup(d, c, OpClass::Get), None);

        cache.record(d, c, OpClass::Get, ContainerKind::Enumeration);
        cache.record(d, c, OpClass::Set, ContainerKind::Single);
        assert_eq!(cache.lookup(d, c, OpClass::Get), Some(ContainerKind::Enumeration));
        assert_eq!(cache.lookup(d, c, OpClass::Set), Some(ContainerKind::Single));
        // Other classes of the same capability stay unknown.
        assert_eq!(cache.lookup(d, c, OpClass::Reset), None);

        // Overwrite is idempotent.
        cache.record(d, c, OpClass::Get, ContainerKind::Range);
        assert_eq!(cache.lookup(d, c, OpClass::Get), Some(ContainerKind::Range));
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn type_is_per_capability_not_per_class() {
        let mut cache = CapabilityCache::new();
        let (d, c) = (dev(1), CapId::new(0x8001));
        cache.record_type(d, c, PrimitiveType::Fixed);
        assert_eq!(cache.lookup_type(d, c), Some(PrimitiveType::Fixed));
        assert_eq!(cache.lookup_type(d, CapId::new(0x8002)), None);
    }

    #[test]
    fn forget_device_is_isolated() {
        let mut cache = CapabilityCache::new();
        let c = CapId::new(0x1103);
        cache.record(dev(1), c, OpClass::Get, ContainerKind::Single);
        cache.record(dev(2), c, OpClass::Get, ContainerKind::Range);

        cache.forget_device(dev(1));
        assert_eq!(cache.lookup(dev(1), c, OpClass::Get), None);
        assert_eq!(cache.lookup(dev(2), c, OpClass::Get), Some(ContainerKind::Range));
    }
}
