//! The transport collaborator boundary.
//!
//! Everything device-specific lives behind [`Transport`]. The engine only
//! asks what a capability looks like and tells the transport to move one
//! container's worth of values; blocking, timeouts, and wire formats all
//! belong to the implementation behind this trait.

use capella_container::ValueArray;
use capella_types::{CapId, ContainerKind, ContainerMask, DeviceId, OpClass, PrimitiveType};
use thiserror::Error;

/// A refused or failed transport call.
///
/// During the set-side candidate loop this is a "try the next kind" signal;
/// everywhere else the engine surfaces it as a terminal transport failure.
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct TransportFail {
    pub detail: String,
}

impl TransportFail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Device-side collaborator for capability negotiation.
///
/// Implementations are consumed as `Box<dyn Transport + Send>`; the engine
/// serializes calls, so no internal synchronization is required.
pub trait Transport: Send {
    /// The device-declared primitive type of `cap`, if the device knows it.
    fn declared_type(&self, device: DeviceId, cap: CapId) -> Option<PrimitiveType>;

    /// Which container kinds the device accepts for `cap` under `op`.
    fn container_mask(&self, device: DeviceId, cap: CapId, op: OpClass) -> ContainerMask;

    /// Sizing hint for a fetched container (element count).
    fn element_count(&self, device: DeviceId, cap: CapId, op: OpClass) -> usize;

    /// Resolve an ambiguous mask to the single kind a fetch should use.
    ///
    /// This is the whole of the get-side discovery path: when more than one
    /// mask bit is set the engine defers here instead of running a trial
    /// loop, and caches whatever this settles on.
    fn preferred_kind(
        &self,
        device: DeviceId,
        cap: CapId,
        op: OpClass,
        mask: ContainerMask,
    ) -> ContainerKind {
        let _ = (device, cap, op);
        mask.iter().next().unwrap_or(ContainerKind::Single)
    }

    /// Fill `out` with the device's value(s) for `cap`. `out` arrives
    /// allocated to the negotiated kind's size and element kind.
    fn fetch(
        &mut self,
        device: DeviceId,
        cap: CapId,
        op: OpClass,
        kind: ContainerKind,
        ty: PrimitiveType,
        out: &mut ValueArray,
    ) -> Result<(), TransportFail>;

    /// Push `data` to the device for `cap` shaped as `kind`.
    fn commit(
        &mut self,
        device: DeviceId,
        cap: CapId,
        op: OpClass,
        kind: ContainerKind,
        ty: PrimitiveType,
        data: &ValueArray,
    ) -> Result<(), TransportFail>;

    /// Whether the device supports `cap` at all.
    fn is_supported(&self, device: DeviceId, cap: CapId) -> bool;
}
