//! The capability negotiation engine.
//!
//! One [`Negotiator`] wraps a transport and its capability cache and runs
//! the get/set state machine: resolve the primitive type, pick (or probe
//! for) a container kind, move one container across the transport, and
//! record what worked. Callers serialize access; the facade holds the
//! negotiator behind a mutex so one capability's {lookup, trial, record}
//! sequence is never interleaved.

use capella_container::{range, ContainerHandle, ContainerRegistry, ValueArray, RANGE_SLOTS};
use capella_error::{CapError, Result};
use capella_types::{CapId, ContainerKind, DeviceId, OpClass, PrimitiveType};
use tracing::{debug, warn};

use crate::cache::CapabilityCache;
use crate::scratch::ScratchContainer;
use crate::transport::Transport;

/// The negotiation engine for one transport.
pub struct Negotiator {
    transport: Box<dyn Transport + Send>,
    cache: CapabilityCache,
}

impl std::fmt::Debug for Negotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiator")
            .field("cache_entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl Negotiator {
    pub fn new(transport: Box<dyn Transport + Send>) -> Self {
        Self {
            transport,
            cache: CapabilityCache::new(),
        }
    }

    /// Read-only view of the cache (assertions in tests, introspection).
    pub fn cache(&self) -> &CapabilityCache {
        &self.cache
    }

    /// Drop all cached facts about one device session.
    pub fn forget_device(&mut self, device: DeviceId) {
        self.cache.forget_device(device);
    }

    /// Resolve the capability's primitive type.
    ///
    /// Explicit override wins; custom-id capabilities then consult the
    /// cache, because re-asking the device for a custom id is not
    /// idempotent everywhere; last resort is the device's declared type.
    fn resolve_type(
        &self,
        device: DeviceId,
        cap: CapId,
        explicit: Option<PrimitiveType>,
    ) -> Result<PrimitiveType> {
        let cached = if cap.is_custom() {
            self.cache.lookup_type(device, cap)
        } else {
            None
        };
        if let Some(ty) = explicit.or(cached) {
            return Ok(ty);
        }
        self.transport
            .declared_type(device, cap)
            .ok_or(CapError::UnknownCapDataType { cap: cap.get() })
    }

    /// Fetch a capability's value(s) into a fresh container and return its
    /// handle. The caller owns the container on success; on failure
    /// nothing is left behind in the registry.
    pub fn get(
        &mut self,
        registry: &ContainerRegistry,
        device: DeviceId,
        cap: CapId,
        op: OpClass,
        explicit_kind: Option<ContainerKind>,
        explicit_type: Option<PrimitiveType>,
    ) -> Result<ContainerHandle> {
        if !op.is_get() {
            return Err(CapError::invalid_param(format!("{op} is not a get class")));
        }
        if !self.transport.is_supported(device, cap) {
            return Err(CapError::UnsupportedCapability { cap: cap.get() });
        }
        let ty = self.resolve_type(device, cap, explicit_type)?;

        // Kind resolution: explicit, else cached (terminal, no cross-kind
        // retry), else discovery. Discovery never iterates: an ambiguous
        // mask is resolved by the transport's own preference in one shot.
        let kind = if let Some(kind) = explicit_kind {
            kind
        } else if let Some(kind) = self.cache.lookup(device, cap, op) {
            kind
        } else {
            let mask = self.transport.container_mask(device, cap, op);
            if mask.is_empty() {
                warn!(%device, %cap, %op, "device declared no container kinds");
            }
            mask.single_kind()
                .unwrap_or_else(|| self.transport.preferred_kind(device, cap, op, mask))
        };

        let size = match kind {
            ContainerKind::Range => RANGE_SLOTS,
            ContainerKind::Single => 1,
            _ => self.transport.element_count(device, cap, op),
        };
        debug!(%device, %cap, %op, %kind, size, "fetching capability");

        let scratch = ScratchContainer::new(registry, ty.element_kind(), size);
        let fetched = registry.with_mut(scratch.handle(), |out| {
            self.transport
                .fetch(device, cap, op, kind, ty, out)
                .map_err(|fail| CapError::transport(fail.detail))
        });
        match fetched {
            Ok(()) => {
                self.cache.record(device, cap, op, kind);
                self.cache.record_type(device, cap, ty);
                Ok(scratch.release())
            }
            Err(err) => {
                warn!(%device, %cap, %op, %kind, %err, "fetch failed");
                Err(err)
            }
        }
    }

    /// Push the payload container's value(s) to the device, trying each
    /// candidate container kind until one succeeds.
    ///
    /// The payload is read once up front; a failed set commits nothing and
    /// leaves the cache untouched.
    pub fn set(
        &mut self,
        registry: &ContainerRegistry,
        device: DeviceId,
        cap: CapId,
        op: OpClass,
        explicit_kind: Option<ContainerKind>,
        explicit_type: Option<PrimitiveType>,
        payload: ContainerHandle,
    ) -> Result<()> {
        if !matches!(op, OpClass::Set | OpClass::SetConstraint) {
            return Err(CapError::invalid_param(format!("{op} is not a set class")));
        }
        if !self.transport.is_supported(device, cap) {
            return Err(CapError::UnsupportedCapability { cap: cap.get() });
        }
        let ty = self.resolve_type(device, cap, explicit_type)?;
        let data = registry.with(payload, |a| Ok(a.clone()))?;

        // The caller-visible string API is encoding-agnostic; the
        // transport sees the capability's one declared encoding.
        let data = if data.kind().is_string() && ty.element_kind().is_string() {
            data.convert_strings(ty.element_kind())?
        } else {
            data
        };

        if explicit_kind == Some(ContainerKind::Range) {
            range::validate(&data)?;
        }
        let candidates = self.set_candidates(device, cap, op, explicit_kind);

        let mut tried = 0;
        for kind in candidates {
            if kind == ContainerKind::Range && range::validate(&data).is_err() {
                // A malformed payload can never commit as a range; skip
                // the candidate rather than bothering the device.
                debug!(%device, %cap, %op, "payload is not a valid range, skipping candidate");
                tried += 1;
                continue;
            }
            tried += 1;
            match self.transport.commit(device, cap, op, kind, ty, &data) {
                Ok(()) => {
                    debug!(%device, %cap, %op, %kind, "set committed");
                    self.cache.record(device, cap, op, kind);
                    self.cache.record_type(device, cap, ty);
                    return Ok(());
                }
                Err(fail) => {
                    debug!(%device, %cap, %op, %kind, %fail, "candidate refused");
                }
            }
        }
        warn!(%device, %cap, %op, tried, "all set candidates refused");
        Err(CapError::SetRejected {
            cap: cap.get(),
            tried,
        })
    }

    /// Reset the capability to its device default by committing a one
    /// element zero/default sentinel. Same candidate loop and cache
    /// bookkeeping as a set; no value conversion is involved.
    pub fn reset(
        &mut self,
        device: DeviceId,
        cap: CapId,
        explicit_type: Option<PrimitiveType>,
    ) -> Result<()> {
        let op = OpClass::Reset;
        if !self.transport.is_supported(device, cap) {
            return Err(CapError::UnsupportedCapability { cap: cap.get() });
        }
        let ty = self.resolve_type(device, cap, explicit_type)?;
        let sentinel = ValueArray::new(ty.element_kind(), 1);
        let candidates = self.set_candidates(device, cap, op, None);

        let mut tried = 0;
        for kind in candidates {
            if kind == ContainerKind::Range {
                // A one-element sentinel cannot ride in a range container.
                tried += 1;
                continue;
            }
            tried += 1;
            match self.transport.commit(device, cap, op, kind, ty, &sentinel) {
                Ok(()) => {
                    debug!(%device, %cap, %kind, "reset committed");
                    self.cache.record(device, cap, op, kind);
                    self.cache.record_type(device, cap, ty);
                    return Ok(());
                }
                Err(fail) => {
                    debug!(%device, %cap, %kind, %fail, "reset candidate refused");
                }
            }
        }
        Err(CapError::SetRejected {
            cap: cap.get(),
            tried,
        })
    }

    /// Candidate kinds for a set-side call: an explicit kind stands alone;
    /// otherwise the declared mask low-bit-first, with a cached known-good
    /// kind hoisted to the front so a settled capability never re-probes.
    fn set_candidates(
        &self,
        device: DeviceId,
        cap: CapId,
        op: OpClass,
        explicit: Option<ContainerKind>,
    ) -> Vec<ContainerKind> {
        if let Some(kind) = explicit {
            return vec![kind];
        }
        let mask = self.transport.container_mask(device, cap, op);
        let mut candidates: Vec<ContainerKind> = mask.iter().collect();
        let cached_pos = self
            .cache
            .lookup(device, cap, op)
            .and_then(|cached| candidates.iter().position(|k| *k == cached));
        if let Some(pos) = cached_pos.filter(|p| *p > 0) {
            let kind = candidates.remove(pos);
            candidates.insert(0, kind);
        }
        candidates
    }
}
