//! Capability negotiation over an abstract device transport.
//!
//! The [`Negotiator`] runs the trial-and-fallback protocol: resolve a
//! capability's primitive type, pick a container kind (cached, declared,
//! or probed), move one tagged container across the [`Transport`], and
//! remember what succeeded in the per-device [`CapabilityCache`]. Scratch
//! containers are managed by [`ScratchContainer`] so no exit path can leak
//! one into the registry.

mod cache;
mod engine;
mod scratch;
mod transport;

pub use cache::CapabilityCache;
pub use engine::Negotiator;
pub use scratch::ScratchContainer;
pub use transport::{Transport, TransportFail};
