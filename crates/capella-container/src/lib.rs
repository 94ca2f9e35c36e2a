//! Tagged value containers, the process-wide container registry, and the
//! five-slot range algebra.
//!
//! This crate is the value-plumbing layer: it knows nothing about devices
//! or capability negotiation. [`ValueArray`] owns one homogeneous typed
//! sequence, [`ContainerRegistry`] hands out stable opaque handles to
//! arrays, and the [`range`] module interprets five-element numeric
//! containers as MIN/MAX/STEP/DEFAULT/CURRENT descriptors.

mod array;
mod registry;
pub mod range;

pub use array::ValueArray;
pub use range::{Rounding, RangeSlot, RANGE_SLOTS};
pub use registry::{ContainerHandle, ContainerRegistry};
