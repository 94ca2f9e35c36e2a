//! Shared types for the capella capability-negotiation core.
//!
//! Everything that crosses a crate boundary lives here: the runtime element
//! tags carried by value containers, the wire-level container shapes and
//! operation classes used during negotiation, and the small value types
//! (fixed-point pair, frame rectangle) the protocol exchanges with devices.

pub mod encoding;
pub mod fix32;
pub mod frame;
pub mod value;

pub use fix32::Fix32;
pub use frame::{FrameComponent, FrameValue};
pub use value::CapValue;

use std::fmt;
use std::num::NonZeroU64;

/// Runtime element tag of a tagged value container.
///
/// A container holds one homogeneous sequence of this kind; the tag is fixed
/// at creation and never changes afterwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum ElementKind {
    /// 32-bit signed integer (also carries the smaller integer wire types).
    I32 = 0,
    /// 64-bit signed integer.
    I64 = 1,
    /// Double-precision real.
    F64 = 2,
    /// Narrow (single-byte, Latin-1) string.
    StrNarrow = 3,
    /// Wide (UTF-16 code unit) string.
    StrWide = 4,
    /// Opaque address-sized handle.
    Handle = 5,
    /// Back-reference to a device identity.
    DeviceRef = 6,
    /// 4-component frame rectangle.
    Frame = 7,
    /// Raw protocol fixed-point pair (whole/fraction).
    Fixed = 8,
}

impl ElementKind {
    /// All element kinds, in tag order.
    pub const ALL: [Self; 9] = [
        Self::I32,
        Self::I64,
        Self::F64,
        Self::StrNarrow,
        Self::StrWide,
        Self::Handle,
        Self::DeviceRef,
        Self::Frame,
        Self::Fixed,
    ];

    /// Stable numeric code for the C-style boundary.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`code`](Self::code). Returns `None` for unknown codes.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::I32),
            1 => Some(Self::I64),
            2 => Some(Self::F64),
            3 => Some(Self::StrNarrow),
            4 => Some(Self::StrWide),
            5 => Some(Self::Handle),
            6 => Some(Self::DeviceRef),
            7 => Some(Self::Frame),
            8 => Some(Self::Fixed),
            _ => None,
        }
    }

    /// Short lower-case name, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F64 => "f64",
            Self::StrNarrow => "str-narrow",
            Self::StrWide => "str-wide",
            Self::Handle => "handle",
            Self::DeviceRef => "device-ref",
            Self::Frame => "frame",
            Self::Fixed => "fixed",
        }
    }

    /// Whether this kind has a fixed-width numeric representation suitable
    /// for contiguous bulk transfer.
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F64)
    }

    /// Whether this kind stores string elements (either encoding).
    pub const fn is_string(self) -> bool {
        matches!(self, Self::StrNarrow | Self::StrWide)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device-declared primitive data type of a capability's values.
///
/// This is the wire-level type vocabulary; each variant maps onto one of the
/// nine [`ElementKind`] tags for in-memory marshalling. The narrower integer
/// types all ride in an `I32` container; `Fixed` values are converted to
/// `f64` at the container boundary and back to fixed-point pairs only when
/// the transport requires them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum PrimitiveType {
    Int8 = 0,
    Int16 = 1,
    Int32 = 2,
    UInt8 = 3,
    UInt16 = 4,
    UInt32 = 5,
    Bool = 6,
    Int64 = 7,
    UInt64 = 8,
    Fixed = 9,
    Frame = 10,
    StrNarrow = 11,
    StrWide = 12,
    Handle = 13,
}

impl PrimitiveType {
    /// The element kind a container of this primitive type uses.
    pub const fn element_kind(self) -> ElementKind {
        match self {
            Self::Int8 | Self::Int16 | Self::Int32 | Self::UInt8 | Self::UInt16 | Self::Bool => {
                ElementKind::I32
            }
            Self::UInt32 | Self::Int64 | Self::UInt64 => ElementKind::I64,
            Self::Fixed => ElementKind::F64,
            Self::Frame => ElementKind::Frame,
            Self::StrNarrow => ElementKind::StrNarrow,
            Self::StrWide => ElementKind::StrWide,
            Self::Handle => ElementKind::Handle,
        }
    }

    /// Stable numeric code for the C-style boundary.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`code`](Self::code).
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Int8),
            1 => Some(Self::Int16),
            2 => Some(Self::Int32),
            3 => Some(Self::UInt8),
            4 => Some(Self::UInt16),
            5 => Some(Self::UInt32),
            6 => Some(Self::Bool),
            7 => Some(Self::Int64),
            8 => Some(Self::UInt64),
            9 => Some(Self::Fixed),
            10 => Some(Self::Frame),
            11 => Some(Self::StrNarrow),
            12 => Some(Self::StrWide),
            13 => Some(Self::Handle),
            _ => None,
        }
    }

    /// The zero/default sentinel value of this type (used by reset commits).
    pub fn default_value(self) -> CapValue {
        CapValue::default_of(self.element_kind())
    }
}

/// Wire-level container shape used to carry a capability's value(s).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum ContainerKind {
    /// One value.
    Single = 0b0001,
    /// Fixed-size array of values.
    Array = 0b0010,
    /// Enumerated set with a current/default selection.
    Enumeration = 0b0100,
    /// Numeric range: {min, max, step, default, current}.
    Range = 0b1000,
}

impl ContainerKind {
    /// Low-bit-first candidate order used by the set-side fallback loop.
    pub const ALL: [Self; 4] = [Self::Single, Self::Array, Self::Enumeration, Self::Range];

    /// The mask bit this kind occupies.
    #[inline]
    pub const fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "single",
            Self::Array => "array",
            Self::Enumeration => "enumeration",
            Self::Range => "range",
        };
        f.write_str(name)
    }
}

/// Bitmask of container kinds a device declares for a capability/operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
pub struct ContainerMask(u8);

impl ContainerMask {
    /// Empty mask (device declared nothing).
    pub const EMPTY: Self = Self(0);

    /// Build a mask from raw bits; unknown bits are retained but ignored
    /// by iteration.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Build a mask from a list of kinds.
    pub fn from_kinds(kinds: &[ContainerKind]) -> Self {
        let mut bits = 0;
        for k in kinds {
            bits |= k.bit();
        }
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 & 0b1111 == 0
    }

    #[inline]
    pub const fn contains(self, kind: ContainerKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// If exactly one kind bit is set, return it.
    pub fn single_kind(self) -> Option<ContainerKind> {
        let mut found = None;
        for k in ContainerKind::ALL {
            if self.contains(k) {
                if found.is_some() {
                    return None;
                }
                found = Some(k);
            }
        }
        found
    }

    /// Iterate the set kinds low-bit-first (the candidate trial order).
    pub fn iter(self) -> impl Iterator<Item = ContainerKind> {
        ContainerKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

/// Negotiation operation class.
///
/// Each class may settle on a different container kind for the same
/// capability, so the per-device cache keeps one slot per class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum OpClass {
    Get = 0,
    GetCurrent = 1,
    GetDefault = 2,
    Set = 3,
    SetConstraint = 4,
    Reset = 5,
}

impl OpClass {
    /// Number of operation classes (cache slot count).
    pub const COUNT: usize = 6;

    /// All classes, in slot order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Get,
        Self::GetCurrent,
        Self::GetDefault,
        Self::Set,
        Self::SetConstraint,
        Self::Reset,
    ];

    /// Cache slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable numeric code for the C-style boundary.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`code`](Self::code).
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Get),
            1 => Some(Self::GetCurrent),
            2 => Some(Self::GetDefault),
            3 => Some(Self::Set),
            4 => Some(Self::SetConstraint),
            5 => Some(Self::Reset),
            _ => None,
        }
    }

    /// Whether this class reads values from the device.
    pub const fn is_get(self) -> bool {
        matches!(self, Self::Get | Self::GetCurrent | Self::GetDefault)
    }

    /// Whether this class writes values to the device.
    pub const fn is_set(self) -> bool {
        matches!(self, Self::Set | Self::SetConstraint | Self::Reset)
    }
}

impl fmt::Display for OpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::GetCurrent => "get-current",
            Self::GetDefault => "get-default",
            Self::Set => "set",
            Self::SetConstraint => "set-constraint",
            Self::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Identity of one open device session.
///
/// Ids are issued monotonically and never reused, so a capability cache
/// entry recorded against a closed session can never be confused with a
/// later session on the same physical device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct DeviceId(NonZeroU64);

impl DeviceId {
    /// Create a device id from a raw token. Returns `None` for 0.
    #[inline]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Raw token value (crosses the C boundary as `u64`).
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Identified device setting negotiated between client and device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct CapId(u16);

impl CapId {
    /// First id in the device-defined custom range.
    pub const CUSTOM_BASE: u16 = 0x8000;

    #[inline]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Capability ids at or above [`CUSTOM_BASE`](Self::CUSTOM_BASE) are
    /// device-defined; their negotiated container/type must persist for the
    /// whole session because re-discovery is not idempotent on all devices.
    #[inline]
    pub const fn is_custom(self) -> bool {
        self.0 >= Self::CUSTOM_BASE
    }
}

impl fmt::Display for CapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cap {:#06x}", self.0)
    }
}
