//! The dynamically-tagged value exchanged through container APIs.

use std::fmt;

use crate::encoding;
use crate::fix32::Fix32;
use crate::frame::FrameValue;
use crate::ElementKind;

/// One element of a tagged value container.
///
/// The variant set mirrors [`ElementKind`] one-to-one; `kind()` recovers the
/// tag. Containers accept only values of their own kind, with the single
/// exception of the two string variants, which convert into each other at
/// the container boundary.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CapValue {
    I32(i32),
    I64(i64),
    F64(f64),
    /// Latin-1 byte string.
    StrNarrow(Vec<u8>),
    /// UTF-16 code-unit string.
    StrWide(Vec<u16>),
    /// Opaque address-sized handle.
    Handle(u64),
    /// Raw token of a device identity.
    DeviceRef(u64),
    Frame(FrameValue),
    Fixed(Fix32),
}

impl CapValue {
    /// The element kind tag of this value.
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::I32(_) => ElementKind::I32,
            Self::I64(_) => ElementKind::I64,
            Self::F64(_) => ElementKind::F64,
            Self::StrNarrow(_) => ElementKind::StrNarrow,
            Self::StrWide(_) => ElementKind::StrWide,
            Self::Handle(_) => ElementKind::Handle,
            Self::DeviceRef(_) => ElementKind::DeviceRef,
            Self::Frame(_) => ElementKind::Frame,
            Self::Fixed(_) => ElementKind::Fixed,
        }
    }

    /// The zero/empty default element for a kind (new container slots,
    /// reset sentinels).
    pub fn default_of(kind: ElementKind) -> Self {
        match kind {
            ElementKind::I32 => Self::I32(0),
            ElementKind::I64 => Self::I64(0),
            ElementKind::F64 => Self::F64(0.0),
            ElementKind::StrNarrow => Self::StrNarrow(Vec::new()),
            ElementKind::StrWide => Self::StrWide(Vec::new()),
            ElementKind::Handle => Self::Handle(0),
            ElementKind::DeviceRef => Self::DeviceRef(0),
            ElementKind::Frame => Self::Frame(FrameValue::ZERO),
            ElementKind::Fixed => Self::Fixed(Fix32::ZERO),
        }
    }

    /// Build a string value of the given string kind from Rust text.
    ///
    /// Returns `None` if `kind` is not a string kind.
    pub fn string_of(kind: ElementKind, s: &str) -> Option<Self> {
        match kind {
            ElementKind::StrNarrow => Some(Self::StrNarrow(encoding::narrow_from_str(s))),
            ElementKind::StrWide => Some(Self::StrWide(encoding::wide_from_str(s))),
            _ => None,
        }
    }

    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_handle(&self) -> Option<u64> {
        match self {
            Self::Handle(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_frame(&self) -> Option<&FrameValue> {
        match self {
            Self::Frame(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_fixed(&self) -> Option<Fix32> {
        match self {
            Self::Fixed(v) => Some(*v),
            _ => None,
        }
    }

    /// Decode either string variant to Rust text. `None` for non-strings.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::StrNarrow(b) => Some(encoding::narrow_to_string(b)),
            Self::StrWide(u) => Some(encoding::wide_to_string(u)),
            _ => None,
        }
    }

    /// Widen the numeric variants to `f64` (used by range algebra and
    /// tolerance comparison). `None` for non-numeric kinds.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::I32(v) => Some(f64::from(*v)),
            #[allow(clippy::cast_precision_loss)]
            Self::I64(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert this value into the other string encoding if it is a string
    /// and `target` is a string kind; everything else passes through
    /// unchanged.
    #[must_use]
    pub fn convert_string(self, target: ElementKind) -> Self {
        match (self, target) {
            (Self::StrNarrow(b), ElementKind::StrWide) => {
                Self::StrWide(encoding::narrow_to_wide(&b))
            }
            (Self::StrWide(u), ElementKind::StrNarrow) => {
                Self::StrNarrow(encoding::wide_to_narrow(&u))
            }
            (v, _) => v,
        }
    }
}

impl fmt::Display for CapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::StrNarrow(b) => write!(f, "'{}'", encoding::narrow_to_string(b)),
            Self::StrWide(u) => write!(f, "L'{}'", encoding::wide_to_string(u)),
            Self::Handle(v) => write!(f, "handle({v:#x})"),
            Self::DeviceRef(v) => write!(f, "device({v})"),
            Self::Frame(v) => write!(f, "{v}"),
            Self::Fixed(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for CapValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for CapValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f64> for CapValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<FrameValue> for CapValue {
    fn from(v: FrameValue) -> Self {
        Self::Frame(v)
    }
}

impl From<Fix32> for CapValue {
    fn from(v: Fix32) -> Self {
        Self::Fixed(v)
    }
}
