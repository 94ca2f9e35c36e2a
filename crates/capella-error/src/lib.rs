use thiserror::Error;

/// Primary error type for capella operations.
///
/// Kinds, not call sites: container-level operations return these directly
/// and callers branch on the kind; the negotiation engine wraps them into a
/// single success/failure per public call. Every variant except
/// `OutOfMemory` is a normal control-flow outcome.
#[derive(Error, Debug)]
pub enum CapError {
    // === Container errors ===
    /// Handle does not name a live container (stale, moved-from, or never
    /// created).
    #[error("invalid or stale container handle")]
    BadContainer,

    /// Element kind mismatch between two containers, or between a value and
    /// a container's kind.
    #[error("element kind mismatch: expected {expected}, got {actual}")]
    ArrayTypeMismatch { expected: String, actual: String },

    /// Index out of range for the container's current length.
    #[error("index {index} out of bounds for length {len}")]
    IndexBounds { index: usize, len: usize },

    /// Narrow/wide mismatch where an explicit encoding check is required.
    #[error("string encoding mismatch")]
    StringTypeMismatch,

    /// No match for a container find.
    #[error("value not found in container")]
    NotFound,

    // === Negotiation errors ===
    /// Neither the caller nor the device could name the capability's
    /// primitive type.
    #[error("capability {cap:#06x} has no resolvable data type")]
    UnknownCapDataType { cap: u16 },

    /// The device does not support this capability at all.
    #[error("capability {cap:#06x} is not supported by the device")]
    UnsupportedCapability { cap: u16 },

    /// Every candidate container kind was refused by the device.
    #[error("device refused all {tried} candidate container kinds for capability {cap:#06x}")]
    SetRejected { cap: u16, tried: usize },

    /// The transport reported a terminal failure.
    #[error("transport failure: {detail}")]
    TransportFailed { detail: String },

    /// Unknown or already-closed device session.
    #[error("unknown or closed device")]
    BadDevice,

    // === Value errors ===
    /// Range container violates the MIN/MAX/STEP invariant or slot count.
    #[error("invalid range: {detail}")]
    InvalidRange { detail: String },

    /// A parameter outside its valid domain (bad frame slot, wrong op
    /// class, unknown kind code).
    #[error("invalid parameter: {detail}")]
    InvalidParam { detail: String },

    /// Range position is undefined when the step is zero.
    #[error("range step is zero: position is undefined")]
    DivByZero,

    // === Fatal ===
    /// Allocation failure. Not recoverable at this layer.
    #[error("out of memory")]
    OutOfMemory,
}

/// Numeric condition codes for the C-style boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ConditionCode {
    /// Successful result.
    Ok = 0,
    /// Generic failure (transport-level).
    Generic = 1,
    /// Allocation failure.
    LowMemory = 2,
    /// Invalid or stale container handle.
    BadContainer = 3,
    /// Element kind or encoding mismatch.
    Mismatch = 4,
    /// Index out of bounds.
    Bounds = 5,
    /// Invalid range or parameter value.
    BadValue = 6,
    /// Capability data type could not be resolved.
    UnknownType = 7,
    /// Capability not supported by the device.
    Unsupported = 8,
    /// Unknown or closed device.
    BadDevice = 9,
    /// All set candidates refused.
    Rejected = 10,
    /// Find miss.
    NotFound = 11,
    /// API misuse (null pointer, bad code) at the C boundary.
    Misuse = 12,
}

impl CapError {
    /// Map this error to a stable condition code for the C boundary.
    pub const fn condition_code(&self) -> ConditionCode {
        match self {
            Self::BadContainer => ConditionCode::BadContainer,
            Self::ArrayTypeMismatch { .. } | Self::StringTypeMismatch => ConditionCode::Mismatch,
            Self::IndexBounds { .. } => ConditionCode::Bounds,
            Self::NotFound => ConditionCode::NotFound,
            Self::UnknownCapDataType { .. } => ConditionCode::UnknownType,
            Self::UnsupportedCapability { .. } => ConditionCode::Unsupported,
            Self::SetRejected { .. } => ConditionCode::Rejected,
            Self::TransportFailed { .. } => ConditionCode::Generic,
            Self::BadDevice => ConditionCode::BadDevice,
            Self::InvalidRange { .. } | Self::InvalidParam { .. } | Self::DivByZero => {
                ConditionCode::BadValue
            }
            Self::OutOfMemory => ConditionCode::LowMemory,
        }
    }

    /// Whether the caller can likely recover without a code change
    /// (retrying, picking a different value, skipping the capability).
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedCapability { .. }
                | Self::SetRejected { .. }
                | Self::NotFound
                | Self::InvalidRange { .. }
                | Self::InvalidParam { .. }
                | Self::TransportFailed { .. }
        )
    }

    /// Create a kind-mismatch error from kind names.
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ArrayTypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid-range error.
    pub fn invalid_range(detail: impl Into<String>) -> Self {
        Self::InvalidRange {
            detail: detail.into(),
        }
    }

    /// Create an invalid-parameter error.
    pub fn invalid_param(detail: impl Into<String>) -> Self {
        Self::InvalidParam {
            detail: detail.into(),
        }
    }

    /// Create a transport-failure error.
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::TransportFailed {
            detail: detail.into(),
        }
    }
}

/// Result type alias using `CapError`.
pub type Result<T> = std::result::Result<T, CapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CapError::mismatch("i32", "f64");
        assert_eq!(err.to_string(), "element kind mismatch: expected i32, got f64");

        let err = CapError::IndexBounds { index: 9, len: 5 };
        assert_eq!(err.to_string(), "index 9 out of bounds for length 5");

        let err = CapError::UnknownCapDataType { cap: 0x1103 };
        assert_eq!(
            err.to_string(),
            "capability 0x1103 has no resolvable data type"
        );
    }

    #[test]
    fn condition_code_mapping() {
        assert_eq!(
            CapError::BadContainer.condition_code(),
            ConditionCode::BadContainer
        );
        assert_eq!(
            CapError::StringTypeMismatch.condition_code(),
            ConditionCode::Mismatch
        );
        assert_eq!(CapError::DivByZero.condition_code(), ConditionCode::BadValue);
        assert_eq!(
            CapError::SetRejected { cap: 1, tried: 2 }.condition_code(),
            ConditionCode::Rejected
        );
        assert_eq!(
            CapError::OutOfMemory.condition_code(),
            ConditionCode::LowMemory
        );
    }

    #[test]
    fn condition_code_values_are_stable() {
        assert_eq!(ConditionCode::Ok as i32, 0);
        assert_eq!(ConditionCode::Generic as i32, 1);
        assert_eq!(ConditionCode::BadContainer as i32, 3);
        assert_eq!(ConditionCode::Rejected as i32, 10);
        assert_eq!(ConditionCode::Misuse as i32, 12);
    }

    #[test]
    fn user_recoverable() {
        assert!(CapError::SetRejected { cap: 1, tried: 1 }.is_user_recoverable());
        assert!(CapError::NotFound.is_user_recoverable());
        assert!(!CapError::BadContainer.is_user_recoverable());
        assert!(!CapError::OutOfMemory.is_user_recoverable());
    }

    #[test]
    fn convenience_constructors() {
        let err = CapError::invalid_range("step is negative");
        assert!(matches!(err, CapError::InvalidRange { detail } if detail == "step is negative"));

        let err = CapError::invalid_param("frame slot 4");
        assert!(matches!(err, CapError::InvalidParam { detail } if detail == "frame slot 4"));

        let err = CapError::transport("bus reset");
        assert!(matches!(err, CapError::TransportFailed { detail } if detail == "bus reset"));
    }
}
