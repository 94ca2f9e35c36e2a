//! Protocol fixed-point pair.
//!
//! Devices exchange real values as a signed 16-bit whole part plus an
//! unsigned 16-bit fraction in 1/65536 steps. Conversion from `f64` rounds
//! to the nearest representable value; it never truncates.

use std::fmt;

/// A 16.16 fixed-point value as carried on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct Fix32 {
    /// Signed whole part.
    pub whole: i16,
    /// Fraction in units of 1/65536.
    pub frac: u16,
}

impl Fix32 {
    pub const ZERO: Self = Self { whole: 0, frac: 0 };

    /// Smallest and largest representable values, as `f64`.
    pub const MIN_F64: f64 = i16::MIN as f64;
    pub const MAX_F64: f64 = i16::MAX as f64 + 65_535.0 / 65_536.0;

    /// Convert a real value, rounding to the nearest 1/65536 and saturating
    /// at the representable bounds.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(value: f64) -> Self {
        let clamped = value.clamp(Self::MIN_F64, Self::MAX_F64);
        let scaled = (clamped * 65_536.0).round() as i32;
        Self {
            whole: (scaled >> 16) as i16,
            frac: (scaled & 0xFFFF) as u16,
        }
    }

    /// Exact real value of this fixed-point pair.
    pub fn to_f64(self) -> f64 {
        f64::from(self.whole) + f64::from(self.frac) / 65_536.0
    }
}

impl From<f64> for Fix32 {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<Fix32> for f64 {
    fn from(value: Fix32) -> Self {
        value.to_f64()
    }
}

impl fmt::Display for Fix32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn zero_round_trips() {
        assert_eq!(Fix32::from_f64(0.0), Fix32::ZERO);
        assert_eq!(Fix32::ZERO.to_f64(), 0.0);
    }

    #[test]
    fn positive_value_rounds_not_truncates() {
        // 0.9999999 is closer to 1.0 than to 65535/65536; truncation would
        // keep whole == 0.
        let v = Fix32::from_f64(0.999_999_9);
        assert_eq!(v, Fix32 { whole: 1, frac: 0 });
    }

    #[test]
    fn negative_values_use_twos_complement_split() {
        let v = Fix32::from_f64(-1.5);
        assert_eq!(v.to_f64(), -1.5);
        assert_eq!(v.whole, -2);
        assert_eq!(v.frac, 0x8000);
    }

    #[test]
    fn resolution_is_one_65536th() {
        let step = 1.0 / 65_536.0;
        let v = Fix32::from_f64(300.0 + step);
        assert_eq!(v.whole, 300);
        assert_eq!(v.frac, 1);
        assert_eq!(v.to_f64(), 300.0 + step);
    }

    #[test]
    fn saturates_at_bounds() {
        assert_eq!(Fix32::from_f64(1.0e9).whole, i16::MAX);
        assert_eq!(Fix32::from_f64(-1.0e9), Fix32 { whole: i16::MIN, frac: 0 });
    }

    #[test]
    fn lossy_round_trip_stays_within_half_step() {
        let input = 123.456_789;
        let back = Fix32::from_f64(input).to_f64();
        assert!((back - input).abs() <= 0.5 / 65_536.0);
    }
}
