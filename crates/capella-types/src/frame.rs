//! Frame rectangle value.
//!
//! A frame is four named real components. No geometric ordering is imposed
//! (left may exceed right); validity is purely "this is a frame", not
//! sanity of the rectangle.

use std::fmt;

use crate::fix32::Fix32;

/// 4-component rectangle value carried by frame-kind containers.
#[derive(
    Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize,
)]
pub struct FrameValue {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl FrameValue {
    pub const ZERO: Self = Self {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Read one named component.
    pub const fn component(&self, which: FrameComponent) -> f64 {
        match which {
            FrameComponent::Left => self.left,
            FrameComponent::Top => self.top,
            FrameComponent::Right => self.right,
            FrameComponent::Bottom => self.bottom,
        }
    }

    /// Write one named component.
    pub const fn set_component(&mut self, which: FrameComponent, value: f64) {
        match which {
            FrameComponent::Left => self.left = value,
            FrameComponent::Top => self.top = value,
            FrameComponent::Right => self.right = value,
            FrameComponent::Bottom => self.bottom = value,
        }
    }

    /// Convert to the device-native fixed-point quadruple. Lossy to the
    /// device's 1/65536 resolution; rounds, never truncates.
    pub fn to_fixed(self) -> [Fix32; 4] {
        [
            Fix32::from_f64(self.left),
            Fix32::from_f64(self.top),
            Fix32::from_f64(self.right),
            Fix32::from_f64(self.bottom),
        ]
    }

    /// Rebuild from a device-native fixed-point quadruple.
    pub fn from_fixed(quad: [Fix32; 4]) -> Self {
        Self {
            left: quad[0].to_f64(),
            top: quad[1].to_f64(),
            right: quad[2].to_f64(),
            bottom: quad[3].to_f64(),
        }
    }
}

impl fmt::Display for FrameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[l={} t={} r={} b={}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// The four named frame slots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum FrameComponent {
    Left = 0,
    Top = 1,
    Right = 2,
    Bottom = 3,
}

impl FrameComponent {
    pub const ALL: [Self; 4] = [Self::Left, Self::Top, Self::Right, Self::Bottom];

    /// Slot index → component. Returns `None` outside 0..=3.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Left),
            1 => Some(Self::Top),
            2 => Some(Self::Right),
            3 => Some(Self::Bottom),
            _ => None,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn component_access() {
        let mut frame = FrameValue::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(frame.component(FrameComponent::Left), 1.0);
        assert_eq!(frame.component(FrameComponent::Bottom), 4.0);

        frame.set_component(FrameComponent::Right, 8.5);
        assert_eq!(frame.right, 8.5);
    }

    #[test]
    fn slot_index_mapping() {
        for which in FrameComponent::ALL {
            assert_eq!(FrameComponent::from_index(which.index()), Some(which));
        }
        assert_eq!(FrameComponent::from_index(4), None);
    }

    #[test]
    fn inverted_frames_are_representable() {
        // left > right is allowed; geometric sanity is not this type's job.
        let frame = FrameValue::new(10.0, 0.0, 2.0, 5.0);
        assert_eq!(frame.left, 10.0);
        assert_eq!(frame.right, 2.0);
    }

    #[test]
    fn fixed_point_round_trip_at_device_resolution() {
        let frame = FrameValue::new(0.0, 0.25, 8.5, 11.0);
        // All components are exact multiples of 1/65536.
        assert_eq!(FrameValue::from_fixed(frame.to_fixed()), frame);
    }

    #[test]
    fn fixed_point_conversion_rounds() {
        let step = 1.0 / 65_536.0;
        let frame = FrameValue::new(1.0 + 0.6 * step, 0.0, 0.0, 0.0);
        let quad = frame.to_fixed();
        // 0.6 of a step rounds up to a full step.
        assert_eq!(quad[0], Fix32 { whole: 1, frac: 1 });
    }
}
