//! Range algebra over five-slot containers.
//!
//! A range is an ordinary numeric container with exactly five elements:
//! MIN, MAX, STEP, DEFAULT, CURRENT, in that slot order. The functions
//! here validate the layout, enumerate the implied value set, and snap
//! arbitrary inputs onto the step grid.

use capella_error::{CapError, Result};
use capella_types::CapValue;

use crate::array::ValueArray;

/// A valid range container has exactly this many elements.
pub const RANGE_SLOTS: usize = 5;

/// Slot order within a range container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum RangeSlot {
    Min = 0,
    Max = 1,
    Step = 2,
    Default = 3,
    Current = 4,
}

impl RangeSlot {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// How [`nearest`] resolves an input that falls between two grid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Round down to the grid value at or below the input.
    Down,
    /// Round up to the grid value at or above the input.
    Up,
    /// Round to the closer grid value; exact midpoints round up.
    #[default]
    Nearest,
}

/// Grid values that are this close (relative to the step) count as exact
/// hits, so fp noise from the division does not push `Up` one step too far.
const GRID_EPSILON: f64 = 1e-9;

fn slot(range: &ValueArray, slot: RangeSlot) -> Result<f64> {
    let value = range.get(slot.index())?;
    value
        .numeric()
        .ok_or_else(|| CapError::mismatch("numeric", value.kind().name()))
}

/// Check the five-slot layout and the MIN/MAX/STEP invariant.
///
/// DEFAULT and CURRENT are deliberately not checked against the grid: real
/// devices routinely report a current value that predates the range.
pub fn validate(range: &ValueArray) -> Result<()> {
    if !range.kind().is_numeric() {
        return Err(CapError::mismatch("numeric", range.kind().name()));
    }
    if range.len() != RANGE_SLOTS {
        return Err(CapError::invalid_range(format!(
            "expected {RANGE_SLOTS} slots, got {}",
            range.len()
        )));
    }
    let min = slot(range, RangeSlot::Min)?;
    let max = slot(range, RangeSlot::Max)?;
    let step = slot(range, RangeSlot::Step)?;
    if min > max {
        return Err(CapError::invalid_range(format!("min {min} > max {max}")));
    }
    if step < 0.0 {
        return Err(CapError::invalid_range(format!("negative step {step}")));
    }
    if step == 0.0 && min != max {
        return Err(CapError::invalid_range(format!(
            "zero step with min {min} != max {max}"
        )));
    }
    Ok(())
}

/// Number of values the range denotes. A degenerate range (step zero,
/// min == max) denotes exactly one value.
pub fn count(range: &ValueArray) -> Result<u64> {
    validate(range)?;
    let min = slot(range, RangeSlot::Min)?;
    let max = slot(range, RangeSlot::Max)?;
    let step = slot(range, RangeSlot::Step)?;
    if step == 0.0 {
        return Ok(1);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(((max - min) / step).floor() as u64 + 1)
}

/// Materialize the range into a flat container of the same kind holding
/// every grid value from MIN through the last value not exceeding MAX.
pub fn expand(range: &ValueArray) -> Result<ValueArray> {
    let n = count(range)?;
    let min = slot(range, RangeSlot::Min)?;
    let step = slot(range, RangeSlot::Step)?;
    let kind = range.kind();
    let mut out = ValueArray::new(kind, 0);
    for i in 0..n {
        #[allow(clippy::cast_precision_loss)]
        let v = min + (i as f64) * step;
        out.push(numeric_as(kind, v), 1)?;
    }
    Ok(out)
}

/// Clamp `input` into [MIN, MAX] and snap it onto the step grid.
pub fn nearest(range: &ValueArray, input: f64, rounding: Rounding) -> Result<f64> {
    validate(range)?;
    let min = slot(range, RangeSlot::Min)?;
    let max = slot(range, RangeSlot::Max)?;
    let step = slot(range, RangeSlot::Step)?;

    let clamped = input.clamp(min, max);
    if step == 0.0 {
        return Ok(min);
    }
    // When MAX is off the grid the largest reachable value is the last
    // on-grid one, so clamp against that rather than raw MAX.
    let last = min + ((max - min) / step).floor() * step;

    let offset = clamped - min;
    let steps_down = (offset / step).floor();
    let base = min + steps_down * step;
    let rem = offset - steps_down * step;
    let on_grid = rem.abs() <= step * GRID_EPSILON;

    let snapped = match rounding {
        Rounding::Down => base,
        Rounding::Up => {
            if on_grid {
                base
            } else {
                base + step
            }
        }
        Rounding::Nearest => {
            if !on_grid && rem >= step / 2.0 {
                base + step
            } else {
                base
            }
        }
    };
    Ok(snapped.clamp(min, last))
}

/// Zero-based position of `value` on the step grid, the inverse of the
/// value-at-position relation used by [`expand`]. Undefined for a
/// degenerate range.
pub fn position_of(range: &ValueArray, value: f64) -> Result<u64> {
    validate(range)?;
    let min = slot(range, RangeSlot::Min)?;
    let step = slot(range, RangeSlot::Step)?;
    if step == 0.0 {
        return Err(CapError::DivByZero);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(((value - min) / step).round().max(0.0) as u64)
}

/// Narrow an `f64` grid value back to the range container's element kind.
fn numeric_as(kind: capella_types::ElementKind, v: f64) -> CapValue {
    use capella_types::ElementKind;
    match kind {
        #[allow(clippy::cast_possible_truncation)]
        ElementKind::I32 => CapValue::I32(v.round() as i32),
        #[allow(clippy::cast_possible_truncation)]
        ElementKind::I64 => CapValue::I64(v.round() as i64),
        _ => CapValue::F64(v),
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use capella_types::ElementKind;
    use proptest::prelude::*;

    fn range_i32(min: i32, max: i32, step: i32, default: i32, current: i32) -> ValueArray {
        ValueArray::from_values(
            ElementKind::I32,
            [min, max, step, default, current].map(CapValue::I32),
        )
        .unwrap()
    }

    fn range_f64(min: f64, max: f64, step: f64) -> ValueArray {
        ValueArray::from_values(
            ElementKind::F64,
            [min, max, step, min, min].map(CapValue::F64),
        )
        .unwrap()
    }

    #[test]
    fn validate_accepts_well_formed_ranges() {
        validate(&range_i32(0, 10, 2, 0, 0)).unwrap();
        // Degenerate single-value range.
        validate(&range_i32(5, 5, 0, 5, 5)).unwrap();
        validate(&range_f64(75.0, 600.0, 0.5)).unwrap();
    }

    #[test]
    fn validate_rejects_bad_layouts() {
        let short = ValueArray::from_values(
            ElementKind::I32,
            [0, 10, 2].map(CapValue::I32),
        )
        .unwrap();
        assert!(matches!(validate(&short), Err(CapError::InvalidRange { .. })));

        assert!(validate(&range_i32(10, 0, 2, 0, 0)).is_err());
        assert!(validate(&range_i32(0, 10, -1, 0, 0)).is_err());
        assert!(validate(&range_i32(0, 10, 0, 0, 0)).is_err());

        let strings = ValueArray::new(ElementKind::StrNarrow, RANGE_SLOTS);
        assert!(matches!(
            validate(&strings),
            Err(CapError::ArrayTypeMismatch { .. })
        ));
    }

    #[test]
    fn count_and_expand() {
        let r = range_i32(0, 10, 2, 0, 0);
        assert_eq!(count(&r).unwrap(), 6);
        let flat = expand(&r).unwrap();
        assert_eq!(flat.kind(), ElementKind::I32);
        let got: Vec<_> = flat.iter_values().collect();
        assert_eq!(got, [0, 2, 4, 6, 8, 10].map(CapValue::I32).to_vec());

        // MAX off the grid: expansion stops at the last on-grid value.
        let r = range_i32(0, 9, 2, 0, 0);
        assert_eq!(count(&r).unwrap(), 5);
        assert_eq!(
            expand(&r).unwrap().get(4).unwrap(),
            CapValue::I32(8)
        );

        let degenerate = range_i32(5, 5, 0, 5, 5);
        assert_eq!(count(&degenerate).unwrap(), 1);
        assert_eq!(expand(&degenerate).unwrap().len(), 1);
    }

    #[test]
    fn nearest_rounding_modes() {
        let r = range_i32(0, 10, 2, 0, 0);
        // 7 sits exactly between 6 and 8.
        assert_eq!(nearest(&r, 7.0, Rounding::Nearest).unwrap(), 8.0);
        assert_eq!(nearest(&r, 7.0, Rounding::Down).unwrap(), 6.0);
        assert_eq!(nearest(&r, 7.0, Rounding::Up).unwrap(), 8.0);
        // 6.5 is below the midpoint.
        assert_eq!(nearest(&r, 6.5, Rounding::Nearest).unwrap(), 6.0);
        // On-grid inputs are fixed points of every mode.
        for mode in [Rounding::Down, Rounding::Up, Rounding::Nearest] {
            assert_eq!(nearest(&r, 6.0, mode).unwrap(), 6.0);
        }
    }

    #[test]
    fn nearest_clamps_out_of_bounds() {
        let r = range_i32(0, 10, 2, 0, 0);
        assert_eq!(nearest(&r, -5.0, Rounding::Nearest).unwrap(), 0.0);
        assert_eq!(nearest(&r, 999.0, Rounding::Down).unwrap(), 10.0);

        // MAX off the grid: the snap target is the last on-grid value.
        let r = range_i32(0, 9, 2, 0, 0);
        assert_eq!(nearest(&r, 999.0, Rounding::Up).unwrap(), 8.0);
        assert_eq!(nearest(&r, 8.5, Rounding::Up).unwrap(), 8.0);
    }

    #[test]
    fn nearest_degenerate_returns_the_single_value() {
        let r = range_i32(5, 5, 0, 5, 5);
        assert_eq!(nearest(&r, 100.0, Rounding::Up).unwrap(), 5.0);
    }

    #[test]
    fn nearest_fractional_steps() {
        let r = range_f64(75.0, 600.0, 0.5);
        assert_eq!(nearest(&r, 300.3, Rounding::Nearest).unwrap(), 300.5);
        assert_eq!(nearest(&r, 300.2, Rounding::Nearest).unwrap(), 300.0);
        assert_eq!(nearest(&r, 300.1, Rounding::Up).unwrap(), 300.5);
    }

    #[test]
    fn position_round_trip() {
        let r = range_i32(0, 10, 2, 0, 0);
        assert_eq!(position_of(&r, 8.0).unwrap(), 4);
        assert_eq!(position_of(&r, 0.0).unwrap(), 0);

        let degenerate = range_i32(5, 5, 0, 5, 5);
        assert!(matches!(
            position_of(&degenerate, 5.0),
            Err(CapError::DivByZero)
        ));
    }

    proptest! {
        #[test]
        fn prop_expand_len_matches_count(
            min in -1000i32..1000,
            width in 0i32..500,
            step in 1i32..50,
        ) {
            let r = range_i32(min, min + width, step, min, min);
            let n = count(&r).unwrap();
            prop_assert_eq!(expand(&r).unwrap().len() as u64, n);
        }

        #[test]
        fn prop_nearest_lands_in_bounds_on_grid(
            min in -1000i32..1000,
            width in 1i32..500,
            step in 1i32..50,
            input in -2000.0f64..2000.0,
            mode_code in 0u8..3,
        ) {
            let mode = match mode_code {
                0 => Rounding::Down,
                1 => Rounding::Up,
                _ => Rounding::Nearest,
            };
            let max = min + width;
            let r = range_i32(min, max, step, min, min);
            let snapped = nearest(&r, input, mode).unwrap();
            prop_assert!(snapped >= f64::from(min) && snapped <= f64::from(max));
            let steps = (snapped - f64::from(min)) / f64::from(step);
            prop_assert!((steps - steps.round()).abs() < 1e-6);
        }

        #[test]
        fn prop_position_inverts_expansion(
            min in -1000i32..1000,
            width in 0i32..500,
            step in 1i32..50,
        ) {
            let r = range_i32(min, min + width, step, min, min);
            let flat = expand(&r).unwrap();
            for (i, value) in flat.iter_values().enumerate() {
                let v = value.numeric().unwrap();
                prop_assert_eq!(position_of(&r, v).unwrap(), i as u64);
            }
        }
    }
}
