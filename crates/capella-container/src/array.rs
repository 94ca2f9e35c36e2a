//! The tagged value container.
//!
//! One container holds one homogeneous sequence of a single
//! [`ElementKind`]. The tag is chosen at construction and never changes;
//! the backing storage is an enum of owned typed vectors, so fixed-width
//! numeric kinds expose contiguous slices for bulk transport fills without
//! unchecked downcasts.

use capella_error::{CapError, Result};
use capella_types::{CapValue, ElementKind, Fix32, FrameValue};

/// Kind-selected backing storage. Selected at construction, never changed.
#[derive(Debug, Clone, PartialEq)]
enum ArrayStorage {
    I32(Vec<i32>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    StrNarrow(Vec<Vec<u8>>),
    StrWide(Vec<Vec<u16>>),
    Handle(Vec<u64>),
    DeviceRef(Vec<u64>),
    Frame(Vec<FrameValue>),
    Fixed(Vec<Fix32>),
}

/// Dispatch one `(storage, value)` pair to a per-kind body. The caller must
/// have coerced `value` to the container's kind first.
macro_rules! with_typed {
    ($storage:expr, $value:expr, |$vec:ident, $x:ident| $body:expr) => {
        match ($storage, $value) {
            (ArrayStorage::I32($vec), CapValue::I32($x)) => $body,
            (ArrayStorage::I64($vec), CapValue::I64($x)) => $body,
            (ArrayStorage::F64($vec), CapValue::F64($x)) => $body,
            (ArrayStorage::StrNarrow($vec), CapValue::StrNarrow($x)) => $body,
            (ArrayStorage::StrWide($vec), CapValue::StrWide($x)) => $body,
            (ArrayStorage::Handle($vec), CapValue::Handle($x)) => $body,
            (ArrayStorage::DeviceRef($vec), CapValue::DeviceRef($x)) => $body,
            (ArrayStorage::Frame($vec), CapValue::Frame($x)) => $body,
            (ArrayStorage::Fixed($vec), CapValue::Fixed($x)) => $body,
            _ => unreachable!("value kind was coerced to the container kind"),
        }
    };
}

/// A type-erased, runtime-tagged dynamic array with exclusive ownership of
/// its backing storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueArray {
    storage: ArrayStorage,
}

impl ValueArray {
    /// Allocate a container of `kind` with `initial_size` default-valued
    /// elements.
    pub fn new(kind: ElementKind, initial_size: usize) -> Self {
        let storage = match kind {
            ElementKind::I32 => ArrayStorage::I32(vec![0; initial_size]),
            ElementKind::I64 => ArrayStorage::I64(vec![0; initial_size]),
            ElementKind::F64 => ArrayStorage::F64(vec![0.0; initial_size]),
            ElementKind::StrNarrow => ArrayStorage::StrNarrow(vec![Vec::new(); initial_size]),
            ElementKind::StrWide => ArrayStorage::StrWide(vec![Vec::new(); initial_size]),
            ElementKind::Handle => ArrayStorage::Handle(vec![0; initial_size]),
            ElementKind::DeviceRef => ArrayStorage::DeviceRef(vec![0; initial_size]),
            ElementKind::Frame => ArrayStorage::Frame(vec![FrameValue::ZERO; initial_size]),
            ElementKind::Fixed => ArrayStorage::Fixed(vec![Fix32::ZERO; initial_size]),
        };
        Self { storage }
    }

    /// Build a container from an iterator of values, all of `kind`.
    pub fn from_values<I>(kind: ElementKind, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = CapValue>,
    {
        let mut array = Self::new(kind, 0);
        for v in values {
            array.push(v, 1)?;
        }
        Ok(array)
    }

    /// The element kind tag. Fixed for the lifetime of the container.
    pub const fn kind(&self) -> ElementKind {
        match &self.storage {
            ArrayStorage::I32(_) => ElementKind::I32,
            ArrayStorage::I64(_) => ElementKind::I64,
            ArrayStorage::F64(_) => ElementKind::F64,
            ArrayStorage::StrNarrow(_) => ElementKind::StrNarrow,
            ArrayStorage::StrWide(_) => ElementKind::StrWide,
            ArrayStorage::Handle(_) => ElementKind::Handle,
            ArrayStorage::DeviceRef(_) => ElementKind::DeviceRef,
            ArrayStorage::Frame(_) => ElementKind::Frame,
            ArrayStorage::Fixed(_) => ElementKind::Fixed,
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            ArrayStorage::I32(v) => v.len(),
            ArrayStorage::I64(v) => v.len(),
            ArrayStorage::F64(v) => v.len(),
            ArrayStorage::StrNarrow(v) => v.len(),
            ArrayStorage::StrWide(v) => v.len(),
            ArrayStorage::Handle(v) => v.len(),
            ArrayStorage::DeviceRef(v) => v.len(),
            ArrayStorage::Frame(v) => v.len(),
            ArrayStorage::Fixed(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow with default-valued elements or truncate.
    pub fn resize(&mut self, new_len: usize) {
        match &mut self.storage {
            ArrayStorage::I32(v) => v.resize(new_len, 0),
            ArrayStorage::I64(v) => v.resize(new_len, 0),
            ArrayStorage::F64(v) => v.resize(new_len, 0.0),
            ArrayStorage::StrNarrow(v) => v.resize(new_len, Vec::new()),
            ArrayStorage::StrWide(v) => v.resize(new_len, Vec::new()),
            ArrayStorage::Handle(v) => v.resize(new_len, 0),
            ArrayStorage::DeviceRef(v) => v.resize(new_len, 0),
            ArrayStorage::Frame(v) => v.resize(new_len, FrameValue::ZERO),
            ArrayStorage::Fixed(v) => v.resize(new_len, Fix32::ZERO),
        }
    }

    pub fn clear(&mut self) {
        self.resize(0);
    }

    /// Coerce a value to this container's kind. Strings convert between the
    /// two encodings; any other kind difference is a mismatch. No mutation
    /// happens on failure.
    fn coerce(&self, value: CapValue) -> Result<CapValue> {
        let value = value.convert_string(self.kind());
        if value.kind() == self.kind() {
            Ok(value)
        } else {
            Err(CapError::mismatch(self.kind().name(), value.kind().name()))
        }
    }

    /// Append `repeat` copies of `value`.
    pub fn push(&mut self, value: CapValue, repeat: usize) -> Result<()> {
        let value = self.coerce(value)?;
        with_typed!(&mut self.storage, value, |vec, x| {
            vec.extend(std::iter::repeat_n(x, repeat));
        });
        Ok(())
    }

    /// Insert `repeat` copies of `value` at `at`. `at` may equal the
    /// current length (append position); beyond that is out of bounds.
    pub fn insert(&mut self, at: usize, value: CapValue, repeat: usize) -> Result<()> {
        let len = self.len();
        if at > len {
            return Err(CapError::IndexBounds { index: at, len });
        }
        let value = self.coerce(value)?;
        with_typed!(&mut self.storage, value, |vec, x| {
            drop(vec.splice(at..at, std::iter::repeat_n(x, repeat)));
        });
        Ok(())
    }

    /// Remove `count` elements starting at `at`.
    pub fn remove(&mut self, at: usize, count: usize) -> Result<()> {
        let len = self.len();
        if at >= len || count > len - at {
            return Err(CapError::IndexBounds { index: at, len });
        }
        match &mut self.storage {
            ArrayStorage::I32(v) => drop(v.drain(at..at + count)),
            ArrayStorage::I64(v) => drop(v.drain(at..at + count)),
            ArrayStorage::F64(v) => drop(v.drain(at..at + count)),
            ArrayStorage::StrNarrow(v) => drop(v.drain(at..at + count)),
            ArrayStorage::StrWide(v) => drop(v.drain(at..at + count)),
            ArrayStorage::Handle(v) => drop(v.drain(at..at + count)),
            ArrayStorage::DeviceRef(v) => drop(v.drain(at..at + count)),
            ArrayStorage::Frame(v) => drop(v.drain(at..at + count)),
            ArrayStorage::Fixed(v) => drop(v.drain(at..at + count)),
        }
        Ok(())
    }

    /// Read one element. Bounds-checked.
    pub fn get(&self, index: usize) -> Result<CapValue> {
        let len = self.len();
        if index >= len {
            return Err(CapError::IndexBounds { index, len });
        }
        Ok(match &self.storage {
            ArrayStorage::I32(v) => CapValue::I32(v[index]),
            ArrayStorage::I64(v) => CapValue::I64(v[index]),
            ArrayStorage::F64(v) => CapValue::F64(v[index]),
            ArrayStorage::StrNarrow(v) => CapValue::StrNarrow(v[index].clone()),
            ArrayStorage::StrWide(v) => CapValue::StrWide(v[index].clone()),
            ArrayStorage::Handle(v) => CapValue::Handle(v[index]),
            ArrayStorage::DeviceRef(v) => CapValue::DeviceRef(v[index]),
            ArrayStorage::Frame(v) => CapValue::Frame(v[index]),
            ArrayStorage::Fixed(v) => CapValue::Fixed(v[index]),
        })
    }

    /// Overwrite one element. Bounds-checked; string values convert to the
    /// stored encoding.
    pub fn set(&mut self, index: usize, value: CapValue) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(CapError::IndexBounds { index, len });
        }
        let value = self.coerce(value)?;
        with_typed!(&mut self.storage, value, |vec, x| vec[index] = x);
        Ok(())
    }

    /// Read an element of a string container as Rust text, regardless of
    /// the stored encoding.
    pub fn get_string(&self, index: usize) -> Result<String> {
        if !self.kind().is_string() {
            return Err(CapError::StringTypeMismatch);
        }
        self.get(index).map(|v| {
            v.as_string()
                .unwrap_or_default()
        })
    }

    /// Write an element of a string container from Rust text, converting to
    /// the stored encoding.
    pub fn set_string(&mut self, index: usize, s: &str) -> Result<()> {
        let Some(value) = CapValue::string_of(self.kind(), s) else {
            return Err(CapError::StringTypeMismatch);
        };
        self.set(index, value)
    }

    /// Find the first element equal to `value`.
    ///
    /// Real-valued kinds (`f64`, fixed-point) compare with the given
    /// absolute tolerance; every other kind compares exactly. The probe
    /// value's strings convert to the stored encoding first.
    pub fn find(&self, value: &CapValue, tolerance: f64) -> Option<usize> {
        let probe = self.coerce(value.clone()).ok()?;
        match (&self.storage, &probe) {
            (ArrayStorage::F64(v), CapValue::F64(x)) => {
                v.iter().position(|a| (a - x).abs() <= tolerance)
            }
            (ArrayStorage::Fixed(v), CapValue::Fixed(x)) => {
                let target = x.to_f64();
                v.iter().position(|a| (a.to_f64() - target).abs() <= tolerance)
            }
            (ArrayStorage::I32(v), CapValue::I32(x)) => v.iter().position(|a| a == x),
            (ArrayStorage::I64(v), CapValue::I64(x)) => v.iter().position(|a| a == x),
            (ArrayStorage::StrNarrow(v), CapValue::StrNarrow(x)) => v.iter().position(|a| a == x),
            (ArrayStorage::StrWide(v), CapValue::StrWide(x)) => v.iter().position(|a| a == x),
            (ArrayStorage::Handle(v), CapValue::Handle(x))
            | (ArrayStorage::DeviceRef(v), CapValue::DeviceRef(x)) => {
                v.iter().position(|a| a == x)
            }
            (ArrayStorage::Frame(v), CapValue::Frame(x)) => v.iter().position(|a| a == x),
            _ => None,
        }
    }

    /// Replace this container's contents with a value-copy of `src`.
    /// Requires identical element kinds; the destination is untouched on
    /// mismatch.
    pub fn copy_from(&mut self, src: &Self) -> Result<()> {
        if self.kind() != src.kind() {
            return Err(CapError::mismatch(self.kind().name(), src.kind().name()));
        }
        self.storage = src.storage.clone();
        Ok(())
    }

    /// Rebuild this container with the other string encoding. Identity for
    /// the already-matching kind; mismatch for non-string containers.
    pub fn convert_strings(&self, target: ElementKind) -> Result<Self> {
        if self.kind() == target {
            return Ok(self.clone());
        }
        if !(self.kind().is_string() && target.is_string()) {
            return Err(CapError::mismatch(target.name(), self.kind().name()));
        }
        let mut out = Self::new(target, 0);
        for i in 0..self.len() {
            out.push(self.get(i)?, 1)?;
        }
        Ok(out)
    }

    // ── Contiguous views for bulk transport fills ───────────────────────
    //
    // Only the fixed-width numeric kinds have a contiguous backing buffer;
    // everything else is a kind mismatch.

    pub fn as_i32_slice(&self) -> Result<&[i32]> {
        match &self.storage {
            ArrayStorage::I32(v) => Ok(v),
            _ => Err(CapError::mismatch(
                ElementKind::I32.name(),
                self.kind().name(),
            )),
        }
    }

    pub fn as_i64_slice(&self) -> Result<&[i64]> {
        match &self.storage {
            ArrayStorage::I64(v) => Ok(v),
            _ => Err(CapError::mismatch(
                ElementKind::I64.name(),
                self.kind().name(),
            )),
        }
    }

    pub fn as_f64_slice(&self) -> Result<&[f64]> {
        match &self.storage {
            ArrayStorage::F64(v) => Ok(v),
            _ => Err(CapError::mismatch(
                ElementKind::F64.name(),
                self.kind().name(),
            )),
        }
    }

    /// Bulk-write `data` into an `i32` container starting at `offset`.
    pub fn bulk_fill_i32(&mut self, offset: usize, data: &[i32]) -> Result<()> {
        let len = self.len();
        match &mut self.storage {
            ArrayStorage::I32(v) => {
                if offset > len || data.len() > len - offset {
                    return Err(CapError::IndexBounds { index: offset, len });
                }
                v[offset..offset + data.len()].copy_from_slice(data);
                Ok(())
            }
            _ => Err(CapError::mismatch(
                ElementKind::I32.name(),
                self.kind().name(),
            )),
        }
    }

    /// Bulk-write `data` into an `f64` container starting at `offset`.
    pub fn bulk_fill_f64(&mut self, offset: usize, data: &[f64]) -> Result<()> {
        let len = self.len();
        match &mut self.storage {
            ArrayStorage::F64(v) => {
                if offset > len || data.len() > len - offset {
                    return Err(CapError::IndexBounds { index: offset, len });
                }
                v[offset..offset + data.len()].copy_from_slice(data);
                Ok(())
            }
            _ => Err(CapError::mismatch(
                ElementKind::F64.name(),
                self.kind().name(),
            )),
        }
    }

    /// Iterate the elements as boundary values.
    pub fn iter_values(&self) -> impl Iterator<Item = CapValue> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i).ok())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_fills_with_defaults() {
        let a = ValueArray::new(ElementKind::I32, 3);
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(2).unwrap(), CapValue::I32(0));

        let a = ValueArray::new(ElementKind::Frame, 1);
        assert_eq!(a.get(0).unwrap(), CapValue::Frame(FrameValue::ZERO));
    }

    #[test]
    fn kind_never_changes() {
        let mut a = ValueArray::new(ElementKind::F64, 0);
        assert_eq!(a.kind(), ElementKind::F64);
        a.push(CapValue::F64(1.0), 4).unwrap();
        a.resize(100);
        a.remove(0, 50).unwrap();
        a.clear();
        assert_eq!(a.kind(), ElementKind::F64);
    }

    #[test]
    fn push_rejects_wrong_kind_without_mutation() {
        let mut a = ValueArray::new(ElementKind::I32, 1);
        let err = a.push(CapValue::F64(1.0), 1).unwrap_err();
        assert!(matches!(err, CapError::ArrayTypeMismatch { .. }));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn get_set_round_trip_every_kind() {
        let samples = [
            CapValue::I32(-5),
            CapValue::I64(1 << 40),
            CapValue::F64(2.75),
            CapValue::string_of(ElementKind::StrNarrow, "gray").unwrap(),
            CapValue::string_of(ElementKind::StrWide, "gray").unwrap(),
            CapValue::Handle(0xdead),
            CapValue::DeviceRef(3),
            CapValue::Frame(FrameValue::new(0.0, 0.0, 8.5, 11.0)),
            CapValue::Fixed(Fix32::from_f64(1.25)),
        ];
        for sample in samples {
            let mut a = ValueArray::new(sample.kind(), 1);
            a.set(0, sample.clone()).unwrap();
            assert_eq!(a.get(0).unwrap(), sample, "kind {}", sample.kind());
        }
    }

    #[test]
    fn bounds_checks() {
        let mut a = ValueArray::new(ElementKind::I32, 3);
        assert!(matches!(
            a.get(3),
            Err(CapError::IndexBounds { index: 3, len: 3 })
        ));
        assert!(a.set(3, CapValue::I32(0)).is_err());
        // Insert at len is the append position; one past is out of bounds.
        assert!(a.insert(3, CapValue::I32(9), 1).is_ok());
        assert!(a.insert(5, CapValue::I32(9), 1).is_err());
        // Remove from an empty container is out of bounds, not a no-op.
        let mut empty = ValueArray::new(ElementKind::I32, 0);
        assert!(empty.remove(0, 1).is_err());
    }

    #[test]
    fn insert_and_remove_with_repeat() {
        let mut a = ValueArray::from_values(
            ElementKind::I32,
            [1, 2, 3].map(CapValue::I32),
        )
        .unwrap();
        a.insert(1, CapValue::I32(7), 2).unwrap();
        let got: Vec<_> = a.iter_values().collect();
        assert_eq!(
            got,
            [1, 7, 7, 2, 3].map(CapValue::I32).to_vec()
        );
        a.remove(1, 3).unwrap();
        let got: Vec<_> = a.iter_values().collect();
        assert_eq!(got, [1, 3].map(CapValue::I32).to_vec());
    }

    #[test]
    fn huge_offsets_report_bounds_instead_of_overflowing() {
        let mut a = ValueArray::from_values(
            ElementKind::I32,
            [1, 2, 3].map(CapValue::I32),
        )
        .unwrap();
        assert!(matches!(
            a.remove(1, usize::MAX),
            Err(CapError::IndexBounds { index: 1, len: 3 })
        ));
        assert!(matches!(
            a.bulk_fill_i32(usize::MAX, &[7]),
            Err(CapError::IndexBounds { .. })
        ));
        assert!(matches!(
            a.bulk_fill_i32(2, &[7, 8]),
            Err(CapError::IndexBounds { .. })
        ));
        let mut b = ValueArray::new(ElementKind::F64, 2);
        assert!(matches!(
            b.bulk_fill_f64(usize::MAX, &[0.5]),
            Err(CapError::IndexBounds { .. })
        ));
        // Nothing moved.
        let got: Vec<_> = a.iter_values().collect();
        assert_eq!(got, [1, 2, 3].map(CapValue::I32).to_vec());
    }

    #[test]
    fn string_boundary_is_encoding_agnostic() {
        // Wide value into a narrow container and back out as text.
        let mut a = ValueArray::new(ElementKind::StrNarrow, 1);
        let wide = CapValue::string_of(ElementKind::StrWide, "Käse").unwrap();
        a.set(0, wide).unwrap();
        assert_eq!(a.get_string(0).unwrap(), "Käse");
        assert_eq!(a.get(0).unwrap().kind(), ElementKind::StrNarrow);

        // Narrow value into a wide container.
        let mut a = ValueArray::new(ElementKind::StrWide, 1);
        let narrow = CapValue::string_of(ElementKind::StrNarrow, "Käse").unwrap();
        a.set(0, narrow).unwrap();
        assert_eq!(a.get_string(0).unwrap(), "Käse");

        // Text setter on a non-string container is an explicit encoding
        // mismatch.
        let mut a = ValueArray::new(ElementKind::I32, 1);
        assert!(matches!(
            a.set_string(0, "x"),
            Err(CapError::StringTypeMismatch)
        ));
    }

    #[test]
    fn find_exact_and_tolerant() {
        let a = ValueArray::from_values(
            ElementKind::I32,
            [10, 20, 30].map(CapValue::I32),
        )
        .unwrap();
        assert_eq!(a.find(&CapValue::I32(20), 0.0), Some(1));
        assert_eq!(a.find(&CapValue::I32(25), 0.0), None);

        let a = ValueArray::from_values(
            ElementKind::F64,
            [100.0, 150.0, 200.0].map(CapValue::F64),
        )
        .unwrap();
        assert_eq!(a.find(&CapValue::F64(150.01), 0.0), None);
        assert_eq!(a.find(&CapValue::F64(150.01), 0.1), Some(1));
    }

    #[test]
    fn find_converts_string_probe() {
        let a = ValueArray::from_values(
            ElementKind::StrNarrow,
            ["bw", "gray", "color"]
                .map(|s| CapValue::string_of(ElementKind::StrNarrow, s).unwrap()),
        )
        .unwrap();
        let wide_probe = CapValue::string_of(ElementKind::StrWide, "gray").unwrap();
        assert_eq!(a.find(&wide_probe, 0.0), Some(1));
    }

    #[test]
    fn copy_requires_identical_kind_and_leaves_dest_on_error() {
        let src = ValueArray::from_values(ElementKind::F64, [1.5].map(CapValue::F64)).unwrap();
        let mut dest = ValueArray::from_values(
            ElementKind::I32,
            [1, 2].map(CapValue::I32),
        )
        .unwrap();
        let err = dest.copy_from(&src).unwrap_err();
        assert!(matches!(err, CapError::ArrayTypeMismatch { .. }));
        assert_eq!(dest.len(), 2);
        assert_eq!(dest.get(0).unwrap(), CapValue::I32(1));

        let mut dest = ValueArray::new(ElementKind::F64, 0);
        dest.copy_from(&src).unwrap();
        assert_eq!(dest.get(0).unwrap(), CapValue::F64(1.5));
    }

    #[test]
    fn resize_grows_with_defaults_and_truncates() {
        let mut a = ValueArray::from_values(ElementKind::I32, [5].map(CapValue::I32)).unwrap();
        a.resize(3);
        assert_eq!(a.get(2).unwrap(), CapValue::I32(0));
        a.resize(1);
        assert_eq!(a.len(), 1);
        assert_eq!(a.get(0).unwrap(), CapValue::I32(5));
    }

    #[test]
    fn bulk_fill_and_slices() {
        let mut a = ValueArray::new(ElementKind::I32, 5);
        a.bulk_fill_i32(1, &[7, 8, 9]).unwrap();
        assert_eq!(a.as_i32_slice().unwrap(), &[0, 7, 8, 9, 0]);
        assert!(a.bulk_fill_i32(4, &[1, 2]).is_err());
        assert!(a.as_f64_slice().is_err());

        let mut b = ValueArray::new(ElementKind::F64, 2);
        b.bulk_fill_f64(0, &[1.0, 2.0]).unwrap();
        assert_eq!(b.as_f64_slice().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn convert_strings_between_encodings() {
        let a = ValueArray::from_values(
            ElementKind::StrWide,
            ["a4", "letter"].map(|s| CapValue::string_of(ElementKind::StrWide, s).unwrap()),
        )
        .unwrap();
        let narrow = a.convert_strings(ElementKind::StrNarrow).unwrap();
        assert_eq!(narrow.kind(), ElementKind::StrNarrow);
        assert_eq!(narrow.get_string(1).unwrap(), "letter");

        assert!(
            ValueArray::new(ElementKind::I32, 0)
                .convert_strings(ElementKind::StrNarrow)
                .is_err()
        );
    }

    proptest! {
        #[test]
        fn prop_i32_round_trip(values in proptest::collection::vec(any::<i32>(), 0..64)) {
            let array = ValueArray::from_values(
                ElementKind::I32,
                values.iter().copied().map(CapValue::I32),
            )
            .unwrap();
            prop_assert_eq!(array.len(), values.len());
            for (i, v) in values.iter().enumerate() {
                prop_assert_eq!(array.get(i).unwrap(), CapValue::I32(*v));
            }
        }

        #[test]
        fn prop_insert_then_remove_is_identity(
            base in proptest::collection::vec(any::<i32>(), 1..32),
            at_frac in 0.0f64..1.0,
            repeat in 1usize..8,
        ) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            let at = ((base.len() as f64) * at_frac) as usize;
            let original = ValueArray::from_values(
                ElementKind::I32,
                base.iter().copied().map(CapValue::I32),
            )
            .unwrap();
            let mut array = original.clone();
            array.insert(at, CapValue::I32(-1), repeat).unwrap();
            array.remove(at, repeat).unwrap();
            prop_assert_eq!(array, original);
        }
    }
}
