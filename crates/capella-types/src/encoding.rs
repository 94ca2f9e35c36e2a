//! Narrow/wide string conversion at the container boundary.
//!
//! Containers store strings in one of two device encodings: narrow strings
//! are Latin-1 byte sequences, wide strings are UTF-16 code units. The
//! public API speaks `&str`/`String`; conversion happens exactly once, at
//! the container boundary, so callers never see which encoding a device
//! negotiated.

/// Encode a Rust string as Latin-1 bytes.
///
/// Scalars outside U+00FF cannot be represented in a single-byte device
/// encoding and are replaced with `?`. Latin-1 text round-trips exactly.
pub fn narrow_from_str(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| {
            let cp = u32::from(c);
            if cp <= 0xFF { cp as u8 } else { b'?' }
        })
        .collect()
}

/// Decode Latin-1 bytes to a Rust string. Total: every byte is a valid
/// Latin-1 scalar.
pub fn narrow_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode a Rust string as UTF-16 code units.
pub fn wide_from_str(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Decode UTF-16 code units to a Rust string, replacing unpaired
/// surrogates.
pub fn wide_to_string(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Convert narrow bytes to wide code units (via the scalar values).
pub fn narrow_to_wide(bytes: &[u8]) -> Vec<u16> {
    bytes.iter().map(|&b| u16::from(b)).collect()
}

/// Convert wide code units to narrow bytes, replacing units above U+00FF
/// with `?`.
pub fn wide_to_narrow(units: &[u16]) -> Vec<u8> {
    units
        .iter()
        .map(|&u| if u <= 0xFF { u as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_round_trips_exactly() {
        let s = "résolution: 300 dpi";
        let narrow = narrow_from_str(s);
        assert_eq!(narrow_to_string(&narrow), s);
    }

    #[test]
    fn non_latin1_is_replaced() {
        let narrow = narrow_from_str("dpi→300");
        assert_eq!(narrow_to_string(&narrow), "dpi?300");
    }

    #[test]
    fn wide_round_trips_bmp_and_astral() {
        let s = "naïve 🙂";
        let wide = wide_from_str(s);
        assert_eq!(wide_to_string(&wide), s);
    }

    #[test]
    fn narrow_wide_conversion_preserves_latin1() {
        let narrow = narrow_from_str("Ärger");
        let wide = narrow_to_wide(&narrow);
        assert_eq!(wide_to_narrow(&wide), narrow);
        assert_eq!(wide_to_string(&wide), "Ärger");
    }

    #[test]
    fn wide_to_narrow_replaces_high_units() {
        let wide = wide_from_str("höhe✓");
        let narrow = wide_to_narrow(&wide);
        assert_eq!(narrow_to_string(&narrow), "höhe?");
    }
}
