//! Trailing-zero-truncated `f64` encoding.
//!
//! The wire order is always big-endian, regardless of host endianness: the
//! value is rendered as its canonical 8-byte big-endian representation and
//! then trimmed from the least-significant end for as long as the trailing
//! byte is zero. Decoding zero-pads the missing tail back in.

use crate::error::FormatError;

pub fn encode_float(f: f64) -> (u8, Vec<u8>) {
    let bytes = f.to_be_bytes();
    let mut width = 8usize;
    while width > 0 && bytes[width - 1] == 0 {
        width -= 1;
    }
    (width as u8, bytes[..width].to_vec())
}

pub fn decode_float(width: u8, bytes: &[u8]) -> Result<f64, FormatError> {
    if width as usize > 8 {
        return Err(FormatError::Internal("float width out of range".into()));
    }
    if bytes.len() != width as usize {
        return Err(FormatError::Internal("float payload length mismatch".into()));
    }
    let mut buf = [0u8; 8];
    buf[..width as usize].copy_from_slice(bytes);
    Ok(f64::from_be_bytes(buf))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_encodes_to_empty_payload() {
        let (width, bytes) = encode_float(0.0);
        assert_eq!(width, 0);
        assert!(bytes.is_empty());
        assert_eq!(decode_float(width, &bytes).unwrap(), 0.0);
    }

    #[test]
    fn round_trips_representative_values() {
        let values = [1.0, -1.0, 0.5, 3.25, 1234.5, -1234.5, f64::MIN_POSITIVE, f64::MAX];
        for &v in &values {
            let (width, bytes) = encode_float(v);
            assert_eq!(decode_float(width, &bytes).unwrap(), v);
        }
    }

    #[test]
    fn truncates_only_trailing_zero_bytes() {
        // 1.0 is 0x3FF0000000000000 big-endian: six trailing zero bytes, two kept.
        let (width, bytes) = encode_float(1.0);
        assert_eq!(width, 2);
        assert_eq!(bytes, vec![0x3F, 0xF0]);
    }

    #[test]
    fn nan_and_infinity_round_trip_by_bit_pattern() {
        let (width, bytes) = encode_float(f64::INFINITY);
        assert_eq!(decode_float(width, &bytes).unwrap(), f64::INFINITY);

        let (width, bytes) = encode_float(f64::NAN);
        assert!(decode_float(width, &bytes).unwrap().is_nan());
    }
}
