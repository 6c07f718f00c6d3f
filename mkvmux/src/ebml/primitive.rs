//! Encoding/decoding of EBML primitive values (§4.2): unsigned/signed
//! integers, floats, strings, binary blobs and dates. Element size
//! always selects the width; these functions never guess it.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PrimitiveError {
    #[error("integer of size {0} exceeds the 8 byte maximum")]
    IntTooWide(u64),
    #[error("float element size must be 0, 4 or 8, got {0}")]
    InvalidFloatSize(u64),
    #[error("buffer of {got} bytes is too short for a {needed} byte element")]
    Truncated { needed: usize, got: usize },
    #[error("invalid UTF-8 in string element: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

fn take(input: &[u8], size: usize) -> Result<&[u8], PrimitiveError> {
    if input.len() < size {
        return Err(PrimitiveError::Truncated {
            needed: size,
            got: input.len(),
        });
    }

    Ok(&input[..size])
}

/// Reads a big-endian unsigned integer of `size` bytes (1..=8).
pub fn read_uint(input: &[u8], size: u64) -> Result<u64, PrimitiveError> {
    if size > 8 {
        return Err(PrimitiveError::IntTooWide(size));
    }
    if size == 0 {
        return Ok(0);
    }

    let bytes = take(input, size as usize)?;

    let mut value = 0u64;
    for &b in bytes {
        value = (value << 8) | b as u64;
    }

    Ok(value)
}

pub fn write_uint(value: u64, size: usize, out: &mut Vec<u8>) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[8 - size..]);
}

/// Reads a big-endian signed integer, sign-extended from the MSB of the
/// first encoded byte.
pub fn read_int(input: &[u8], size: u64) -> Result<i64, PrimitiveError> {
    if size > 8 {
        return Err(PrimitiveError::IntTooWide(size));
    }
    if size == 0 {
        return Ok(0);
    }

    let bytes = take(input, size as usize)?;
    let negative = bytes[0] & 0x80 != 0;

    let mut value: i64 = if negative { -1 } else { 0 };
    for &b in bytes {
        value = (value << 8) | b as i64;
    }

    Ok(value)
}

pub fn write_int(value: i64, size: usize, out: &mut Vec<u8>) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[8 - size..]);
}

/// Reads a 32- or 64-bit big-endian IEEE-754 float. `size == 0` yields 0.0.
pub fn read_float(input: &[u8], size: u64) -> Result<f64, PrimitiveError> {
    match size {
        0 => Ok(0.0),
        4 => {
            let bytes = take(input, 4)?;
            Ok(f32::from_be_bytes(bytes.try_into().unwrap()) as f64)
        }
        8 => {
            let bytes = take(input, 8)?;
            Ok(f64::from_be_bytes(bytes.try_into().unwrap()))
        }
        other => Err(PrimitiveError::InvalidFloatSize(other)),
    }
}

pub fn write_float(value: f64, size: usize, out: &mut Vec<u8>) {
    match size {
        4 => out.extend_from_slice(&(value as f32).to_be_bytes()),
        8 => out.extend_from_slice(&value.to_be_bytes()),
        _ => unreachable!("float element size must be validated before writing"),
    }
}

/// Reads an ASCII/UTF-8 string. A NUL byte terminates reading; any
/// trailing padding bytes after it are discarded.
pub fn read_str(input: &[u8], size: u64) -> Result<String, PrimitiveError> {
    let bytes = take(input, size as usize)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());

    Ok(std::str::from_utf8(&bytes[..end])?.to_string())
}

/// Writes a string, padding with NULs to `default_size` if the value is
/// shorter. If the value is longer than `default_size`, no padding is
/// added (the full value is still written).
pub fn write_str(value: &str, default_size: Option<usize>, out: &mut Vec<u8>) {
    out.extend_from_slice(value.as_bytes());

    if let Some(default_size) = default_size {
        if value.len() < default_size {
            out.resize(out.len() + (default_size - value.len()), 0);
        }
    }
}

/// Reads a binary blob of exactly `size` bytes.
pub fn read_binary(input: &[u8], size: u64) -> Result<Vec<u8>, PrimitiveError> {
    Ok(take(input, size as usize)?.to_vec())
}

/// Date elements store signed 64-bit nanoseconds relative to
/// 2001-01-01T00:00:00 UTC (the Matroska/EBML epoch).
pub const DATE_EPOCH_UNIX_NANOS: i64 = 978_307_200 * 1_000_000_000;

pub fn read_date(input: &[u8]) -> Result<i64, PrimitiveError> {
    read_int(input, 8)
}

pub fn write_date(value_ns: i64, out: &mut Vec<u8>) {
    write_int(value_ns, 8, out);
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 1)]
    #[test_case(255, 1)]
    #[test_case(65535, 2)]
    #[test_case(1_000_000, 4)]
    #[test_case(u64::MAX, 8)]
    fn uint_roundtrip(value: u64, size: usize) {
        let mut buf = Vec::new();
        write_uint(value, size, &mut buf);
        assert_eq!(read_uint(&buf, size as u64).unwrap(), value);
    }

    #[test_case(0, 1)]
    #[test_case(-1, 1)]
    #[test_case(-128, 1)]
    #[test_case(-32768, 2)]
    #[test_case(i64::MIN, 8)]
    #[test_case(i64::MAX, 8)]
    fn int_roundtrip(value: i64, size: usize) {
        let mut buf = Vec::new();
        write_int(value, size, &mut buf);
        assert_eq!(read_int(&buf, size as u64).unwrap(), value);
    }

    #[test_case(0.0, 4)]
    #[test_case(-1.5, 4)]
    #[test_case(3.1415926535, 8)]
    #[test_case(f64::MIN, 8)]
    fn float_roundtrip(value: f64, size: usize) {
        let mut buf = Vec::new();
        write_float(value, size, &mut buf);
        let back = read_float(&buf, size as u64).unwrap();

        if size == 4 {
            assert_eq!(back as f32, value as f32);
        } else {
            assert_eq!(back, value);
        }
    }

    #[test]
    fn float_zero_size_is_zero() {
        assert_eq!(read_float(&[], 0).unwrap(), 0.0);
    }

    #[test]
    fn float_invalid_size() {
        assert_eq!(
            read_float(&[0, 0, 0], 3),
            Err(PrimitiveError::InvalidFloatSize(3))
        );
    }

    #[test]
    fn string_nul_terminates_reading() {
        let bytes = b"matroska\0\0\0";
        assert_eq!(read_str(bytes, bytes.len() as u64).unwrap(), "matroska");
    }

    #[test]
    fn string_write_pads_to_default_size() {
        let mut buf = Vec::new();
        write_str("hi", Some(5), &mut buf);
        assert_eq!(buf, b"hi\0\0\0");
    }

    #[test]
    fn string_write_without_default_size_is_exact() {
        let mut buf = Vec::new();
        write_str("hi", None, &mut buf);
        assert_eq!(buf, b"hi");
    }

    #[test]
    fn binary_exact_size() {
        let data = [1, 2, 3, 4];
        assert_eq!(read_binary(&data, 4).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn date_roundtrip() {
        let mut buf = Vec::new();
        write_date(123_456_789, &mut buf);
        assert_eq!(read_date(&buf).unwrap(), 123_456_789);
    }
}
