//! Array bounds validation for stored payloads

use crate::format::ScalarType;
use crate::{Error, Result};

/// Validate a payload byte length for a scalar type and return its element count
pub fn validate_array_bounds(dtype: ScalarType, byte_len: usize) -> Result<usize> {
    let element_size = dtype.size_bytes();

    if byte_len % element_size != 0 {
        return Err(Error::ArrayAlignment);
    }

    let count = byte_len / element_size;

    // Reject counts that would overflow downstream offset arithmetic
    if count > usize::MAX / 8 {
        return Err(Error::ArraySizeOverflow);
    }

    Ok(count)
}

/// Byte length of `count` elements of `dtype`, with overflow protection
pub fn validate_typed_len(dtype: ScalarType, count: usize) -> Result<usize> {
    match count.checked_mul(dtype.size_bytes()) {
        Some(len) => Ok(len),
        None => Err(Error::ArraySizeOverflow),
    }
}
