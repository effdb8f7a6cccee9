//! Layout validation utilities for the container format

use alloc::format;

use crate::{Error, Result};

/// Align an offset to a power-of-two boundary
pub const fn align_to_boundary(offset: usize, boundary: usize) -> usize {
    (offset + boundary - 1) & !(boundary - 1)
}

/// Align an offset to the 8-byte payload boundary
pub const fn align_to_8(offset: usize) -> usize {
    align_to_boundary(offset, crate::format::constants::ALIGNMENT_BOUNDARY)
}

/// Check that `[offset, offset + size)` lies inside a file of `file_len` bytes
pub fn validate_region(offset: u64, size: u64, file_len: u64) -> Result<()> {
    let end = offset
        .checked_add(size)
        .ok_or(Error::ArraySizeOverflow)?;
    if end > file_len {
        return Err(Error::CorruptedData(format!(
            "region {offset}..{end} extends beyond {file_len} bytes"
        )));
    }
    Ok(())
}
