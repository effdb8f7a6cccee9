//! Container header and scalar type definitions
//!
//! This module contains the fixed-size header that starts every `.fba`
//! container together with the scalar type tags used throughout the crate.

use core::mem::size_of;

use crate::{Error, Result};

/// Fixed-size header for `.fba` container files
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ContainerHeader {
    /// Magic bytes: "FBAR"
    pub magic: [u8; 4],
    /// Format version
    pub version: u8,
    /// Layout flags (see [`ContainerHeader::LITTLE_ENDIAN`])
    pub flags: u8,
    /// Padding for alignment
    pub _padding: [u8; 2],
    /// Number of array entries in the directory
    pub entry_count: u64,
    /// Offset of the first array payload
    pub data_offset: u64,
    /// Offset of the JSON directory from file start
    pub directory_offset: u64,
    /// Size of the JSON directory in bytes
    pub directory_size: u64,
    /// Reserved space for future extensions
    pub reserved: [u8; 24],
}

impl ContainerHeader {
    /// Magic bytes for `.fba` files
    pub const MAGIC: [u8; 4] = *b"FBAR";

    /// Current format version
    pub const VERSION: u8 = 1;

    /// Payloads are stored little-endian
    pub const LITTLE_ENDIAN: u8 = 1 << 0;

    /// Size of the header in bytes
    pub const SIZE: usize = size_of::<Self>();

    /// Create a new header with default values
    pub const fn new() -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            flags: Self::LITTLE_ENDIAN,
            _padding: [0; 2],
            entry_count: 0,
            data_offset: Self::SIZE as u64,
            directory_offset: 0,
            directory_size: 0,
            reserved: [0; 24],
        }
    }

    /// Validate magic, version and byte order
    pub fn is_valid(&self) -> bool {
        self.magic == Self::MAGIC
            && self.version <= Self::VERSION
            && self.flags & Self::LITTLE_ENDIAN != 0
            && cfg!(target_endian = "little")
    }

    /// Directory region as (offset, size), `None` for an empty container
    pub fn directory_region(&self) -> Option<(u64, u64)> {
        if self.directory_size == 0 {
            None
        } else {
            Some((self.directory_offset, self.directory_size))
        }
    }

    /// Parse and validate a header from the start of a byte buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::InvalidHeader);
        }
        if bytes[0..4] != Self::MAGIC {
            return Err(Error::InvalidHeader);
        }

        let header: Self = bytemuck::pod_read_unaligned(&bytes[..Self::SIZE]);
        if !header.is_valid() {
            return Err(Error::InvalidHeader);
        }
        if header.directory_size > super::constants::MAX_DIRECTORY_SIZE {
            return Err(Error::InvalidHeader);
        }
        // Payloads never overlap the header itself
        if header.data_offset < Self::SIZE as u64 {
            return Err(Error::InvalidHeader);
        }
        Ok(header)
    }

    /// View the header as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for ContainerHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Scalar element types an array can be stored as or cast to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum ScalarType {
    I8 = 0,
    I16 = 1,
    I32 = 2,
    I64 = 3,
    U8 = 4,
    U16 = 5,
    U32 = 6,
    U64 = 7,
    F32 = 8,
    F64 = 9,
}

impl ScalarType {
    pub const ALL: [ScalarType; 10] = [
        ScalarType::I8,
        ScalarType::I16,
        ScalarType::I32,
        ScalarType::I64,
        ScalarType::U8,
        ScalarType::U16,
        ScalarType::U32,
        ScalarType::U64,
        ScalarType::F32,
        ScalarType::F64,
    ];

    /// Size in bytes of one element
    pub const fn size_bytes(&self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::I64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    pub const fn is_integer(&self) -> bool {
        !matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    /// numpy-style type name
    pub const fn name(&self) -> &'static str {
        match self {
            ScalarType::I8 => "int8",
            ScalarType::I16 => "int16",
            ScalarType::I32 => "int32",
            ScalarType::I64 => "int64",
            ScalarType::U8 => "uint8",
            ScalarType::U16 => "uint16",
            ScalarType::U32 => "uint32",
            ScalarType::U64 => "uint64",
            ScalarType::F32 => "float32",
            ScalarType::F64 => "float64",
        }
    }

    /// Parse either the numpy name (`int16`) or the short tag (`i16`)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| {
            ty.name() == name || {
                let short = match ty {
                    ScalarType::I8 => "i8",
                    ScalarType::I16 => "i16",
                    ScalarType::I32 => "i32",
                    ScalarType::I64 => "i64",
                    ScalarType::U8 => "u8",
                    ScalarType::U16 => "u16",
                    ScalarType::U32 => "u32",
                    ScalarType::U64 => "u64",
                    ScalarType::F32 => "f32",
                    ScalarType::F64 => "f64",
                };
                short == name
            }
        })
    }

    /// Reject non-integer types where positions are expected
    pub fn require_integer(self) -> Result<Self> {
        if self.is_integer() {
            Ok(self)
        } else {
            Err(Error::TypeMismatch {
                expected: "an integer type",
                found: self,
            })
        }
    }
}

impl core::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
