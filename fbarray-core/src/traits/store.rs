//! Backing store interface
//!
//! This module defines the abstract contract every backing store satisfies:
//! named arrays with a shape and scalar type, attribute lookup for groups
//! and arrays, and two read shapes (contiguous hyperslab and strictly
//! increasing coordinate gather). Engines only ever talk to this trait.

use alloc::vec::Vec;
use core::ops::Range;

use crate::data::ArrayData;
use crate::format::{Attributes, ScalarType};
use crate::{Error, Result};

/// Shape and type of one stored array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayInfo {
    pub shape: Vec<usize>,
    pub scalar_type: ScalarType,
    /// Physical chunk geometry, `None` for contiguous storage
    pub chunk_shape: Option<Vec<usize>>,
}

impl ArrayInfo {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total element count
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for stores that hold named arrays
///
/// Reads are validated against the array shape by the store itself and
/// always return values in row-major order of the request.
pub trait ArrayStore {
    /// Shape and type of a named array, `None` if no such array exists
    fn array_info(&self, name: &str) -> Result<Option<ArrayInfo>>;

    /// Attributes of a named group or array, `None` if neither exists
    fn attributes(&self, name: &str) -> Result<Option<Attributes>>;

    /// Read the hyperslab given by one half-open range per axis
    ///
    /// On a 1-D array this is the ranged read by element offset.
    fn read_slab(&self, name: &str, ranges: &[Range<usize>]) -> Result<ArrayData>;

    /// Read the outer product of per-axis coordinate lists
    ///
    /// Each list must be strictly increasing.
    fn read_gather(&self, name: &str, indices: &[&[usize]]) -> Result<ArrayData>;

    /// Like [`ArrayStore::array_info`], with a missing array as an error
    fn require_info(&self, name: &str) -> Result<ArrayInfo> {
        self.array_info(name)?
            .ok_or_else(|| Error::MissingArray(name.into()))
    }

    /// Read a whole array
    fn read_all(&self, name: &str) -> Result<ArrayData> {
        let info = self.require_info(name)?;
        let ranges: Vec<Range<usize>> = info.shape.iter().map(|&extent| 0..extent).collect();
        self.read_slab(name, &ranges)
    }
}

impl<S: ArrayStore + ?Sized> ArrayStore for &S {
    fn array_info(&self, name: &str) -> Result<Option<ArrayInfo>> {
        (**self).array_info(name)
    }

    fn attributes(&self, name: &str) -> Result<Option<Attributes>> {
        (**self).attributes(name)
    }

    fn read_slab(&self, name: &str, ranges: &[Range<usize>]) -> Result<ArrayData> {
        (**self).read_slab(name, ranges)
    }

    fn read_gather(&self, name: &str, indices: &[&[usize]]) -> Result<ArrayData> {
        (**self).read_gather(name, indices)
    }
}
