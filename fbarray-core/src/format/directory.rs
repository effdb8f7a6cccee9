//! Directory entries describing the named arrays and groups of a container
//!
//! The directory is serialized as JSON at the end of the container; the
//! structures here are the in-memory form shared by the reader and writer.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use super::header::ScalarType;
use crate::validation::{validate_array_bounds, validate_region};
use crate::{Error, Result};

/// Attribute map attached to a group or an array
pub type Attributes = BTreeMap<String, AttrValue>;

/// A single attribute value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    IntList(Vec<i64>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Interpret the value as a shape, rejecting negative extents
    pub fn as_shape(&self) -> Option<Vec<usize>> {
        match self {
            AttrValue::IntList(values) => values
                .iter()
                .map(|&v| usize::try_from(v).ok())
                .collect(),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.into())
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<&[usize]> for AttrValue {
    fn from(value: &[usize]) -> Self {
        AttrValue::IntList(value.iter().map(|&v| v as i64).collect())
    }
}

/// Directory entry for one stored array
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayEntry {
    /// Full path of the array, e.g. `matrix/indptr`
    pub name: String,
    pub dtype: ScalarType,
    pub shape: Vec<u64>,
    /// Physical chunk geometry, `None` for contiguous storage
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub chunks: Option<Vec<u64>>,
    /// Payload offset from file start
    pub offset: u64,
    /// Payload size in bytes
    pub size: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attrs: Attributes,
}

impl ArrayEntry {
    /// Number of elements implied by the shape
    pub fn element_count(&self) -> Result<usize> {
        self.shape.iter().try_fold(1usize, |acc, &extent| {
            usize::try_from(extent)
                .ok()
                .and_then(|extent| acc.checked_mul(extent))
                .ok_or(Error::ArraySizeOverflow)
        })
    }

    pub fn shape_usize(&self) -> Result<Vec<usize>> {
        self.shape
            .iter()
            .map(|&extent| usize::try_from(extent).map_err(|_| Error::ArraySizeOverflow))
            .collect()
    }

    pub fn chunks_usize(&self) -> Result<Option<Vec<usize>>> {
        self.chunks
            .as_ref()
            .map(|chunks| {
                chunks
                    .iter()
                    .map(|&extent| usize::try_from(extent).map_err(|_| Error::ArraySizeOverflow))
                    .collect()
            })
            .transpose()
    }

    /// Check that the payload lies inside the file and matches the shape
    pub fn validate(&self, file_len: u64) -> Result<()> {
        validate_region(self.offset, self.size, file_len)?;

        let size = usize::try_from(self.size).map_err(|_| Error::ArraySizeOverflow)?;
        let count = validate_array_bounds(self.dtype, size)?;
        if count != self.element_count()? {
            return Err(Error::ShapeMismatch(format!(
                "array {} holds {count} elements but its shape implies {}",
                self.name,
                self.element_count()?
            )));
        }

        if let Some(chunks) = &self.chunks {
            if chunks.len() != self.shape.len() || chunks.iter().any(|&c| c == 0) {
                return Err(Error::ShapeMismatch(format!(
                    "array {} has invalid chunk geometry",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Directory entry for a group, which only carries attributes
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupEntry {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attrs: Attributes,
}

/// Full container directory
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Directory {
    pub arrays: Vec<ArrayEntry>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub groups: Vec<GroupEntry>,
}

impl Directory {
    pub fn array(&self, name: &str) -> Option<&ArrayEntry> {
        self.arrays.iter().find(|entry| entry.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&GroupEntry> {
        self.groups.iter().find(|entry| entry.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(shape: Vec<u64>, size: u64) -> ArrayEntry {
        ArrayEntry {
            name: "m".into(),
            dtype: ScalarType::F32,
            shape,
            chunks: None,
            offset: 64,
            size,
            attrs: Attributes::new(),
        }
    }

    #[test]
    fn test_entry_validation() {
        assert_eq!(entry(vec![4, 5], 80).validate(1024), Ok(()));
        assert!(matches!(
            entry(vec![4, 5], 40).validate(1024),
            Err(Error::ShapeMismatch(_))
        ));
        assert!(matches!(
            entry(vec![4, 5], 80).validate(100),
            Err(Error::CorruptedData(_))
        ));
        assert_eq!(entry(vec![4, 5], 81).validate(1024), Err(Error::ArrayAlignment));
    }

    #[test]
    fn test_attr_shape() {
        assert_eq!(AttrValue::IntList(vec![3, 4]).as_shape(), Some(vec![3, 4]));
        assert_eq!(AttrValue::IntList(vec![3, -1]).as_shape(), None);
        assert_eq!(AttrValue::from("csr").as_shape(), None);
        assert_eq!(AttrValue::from("csr").as_str(), Some("csr"));
    }
}
