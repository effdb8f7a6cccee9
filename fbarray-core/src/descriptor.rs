//! Dataset description and layout inference
//!
//! [`infer`] inspects the store once, reading metadata only, and settles the
//! storage layout for the lifetime of the array. Engines dispatch on the
//! resulting [`Layout`] tag and never inspect it again.

use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::format::constants::{attrs, members, PATH_SEPARATOR};
use crate::format::{AttrValue, Attributes, ScalarType};
use crate::traits::{ArrayInfo, ArrayStore};
use crate::{Error, Result};

/// Physical storage layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    Dense,
    /// CSR-style: entries grouped by row
    CompressedByRow,
    /// CSC-style: entries grouped by column
    CompressedByColumn,
}

impl Layout {
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Layout::Dense)
    }

    /// `Some(true)` for column-compressed, `None` for dense
    pub fn by_column(&self) -> Option<bool> {
        match self {
            Layout::Dense => None,
            Layout::CompressedByRow => Some(false),
            Layout::CompressedByColumn => Some(true),
        }
    }

    pub fn from_by_column(by_column: bool) -> Self {
        if by_column {
            Layout::CompressedByColumn
        } else {
            Layout::CompressedByRow
        }
    }
}

/// Names of the physical arrays backing a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageArrays {
    Dense {
        array: String,
    },
    Compressed {
        data: String,
        indices: String,
        indptr: String,
    },
}

/// Overrides for facts the store may not describe on its own
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutHint {
    /// Logical `(rows, cols)` of a compressed group
    pub shape: Option<(usize, usize)>,
    /// Format tag of a compressed group: column-compressed when true
    pub by_column: Option<bool>,
}

/// Everything learned about a dataset at open time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    pub name: String,
    /// Physical shape; `(rows, cols)` for compressed layouts
    pub shape: Vec<usize>,
    /// Stored value type
    pub scalar_type: ScalarType,
    /// Stored secondary-index type, compressed layouts only
    pub index_type: Option<ScalarType>,
    pub layout: Layout,
    /// Physical chunk geometry, or the natural unit of access for compressed layouts
    pub chunk_shape: Vec<usize>,
    pub arrays: StorageArrays,
    /// Stored entry count, compressed layouts only
    pub nnz: Option<usize>,
}

impl DatasetDescriptor {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Extent of the compressed (grouping) axis
    pub fn primary_extent(&self) -> Option<usize> {
        match self.layout {
            Layout::Dense => None,
            Layout::CompressedByRow => Some(self.shape[0]),
            Layout::CompressedByColumn => Some(self.shape[1]),
        }
    }
}

/// Join a group name and a member name with the path separator
pub fn member_path(group: &str, member: &str) -> String {
    let group = group.trim_end_matches(PATH_SEPARATOR);
    if group.is_empty() {
        member.into()
    } else {
        format!("{group}{PATH_SEPARATOR}{member}")
    }
}

/// Determine the layout of the artifact called `name`
///
/// A named array is dense. A group holding `data`, `indices` and `indptr`
/// is compressed, with its format tag and shape taken from `hint` or the
/// group attributes. Anything else is [`Error::UnsupportedLayout`].
pub fn infer<S: ArrayStore + ?Sized>(
    store: &S,
    name: &str,
    hint: &LayoutHint,
) -> Result<DatasetDescriptor> {
    if let Some(info) = store.array_info(name)? {
        return dense_descriptor(name, info);
    }

    let data_name = member_path(name, members::DATA);
    let indices_name = member_path(name, members::INDICES);
    let indptr_name = member_path(name, members::INDPTR);

    let (data, indices, indptr) = match (
        store.array_info(&data_name)?,
        store.array_info(&indices_name)?,
        store.array_info(&indptr_name)?,
    ) {
        (Some(data), Some(indices), Some(indptr)) => (data, indices, indptr),
        (None, None, None) => {
            return Err(Error::UnsupportedLayout(format!(
                "{name} is neither a dense array nor a compressed-sparse group"
            )))
        }
        _ => {
            return Err(Error::UnsupportedLayout(format!(
                "{name} lacks one of {}, {}, {}",
                members::DATA,
                members::INDICES,
                members::INDPTR
            )))
        }
    };

    if data.ndim() != 1 || indices.ndim() != 1 || indptr.ndim() != 1 {
        return Err(Error::UnsupportedLayout(format!(
            "members of {name} must be one-dimensional"
        )));
    }
    if data.len() != indices.len() {
        return Err(Error::UnsupportedLayout(format!(
            "{name} has {} values but {} indices",
            data.len(),
            indices.len()
        )));
    }
    if !indices.scalar_type.is_integer() || !indptr.scalar_type.is_integer() {
        return Err(Error::UnsupportedLayout(format!(
            "{name} index arrays must be integer typed"
        )));
    }

    let group_attrs = store.attributes(name)?.unwrap_or_default();
    let by_column = match hint.by_column {
        Some(by_column) => by_column,
        None => format_tag(&group_attrs).ok_or_else(|| {
            Error::UnsupportedLayout(format!("{name} does not declare csr or csc format"))
        })?,
    };
    let (nrows, ncols) = match hint.shape {
        Some(shape) => shape,
        None => declared_shape(&group_attrs)
            .ok_or_else(|| Error::UnsupportedLayout(format!("{name} does not declare its shape")))?,
    };

    let primary = if by_column { ncols } else { nrows };
    if indptr.len() != primary + 1 {
        return Err(Error::UnsupportedLayout(format!(
            "{name} indptr has {} offsets, expected {}",
            indptr.len(),
            primary + 1
        )));
    }

    let chunk_shape = if by_column {
        vec![nrows, 1]
    } else {
        vec![1, ncols]
    };
    Ok(DatasetDescriptor {
        name: name.into(),
        shape: vec![nrows, ncols],
        scalar_type: data.scalar_type,
        index_type: Some(indices.scalar_type),
        layout: Layout::from_by_column(by_column),
        chunk_shape,
        arrays: StorageArrays::Compressed {
            data: data_name,
            indices: indices_name,
            indptr: indptr_name,
        },
        nnz: Some(data.len()),
    })
}

fn dense_descriptor(name: &str, info: ArrayInfo) -> Result<DatasetDescriptor> {
    if info.ndim() == 0 {
        return Err(Error::UnsupportedLayout(format!("{name} is a scalar")));
    }
    let chunk_shape = match info.chunk_shape {
        Some(chunks) if chunks.len() == info.shape.len() => chunks,
        _ => info.shape.clone(),
    };
    Ok(DatasetDescriptor {
        name: name.into(),
        shape: info.shape,
        scalar_type: info.scalar_type,
        index_type: None,
        layout: Layout::Dense,
        chunk_shape,
        arrays: StorageArrays::Dense { array: name.into() },
        nnz: None,
    })
}

/// `Some(true)` for column-compressed
fn format_tag(group_attrs: &Attributes) -> Option<bool> {
    let lookup = |key: &str| group_attrs.get(key).and_then(AttrValue::as_str);
    match lookup(attrs::ENCODING_TYPE) {
        Some(attrs::CSR_ENCODING) => return Some(false),
        Some(attrs::CSC_ENCODING) => return Some(true),
        _ => {}
    }
    match lookup(attrs::H5SPARSE_FORMAT) {
        Some(attrs::CSR_SHORT) => Some(false),
        Some(attrs::CSC_SHORT) => Some(true),
        _ => None,
    }
}

fn declared_shape(group_attrs: &Attributes) -> Option<(usize, usize)> {
    [attrs::SHAPE, attrs::H5SPARSE_SHAPE]
        .into_iter()
        .filter_map(|key| group_attrs.get(key).and_then(AttrValue::as_shape))
        .find_map(|shape| match shape.as_slice() {
            &[rows, cols] => Some((rows, cols)),
            _ => None,
        })
}
