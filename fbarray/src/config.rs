//! Construction options for backed arrays
//!
//! Plain builder structs; nothing is read from the environment.

use fbarray_core::{LayoutHint, Result, ScalarType};

/// Options for opening a dense array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenseOptions {
    /// Output scalar type, stored type when `None`
    pub dtype: Option<ScalarType>,
    /// Logical axis order equals physical order when true, reversed otherwise
    pub native_order: bool,
}

impl DenseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output scalar type
    pub fn with_dtype(mut self, dtype: ScalarType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_native_order(mut self, native_order: bool) -> Self {
        self.native_order = native_order;
        self
    }
}

impl Default for DenseOptions {
    fn default() -> Self {
        Self {
            dtype: None,
            native_order: true,
        }
    }
}

/// Options for opening a compressed-sparse matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SparseOptions {
    /// Logical `(rows, cols)`, overriding stored attributes
    pub shape: Option<(usize, usize)>,
    /// Format tag, overriding stored attributes: column-compressed when true
    pub by_column: Option<bool>,
    /// Output value type, stored type when `None`
    pub dtype: Option<ScalarType>,
    /// Output secondary-index type, stored type when `None`
    pub index_dtype: Option<ScalarType>,
}

impl SparseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shape(mut self, nrows: usize, ncols: usize) -> Self {
        self.shape = Some((nrows, ncols));
        self
    }

    /// Declare the format: column-compressed when true, row-compressed otherwise
    pub fn by_column(mut self, by_column: bool) -> Self {
        self.by_column = Some(by_column);
        self
    }

    pub fn with_dtype(mut self, dtype: ScalarType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_index_dtype(mut self, index_dtype: ScalarType) -> Self {
        self.index_dtype = Some(index_dtype);
        self
    }

    /// Overrides passed on to layout inference
    pub fn hint(&self) -> LayoutHint {
        LayoutHint {
            shape: self.shape,
            by_column: self.by_column,
        }
    }

    /// Reject option combinations that can never be honored
    pub fn validate(&self) -> Result<()> {
        if let Some(index_dtype) = self.index_dtype {
            index_dtype.require_integer()?;
        }
        Ok(())
    }
}

/// Options for opening an array whose layout is not known in advance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackedOptions {
    pub dense: DenseOptions,
    pub sparse: SparseOptions,
}

impl BackedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output scalar type for either layout
    pub fn with_dtype(mut self, dtype: ScalarType) -> Self {
        self.dense.dtype = Some(dtype);
        self.sparse.dtype = Some(dtype);
        self
    }

    pub fn with_dense(mut self, dense: DenseOptions) -> Self {
        self.dense = dense;
        self
    }

    pub fn with_sparse(mut self, sparse: SparseOptions) -> Self {
        self.sparse = sparse;
        self
    }
}
