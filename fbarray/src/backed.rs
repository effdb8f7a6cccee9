//! Layout-dispatching backed array
//!
//! [`BackedArray`] runs layout inference once and wraps whichever array
//! type the storage calls for. Every call after that is a match on the
//! variant.

use std::path::Path;

use fbarray_core::{
    infer, ArrayStore, Block, DenseBlock, ExtractArray, Layout, Result, ScalarType, Selector,
};

use crate::config::BackedOptions;
use crate::dense::DenseArray;
use crate::sparse::CompressedSparseMatrix;
#[cfg(feature = "mmap")]
use crate::store::ContainerStore;

/// A dense array or a compressed-sparse matrix, chosen by the storage layout
#[derive(Debug)]
pub enum BackedArray<S> {
    Dense(DenseArray<S>),
    Sparse(CompressedSparseMatrix<S>),
}

#[cfg(feature = "mmap")]
impl BackedArray<ContainerStore> {
    /// Open `name` in a container file, whatever its layout
    pub fn open<P: AsRef<Path>>(path: P, name: &str, options: BackedOptions) -> Result<Self> {
        let store = ContainerStore::open(&path)?;
        let mut array = Self::from_store(store, name, options)?;
        let path = path.as_ref().to_path_buf();
        match &mut array {
            BackedArray::Dense(dense) => dense.set_path(path),
            BackedArray::Sparse(sparse) => sparse.set_path(path),
        }
        Ok(array)
    }
}

impl<S: ArrayStore> BackedArray<S> {
    pub fn from_store(store: S, name: &str, options: BackedOptions) -> Result<Self> {
        options.sparse.validate()?;
        let descriptor = infer(&store, name, &options.sparse.hint())?;
        Ok(match descriptor.layout {
            Layout::Dense => {
                BackedArray::Dense(DenseArray::from_descriptor(store, descriptor, options.dense)?)
            }
            Layout::CompressedByRow | Layout::CompressedByColumn => BackedArray::Sparse(
                CompressedSparseMatrix::from_descriptor(store, descriptor, options.sparse)?,
            ),
        })
    }

    pub fn layout(&self) -> Layout {
        match self {
            BackedArray::Dense(dense) => dense.descriptor().layout,
            BackedArray::Sparse(sparse) => sparse.descriptor().layout,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BackedArray::Dense(dense) => dense.name(),
            BackedArray::Sparse(sparse) => sparse.group_name(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            BackedArray::Dense(dense) => dense.path(),
            BackedArray::Sparse(sparse) => sparse.path(),
        }
    }

    pub fn as_dense(&self) -> Option<&DenseArray<S>> {
        match self {
            BackedArray::Dense(dense) => Some(dense),
            BackedArray::Sparse(_) => None,
        }
    }

    pub fn as_sparse(&self) -> Option<&CompressedSparseMatrix<S>> {
        match self {
            BackedArray::Sparse(sparse) => Some(sparse),
            BackedArray::Dense(_) => None,
        }
    }

    pub fn close(&mut self) {
        match self {
            BackedArray::Dense(dense) => dense.close(),
            BackedArray::Sparse(sparse) => sparse.close(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            BackedArray::Dense(dense) => dense.is_closed(),
            BackedArray::Sparse(sparse) => sparse.is_closed(),
        }
    }
}

impl<S: ArrayStore> ExtractArray for BackedArray<S> {
    fn shape(&self) -> Vec<usize> {
        match self {
            BackedArray::Dense(dense) => dense.shape(),
            BackedArray::Sparse(sparse) => sparse.shape(),
        }
    }

    fn dtype(&self) -> ScalarType {
        match self {
            BackedArray::Dense(dense) => dense.dtype(),
            BackedArray::Sparse(sparse) => sparse.dtype(),
        }
    }

    fn chunk_shape(&self) -> Vec<usize> {
        match self {
            BackedArray::Dense(dense) => dense.chunk_shape(),
            BackedArray::Sparse(sparse) => sparse.chunk_shape(),
        }
    }

    fn extract_dense(&self, selectors: &[Selector]) -> Result<DenseBlock> {
        match self {
            BackedArray::Dense(dense) => dense.extract_dense(selectors),
            BackedArray::Sparse(sparse) => sparse.extract_dense(selectors),
        }
    }

    fn extract_sparse(&self, selectors: &[Selector]) -> Result<Block> {
        match self {
            BackedArray::Dense(dense) => dense.extract_sparse(selectors),
            BackedArray::Sparse(sparse) => sparse.extract_sparse(selectors),
        }
    }

    fn is_sparse(&self) -> bool {
        matches!(self, BackedArray::Sparse(_))
    }
}
