//! Extraction interface consumed by delayed-evaluation frameworks
//!
//! Every backed array answers the same four questions: its logical shape,
//! its output scalar type, a chunk-geometry hint for I/O planning, and the
//! values under a per-axis selection.

use alloc::vec::Vec;

use crate::block::{Block, DenseBlock};
use crate::format::ScalarType;
use crate::selection::Selector;
use crate::Result;

/// Trait for arrays that can extract sub-blocks on demand
pub trait ExtractArray {
    /// Logical shape, after any axis reversal
    fn shape(&self) -> Vec<usize>;

    /// Scalar type of extracted values
    fn dtype(&self) -> ScalarType;

    /// Chunk geometry hint in logical axis order
    ///
    /// Carries no correctness obligation.
    fn chunk_shape(&self) -> Vec<usize>;

    /// Extract a dense block
    ///
    /// One selector per axis; missing trailing selectors select everything.
    fn extract_dense(&self, selectors: &[Selector]) -> Result<DenseBlock>;

    /// Extract a block in the storage's natural form: compressed when the
    /// array is stored compressed, dense otherwise
    fn extract_sparse(&self, selectors: &[Selector]) -> Result<Block>;

    fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Whether `extract_sparse` produces compressed blocks
    fn is_sparse(&self) -> bool {
        false
    }
}
