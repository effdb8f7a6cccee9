//! `ndarray` interop for extracted blocks

use fbarray_core::{DenseBlock, Element, Error, Result};
use ndarray::{Array2, ArrayD, IxDyn};

/// Conversions between [`DenseBlock`] and `ndarray` arrays
pub trait DenseBlockExt: Sized {
    /// Row-major `n`-dimensional array, casting values to `T`
    fn to_ndarray<T: Element>(&self) -> Result<ArrayD<T>>;

    /// Two-dimensional array; fails unless the block has exactly two axes
    fn to_array2<T: Element>(&self) -> Result<Array2<T>>;

    fn from_ndarray<T: Element>(array: &ArrayD<T>) -> Result<Self>;
}

impl DenseBlockExt for DenseBlock {
    fn to_ndarray<T: Element>(&self) -> Result<ArrayD<T>> {
        ArrayD::from_shape_vec(IxDyn(self.shape()), self.to_vec::<T>())
            .map_err(|e| Error::ShapeMismatch(e.to_string()))
    }

    fn to_array2<T: Element>(&self) -> Result<Array2<T>> {
        match *self.shape() {
            [nrows, ncols] => Array2::from_shape_vec((nrows, ncols), self.to_vec::<T>())
                .map_err(|e| Error::ShapeMismatch(e.to_string())),
            _ => Err(Error::ShapeMismatch(format!(
                "expected a 2-dimensional block, got {} axes",
                self.ndim()
            ))),
        }
    }

    fn from_ndarray<T: Element>(array: &ArrayD<T>) -> Result<Self> {
        // `iter` walks logical row-major order regardless of memory layout
        let values: Vec<T> = array.iter().copied().collect();
        DenseBlock::new(array.shape().to_vec(), values.into())
    }
}
