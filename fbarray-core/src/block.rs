//! Extraction results
//!
//! A [`DenseBlock`] is a row-major n-dimensional buffer. A
//! [`CompressedBlock`] is a compressed-sparse matrix whose primary axis is
//! rows (`by_column == false`) or columns (`by_column == true`).

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::data::ArrayData;
use crate::format::ScalarType;
use crate::selection::AxisSelection;
use crate::slab::{advance, strides};
use crate::traits::Element;
use crate::{Error, Result};

/// Dense row-major block
#[derive(Debug, Clone, PartialEq)]
pub struct DenseBlock {
    shape: Vec<usize>,
    data: ArrayData,
}

impl DenseBlock {
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::ShapeMismatch(format!(
                "{} values for a block of shape {shape:?}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn zeros(shape: Vec<usize>, dtype: ScalarType) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: ArrayData::zeros(dtype, len),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dtype(&self) -> ScalarType {
        self.data.scalar_type()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    /// Value at a multi-index, widened to f64
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.shape.len() || index.iter().zip(&self.shape).any(|(i, e)| i >= e) {
            return None;
        }
        let flat = index
            .iter()
            .zip(strides(&self.shape))
            .map(|(i, stride)| i * stride)
            .sum();
        self.data.get_f64(flat)
    }

    /// Values in row-major order as `T`
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        self.data.to_vec()
    }

    pub fn cast(self, dtype: ScalarType) -> Self {
        Self {
            shape: self.shape,
            data: self.data.cast(dtype),
        }
    }

    /// Reverse the order of all axes (a transpose for 2-D blocks)
    pub fn reversed_axes(&self) -> Self {
        let shape: Vec<usize> = self.shape.iter().rev().copied().collect();
        if self.ndim() < 2 || self.is_empty() {
            return Self {
                shape,
                data: self.data.clone(),
            };
        }

        // Output axis k walks source axis (ndim - 1 - k)
        let source_strides: Vec<usize> = strides(&self.shape).into_iter().rev().collect();
        let mut counter = vec![0; shape.len()];
        let mut positions = Vec::with_capacity(self.len());
        loop {
            positions.push(
                counter
                    .iter()
                    .zip(&source_strides)
                    .map(|(i, stride)| i * stride)
                    .sum(),
            );
            if !advance(&mut counter, &shape) {
                break;
            }
        }
        Self {
            shape,
            data: self.data.take(&positions),
        }
    }
}

/// Compressed-sparse matrix block
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedBlock {
    shape: (usize, usize),
    by_column: bool,
    data: ArrayData,
    indices: ArrayData,
    indptr: Vec<usize>,
}

impl CompressedBlock {
    /// Assemble a block and check its structural invariants
    pub fn new(
        shape: (usize, usize),
        by_column: bool,
        data: ArrayData,
        indices: ArrayData,
        indptr: Vec<usize>,
    ) -> Result<Self> {
        let block = Self {
            shape,
            by_column,
            data,
            indices,
            indptr,
        };
        block.validate()?;
        Ok(block)
    }

    /// Block with no primary elements selected
    pub fn empty(
        secondary_extent: usize,
        by_column: bool,
        dtype: ScalarType,
        index_dtype: ScalarType,
    ) -> Self {
        let shape = if by_column {
            (secondary_extent, 0)
        } else {
            (0, secondary_extent)
        };
        Self {
            shape,
            by_column,
            data: ArrayData::empty(dtype),
            indices: ArrayData::empty(index_dtype),
            indptr: vec![0],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn by_column(&self) -> bool {
        self.by_column
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn primary_extent(&self) -> usize {
        if self.by_column {
            self.shape.1
        } else {
            self.shape.0
        }
    }

    pub fn secondary_extent(&self) -> usize {
        if self.by_column {
            self.shape.0
        } else {
            self.shape.1
        }
    }

    pub fn dtype(&self) -> ScalarType {
        self.data.scalar_type()
    }

    pub fn index_dtype(&self) -> ScalarType {
        self.indices.scalar_type()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn indices(&self) -> &ArrayData {
        &self.indices
    }

    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    pub fn into_parts(self) -> (ArrayData, ArrayData, Vec<usize>) {
        (self.data, self.indices, self.indptr)
    }

    /// Secondary positions as `T`
    pub fn indices_as<T: Element>(&self) -> Vec<T> {
        self.indices.to_vec()
    }

    /// Check pointer monotonicity, lengths and secondary index bounds
    pub fn validate(&self) -> Result<()> {
        if self.indptr.len() != self.primary_extent() + 1 {
            return Err(Error::CorruptedData(format!(
                "indptr holds {} offsets for {} primary elements",
                self.indptr.len(),
                self.primary_extent()
            )));
        }
        if self.indptr[0] != 0 || !self.indptr.windows(2).all(|w| w[0] <= w[1]) {
            return Err(Error::CorruptedData("indptr is not non-decreasing from 0".into()));
        }
        if self.data.len() != self.indices.len() || self.indptr[self.indptr.len() - 1] != self.nnz() {
            return Err(Error::CorruptedData(format!(
                "{} values and {} indices for {} pointed entries",
                self.data.len(),
                self.indices.len(),
                self.indptr[self.indptr.len() - 1]
            )));
        }
        let secondary = self.secondary_extent();
        if let Some(bad) = self.indices.to_positions()?.into_iter().find(|&i| i >= secondary) {
            return Err(Error::CorruptedData(format!(
                "secondary index {bad} outside extent {secondary}"
            )));
        }
        Ok(())
    }

    /// Keep only entries whose secondary index is in `selection`, renumbered
    /// to their position in it
    ///
    /// A secondary index selected more than once yields one entry per
    /// occurrence. Entries within each primary element come out ordered by
    /// their new position. The index type is kept when every new position
    /// fits in it and widened to `i64` otherwise.
    pub fn select_secondary(&self, selection: &AxisSelection) -> Result<Self> {
        if selection.extent() != self.secondary_extent() {
            return Err(Error::ShapeMismatch(format!(
                "secondary selection over extent {} for a block with extent {}",
                selection.extent(),
                self.secondary_extent()
            )));
        }

        let mut targets: HashMap<usize, Vec<usize>> = HashMap::with_capacity(selection.len());
        for (out, &index) in selection.indices().iter().enumerate() {
            targets.entry(index).or_default().push(out);
        }

        let stored = self.indices.to_positions()?;
        let mut take = Vec::new();
        let mut new_indices: Vec<u64> = Vec::new();
        let mut indptr = Vec::with_capacity(self.indptr.len());
        indptr.push(0);

        let mut line: Vec<(usize, usize)> = Vec::new();
        for window in self.indptr.windows(2) {
            line.clear();
            for entry in window[0]..window[1] {
                if let Some(outs) = targets.get(&stored[entry]) {
                    line.extend(outs.iter().map(|&out| (out, entry)));
                }
            }
            if !line.windows(2).all(|w| w[0].0 <= w[1].0) {
                line.sort_by_key(|&(out, _)| out);
            }
            for &(out, entry) in &line {
                new_indices.push(out as u64);
                take.push(entry);
            }
            indptr.push(take.len());
        }

        let shape = if self.by_column {
            (selection.len(), self.shape.1)
        } else {
            (self.shape.0, selection.len())
        };
        let index_dtype = if holds_positions(self.index_dtype(), selection.len()) {
            self.index_dtype()
        } else {
            ScalarType::I64
        };
        Ok(Self {
            shape,
            by_column: self.by_column,
            data: self.data.take(&take),
            indices: ArrayData::from(new_indices).cast(index_dtype),
            indptr,
        })
    }

    /// Scatter into a zero-filled dense block of the same shape
    ///
    /// Repeated entries for the same cell keep the last stored value.
    pub fn to_dense(&self) -> Result<DenseBlock> {
        self.validate()?;
        let (nrows, ncols) = self.shape;
        let stored = self.indices.to_positions()?;
        let mut positions = Vec::with_capacity(self.nnz());
        for (primary, window) in self.indptr.windows(2).enumerate() {
            for &secondary in &stored[window[0]..window[1]] {
                positions.push(if self.by_column {
                    secondary * ncols + primary
                } else {
                    primary * ncols + secondary
                });
            }
        }
        DenseBlock::new(vec![nrows, ncols], self.data.scatter(&positions, nrows * ncols)?)
    }

    pub fn cast(self, dtype: ScalarType) -> Self {
        Self {
            data: self.data.cast(dtype),
            ..self
        }
    }

    /// Cast the secondary positions; narrowing wraps like `as`
    pub fn cast_indices(self, index_dtype: ScalarType) -> Self {
        Self {
            indices: self.indices.cast(index_dtype),
            ..self
        }
    }
}

/// Whether `dtype` can hold every position below `extent` without wrapping
fn holds_positions(dtype: ScalarType, extent: usize) -> bool {
    let max = match dtype {
        ScalarType::I8 => i8::MAX as u64,
        ScalarType::I16 => i16::MAX as u64,
        ScalarType::I32 => i32::MAX as u64,
        ScalarType::I64 => i64::MAX as u64,
        ScalarType::U8 => u8::MAX as u64,
        ScalarType::U16 => u16::MAX as u64,
        ScalarType::U32 => u32::MAX as u64,
        ScalarType::U64 => u64::MAX,
        ScalarType::F32 | ScalarType::F64 => return false,
    };
    extent.saturating_sub(1) as u64 <= max
}

/// Result of `extract_sparse`: compressed when the storage is, dense otherwise
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Dense(DenseBlock),
    Compressed(CompressedBlock),
}

impl Block {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Block::Dense(block) => block.shape().to_vec(),
            Block::Compressed(block) => vec![block.shape().0, block.shape().1],
        }
    }

    pub fn dtype(&self) -> ScalarType {
        match self {
            Block::Dense(block) => block.dtype(),
            Block::Compressed(block) => block.dtype(),
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Block::Compressed(_))
    }

    pub fn as_compressed(&self) -> Option<&CompressedBlock> {
        match self {
            Block::Compressed(block) => Some(block),
            Block::Dense(_) => None,
        }
    }

    pub fn to_dense(&self) -> Result<DenseBlock> {
        match self {
            Block::Dense(block) => Ok(block.clone()),
            Block::Compressed(block) => block.to_dense(),
        }
    }
}

impl From<DenseBlock> for Block {
    fn from(block: DenseBlock) -> Self {
        Block::Dense(block)
    }
}

impl From<CompressedBlock> for Block {
    fn from(block: CompressedBlock) -> Self {
        Block::Compressed(block)
    }
}
