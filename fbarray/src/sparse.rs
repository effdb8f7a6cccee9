//! Compressed-sparse matrices and the sparse extraction engine
//!
//! The primary-axis selection is split into maximal runs of consecutive
//! indices. Each run costs one read of its `indptr` window plus, when the
//! run holds any entries, one read each of `data` and `indices`; a fully
//! contiguous selection therefore costs a single pair whatever its length.
//! Runs are concatenated in selection order under a freshly accumulated
//! `indptr`, so unordered and repeated primary indices are honored. The
//! secondary selection is then applied in memory.

use std::path::{Path, PathBuf};

use fbarray_core::{
    infer, normalize_selectors, ArrayData, ArrayStore, AxisSelection, Block, CompressedBlock,
    DatasetDescriptor, DenseBlock, Error, ExtractArray, Result, ScalarType, Selector,
    StorageArrays,
};
use tracing::{debug, trace};

use crate::config::SparseOptions;
use crate::lifecycle::StoreHandle;
#[cfg(feature = "mmap")]
use crate::store::ContainerStore;

/// Physical array names of a compressed group
#[derive(Debug, Clone, Copy)]
pub struct CompressedArrays<'a> {
    pub data: &'a str,
    pub indices: &'a str,
    pub indptr: &'a str,
}

/// Read the selected primary elements as a compressed block in stored types
///
/// `secondary_extent` is the full extent of the other axis. The selection
/// must already be normalized against the primary extent.
pub fn read_primary<S: ArrayStore + ?Sized>(
    store: &S,
    arrays: CompressedArrays<'_>,
    primary: &AxisSelection,
    secondary_extent: usize,
    by_column: bool,
) -> Result<CompressedBlock> {
    let data_type = store.require_info(arrays.data)?.scalar_type;
    let index_info = store.require_info(arrays.indices)?;
    let nnz = index_info.len();

    let mut data = ArrayData::empty(data_type);
    let mut indices = ArrayData::empty(index_info.scalar_type);
    let mut indptr = Vec::with_capacity(primary.len() + 1);
    indptr.push(0);

    let runs: Vec<_> = primary.runs().collect();
    debug!(
        array = arrays.data,
        selected = primary.len(),
        runs = runs.len(),
        "planned sparse extraction"
    );

    for run in runs {
        let pointers = store
            .read_slab(arrays.indptr, &[run.start..run.end + 1])?
            .to_positions()?;
        if !pointers.windows(2).all(|w| w[0] <= w[1]) {
            return Err(Error::CorruptedData(format!(
                "{} decreases within {}..{}",
                arrays.indptr, run.start, run.end
            )));
        }
        let (lo, hi) = (pointers[0], pointers[pointers.len() - 1]);
        if hi > nnz {
            return Err(Error::CorruptedData(format!(
                "{} points past {nnz} stored entries",
                arrays.indptr
            )));
        }
        trace!(run = ?run, entries = hi - lo, "compressed run");

        if hi > lo {
            data.append(store.read_slab(arrays.data, &[lo..hi])?)?;
            indices.append(store.read_slab(arrays.indices, &[lo..hi])?)?;
        }
        let mut end = indptr[indptr.len() - 1];
        for window in pointers.windows(2) {
            end += window[1] - window[0];
            indptr.push(end);
        }
    }

    let shape = if by_column {
        (secondary_extent, primary.len())
    } else {
        (primary.len(), secondary_extent)
    };
    CompressedBlock::new(shape, by_column, data, indices, indptr)
}

/// A CSR- or CSC-style matrix backed by a store
#[derive(Debug)]
pub struct CompressedSparseMatrix<S> {
    handle: StoreHandle<S>,
    descriptor: DatasetDescriptor,
    data_name: String,
    indices_name: String,
    indptr_name: String,
    dtype: ScalarType,
    index_dtype: ScalarType,
    path: Option<PathBuf>,
}

#[cfg(feature = "mmap")]
impl CompressedSparseMatrix<ContainerStore> {
    /// Open the compressed group `group` of a container file
    pub fn open<P: AsRef<Path>>(path: P, group: &str, options: SparseOptions) -> Result<Self> {
        let store = ContainerStore::open(&path)?;
        let mut matrix = Self::from_store(store, group, options)?;
        matrix.set_path(path.as_ref().to_path_buf());
        Ok(matrix)
    }
}

impl<S: ArrayStore> CompressedSparseMatrix<S> {
    /// Take ownership of `store` and describe the group `group` in it
    pub fn from_store(store: S, group: &str, options: SparseOptions) -> Result<Self> {
        let descriptor = infer(&store, group, &options.hint())?;
        Self::from_descriptor(store, descriptor, options)
    }

    pub(crate) fn from_descriptor(
        store: S,
        descriptor: DatasetDescriptor,
        options: SparseOptions,
    ) -> Result<Self> {
        options.validate()?;
        let (data_name, indices_name, indptr_name) = match &descriptor.arrays {
            StorageArrays::Compressed {
                data,
                indices,
                indptr,
            } => (data.clone(), indices.clone(), indptr.clone()),
            StorageArrays::Dense { .. } => {
                return Err(Error::UnsupportedLayout(format!(
                    "{} is a dense array, not a compressed group",
                    descriptor.name
                )))
            }
        };
        let stored_index_type = descriptor.index_type.unwrap_or(ScalarType::I64);

        debug!(
            group = %descriptor.name,
            layout = ?descriptor.layout,
            shape = ?descriptor.shape,
            nnz = ?descriptor.nnz,
            "opened compressed matrix"
        );
        Ok(Self {
            handle: StoreHandle::new(store, descriptor.name.clone()),
            dtype: options.dtype.unwrap_or(descriptor.scalar_type),
            index_dtype: options.index_dtype.unwrap_or(stored_index_type),
            descriptor,
            data_name,
            indices_name,
            indptr_name,
            path: None,
        })
    }

    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    pub fn nrows(&self) -> usize {
        self.descriptor.shape[0]
    }

    pub fn ncols(&self) -> usize {
        self.descriptor.shape[1]
    }

    /// Column-compressed when true
    pub fn by_column(&self) -> bool {
        self.descriptor.layout.by_column().unwrap_or(false)
    }

    /// Stored entry count
    pub fn nnz(&self) -> usize {
        self.descriptor.nnz.unwrap_or(0)
    }

    pub fn index_dtype(&self) -> ScalarType {
        self.index_dtype
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn group_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    pub fn indices_name(&self) -> &str {
        &self.indices_name
    }

    pub fn indptr_name(&self) -> &str {
        &self.indptr_name
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    pub fn store(&self) -> Result<&S> {
        self.handle.get()
    }

    pub fn is_closed(&self) -> bool {
        !self.handle.is_open()
    }

    /// Release the store; later extractions fail with `UseAfterClose`
    pub fn close(&mut self) {
        self.handle.close();
    }

    /// Extract `(rows, cols)` as a compressed block in the output types
    ///
    /// Both selectors are validated before the first read. A missing
    /// selector selects the whole axis.
    pub fn extract_compressed(&self, selectors: &[Selector]) -> Result<CompressedBlock> {
        Ok(self.extract_selected(selectors)?.cast_indices(self.index_dtype))
    }

    /// Selected block with output values and positions wide enough for the
    /// selection; the output index cast is left to the caller
    fn extract_selected(&self, selectors: &[Selector]) -> Result<CompressedBlock> {
        let store = self.handle.get()?;
        let selections = normalize_selectors(selectors, &self.descriptor.shape)?;
        let (primary, secondary) = if self.by_column() {
            (&selections[1], &selections[0])
        } else {
            (&selections[0], &selections[1])
        };

        let arrays = CompressedArrays {
            data: &self.data_name,
            indices: &self.indices_name,
            indptr: &self.indptr_name,
        };
        let block = read_primary(store, arrays, primary, secondary.extent(), self.by_column())?;

        let block = if secondary.is_full() {
            block
        } else {
            block.select_secondary(secondary)?
        };
        Ok(block.cast(self.dtype))
    }
}

impl<S: ArrayStore> ExtractArray for CompressedSparseMatrix<S> {
    fn shape(&self) -> Vec<usize> {
        self.descriptor.shape.clone()
    }

    fn dtype(&self) -> ScalarType {
        self.dtype
    }

    fn chunk_shape(&self) -> Vec<usize> {
        self.descriptor.chunk_shape.clone()
    }

    fn extract_dense(&self, selectors: &[Selector]) -> Result<DenseBlock> {
        self.extract_selected(selectors)?.to_dense()
    }

    fn extract_sparse(&self, selectors: &[Selector]) -> Result<Block> {
        self.extract_compressed(selectors).map(Block::Compressed)
    }

    fn is_sparse(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CountingStore, MemoryStore, StoreBuilder};

    /// 4x5 matrix
    /// [1 0 0 2 0]
    /// [0 0 0 0 0]
    /// [0 3 0 0 4]
    /// [5 0 6 0 0]
    fn store(by_column: bool) -> MemoryStore {
        let csr = CompressedBlock::new(
            (4, 5),
            false,
            ArrayData::F64(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            ArrayData::I32(vec![0, 3, 1, 4, 0, 2]),
            vec![0, 2, 2, 4, 6],
        )
        .unwrap();
        let block = if by_column {
            CompressedBlock::new(
                (4, 5),
                true,
                ArrayData::F64(vec![1.0, 5.0, 3.0, 6.0, 2.0, 4.0]),
                ArrayData::I32(vec![0, 3, 2, 3, 0, 2]),
                vec![0, 2, 3, 4, 5, 6],
            )
            .unwrap()
        } else {
            csr
        };
        let mut store = MemoryStore::new();
        store.add_compressed("m", &block).unwrap();
        store
    }

    #[test]
    fn test_open_reads_metadata() {
        let matrix = CompressedSparseMatrix::from_store(store(false), "m", SparseOptions::new()).unwrap();
        assert_eq!(matrix.shape(), vec![4, 5]);
        assert_eq!(matrix.nnz(), 6);
        assert!(!matrix.by_column());
        assert_eq!(matrix.chunk_shape(), vec![1, 5]);
        assert_eq!(matrix.data_name(), "m/data");
        assert_eq!(matrix.indptr_name(), "m/indptr");
        assert_eq!(matrix.index_dtype(), ScalarType::I32);

        let csc = CompressedSparseMatrix::from_store(store(true), "m", SparseOptions::new()).unwrap();
        assert!(csc.by_column());
        assert_eq!(csc.chunk_shape(), vec![4, 1]);
    }

    #[test]
    fn test_row_and_column_layouts_agree() {
        let csr = CompressedSparseMatrix::from_store(store(false), "m", SparseOptions::new()).unwrap();
        let csc = CompressedSparseMatrix::from_store(store(true), "m", SparseOptions::new()).unwrap();
        let selectors = [Selector::list(vec![3, 0, 2]), Selector::step(0, 5, 2).unwrap()];

        let expected = vec![5.0, 6.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 4.0];
        assert_eq!(csr.extract_dense(&selectors).unwrap().to_vec::<f64>(), expected);
        assert_eq!(csc.extract_dense(&selectors).unwrap().to_vec::<f64>(), expected);
    }

    #[test]
    fn test_contiguous_rows_cost_one_pair() {
        let matrix = CompressedSparseMatrix::from_store(
            CountingStore::new(store(false)),
            "m",
            SparseOptions::new(),
        )
        .unwrap();
        let block = matrix.extract_compressed(&[Selector::range(0, 4)]).unwrap();
        assert_eq!(block.nnz(), 6);

        let counts = matrix.store().unwrap();
        assert_eq!(counts.counts("m/indptr").slab, 1);
        assert_eq!(counts.counts("m/data").slab, 1);
        assert_eq!(counts.counts("m/indices").slab, 1);
    }

    #[test]
    fn test_empty_rows_skip_data_reads() {
        let matrix = CompressedSparseMatrix::from_store(
            CountingStore::new(store(false)),
            "m",
            SparseOptions::new(),
        )
        .unwrap();
        let block = matrix.extract_compressed(&[Selector::list(vec![1])]).unwrap();
        assert_eq!(block.indptr(), &[0, 0]);
        assert_eq!(matrix.store().unwrap().counts("m/data").total(), 0);
    }

    #[test]
    fn test_repeated_primary_indices() {
        let matrix = CompressedSparseMatrix::from_store(store(false), "m", SparseOptions::new()).unwrap();
        let block = matrix
            .extract_compressed(&[Selector::list(vec![2, 2]), Selector::All])
            .unwrap();
        assert_eq!(block.shape(), (2, 5));
        assert_eq!(block.indptr(), &[0, 2, 4]);
        assert_eq!(block.data().to_vec::<f64>(), vec![3.0, 4.0, 3.0, 4.0]);
    }

    #[test]
    fn test_output_types() {
        let options = SparseOptions::new()
            .with_dtype(ScalarType::I16)
            .with_index_dtype(ScalarType::U8);
        let matrix = CompressedSparseMatrix::from_store(store(false), "m", options).unwrap();
        let block = matrix
            .extract_compressed(&[Selector::All, Selector::list(vec![4, 0])])
            .unwrap();
        assert_eq!(block.dtype(), ScalarType::I16);
        assert_eq!(block.index_dtype(), ScalarType::U8);
        assert_eq!(block.indices_as::<u8>(), vec![1, 0, 1]);
        assert_eq!(block.data().to_vec::<i16>(), vec![1, 4, 5]);

        let float_index = SparseOptions::new().with_index_dtype(ScalarType::F64);
        assert!(matches!(
            CompressedSparseMatrix::from_store(store(false), "m", float_index),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_long_secondary_selection_over_narrow_indices() {
        // [0 0 9]
        // [4 0 0]
        let block = CompressedBlock::new(
            (2, 3),
            false,
            ArrayData::F32(vec![9.0, 4.0]),
            ArrayData::U8(vec![2, 0]),
            vec![0, 1, 2],
        )
        .unwrap();
        let mut memory = MemoryStore::new();
        memory.add_compressed("m", &block).unwrap();
        let matrix = CompressedSparseMatrix::from_store(memory, "m", SparseOptions::new()).unwrap();
        assert_eq!(matrix.index_dtype(), ScalarType::U8);

        let mut cols = vec![1usize; 299];
        cols.push(2);
        let dense = matrix
            .extract_dense(&[Selector::All, Selector::list(cols)])
            .unwrap();
        assert_eq!(dense.shape(), &[2, 300]);
        assert_eq!(dense.get(&[0, 299]), Some(9.0));
        assert_eq!(dense.to_vec::<f32>().iter().sum::<f32>(), 9.0);
    }

    #[test]
    fn test_errors_and_close() {
        let mut matrix = CompressedSparseMatrix::from_store(
            CountingStore::new(store(false)),
            "m",
            SparseOptions::new(),
        )
        .unwrap();
        assert!(matches!(
            matrix.extract_sparse(&[Selector::list(vec![4])]),
            Err(Error::IndexOutOfBounds { axis: 0, index: 4, extent: 4 })
        ));
        assert_eq!(matrix.store().unwrap().total_reads(), 0);

        matrix.close();
        assert_eq!(matrix.extract_sparse(&[]), Err(Error::UseAfterClose));
        matrix.close();
    }

    #[test]
    fn test_dense_group_is_rejected() {
        let mut store = MemoryStore::new();
        store.add_array("d", &[2, 2], ArrayData::F32(vec![0.0; 4])).unwrap();
        assert!(matches!(
            CompressedSparseMatrix::from_store(store, "d", SparseOptions::new()),
            Err(Error::UnsupportedLayout(_))
        ));
    }
}
