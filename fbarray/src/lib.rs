//! fbarray - chunk-aware random-access extraction from file-backed matrices
//!
//! This library reads rectangular subsets of large matrices that live on
//! disk, dense or compressed-sparse (CSR/CSC), without loading them whole.
//! Each extraction validates every selector first, then issues the fewest
//! physical reads the layout allows.
//!
//! ## Architecture
//!
//! - **fbarray-core**: container format, selection, layout inference and blocks (no I/O)
//! - **fbarray**: stores, the dense and sparse extraction engines, and handles
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fbarray::{BackedArray, BackedOptions, ExtractArray, ScalarType, Selector};
//!
//! fn example() -> fbarray::Result<()> {
//!     let options = BackedOptions::new().with_dtype(ScalarType::F64);
//!     let matrix = BackedArray::open("counts.fba", "X", options)?;
//!
//!     let block = matrix.extract_dense(&[Selector::range(10, 80), Selector::list(vec![3, 1, 4])])?;
//!     println!("{:?} = {:?}", block.shape(), block.get(&[0, 0]));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Memory-mapped containers** (`mmap`, on by default): zero-copy reads of `.fba` files
//! - **Read planning**: one slab read per contiguous selection, one gather otherwise
//! - **Compressed-sparse extraction**: one `indptr` window read per run of primary indices
//! - **Output casting**: value and index types chosen at open

pub use fbarray_core::{
    // Selection
    normalize, normalize_selectors, AxisSelection, Selector,
    // Blocks
    ArrayData, Block, CompressedBlock, DenseBlock,
    // Layout
    infer, DatasetDescriptor, Layout, LayoutHint, StorageArrays,
    // Traits
    ArrayInfo, ArrayStore, Element, ExtractArray,
    // Format
    AttrValue, Attributes, ScalarType,
    // Error handling
    Error, ErrorCategory, Result,
};

pub mod backed;
pub mod config;
pub mod dense;
pub mod lifecycle;
pub mod ndarray_ext;
pub mod sparse;
pub mod store;

pub use backed::BackedArray;
pub use config::{BackedOptions, DenseOptions, SparseOptions};
pub use dense::{extract_dense_block, DenseArray};
pub use lifecycle::StoreHandle;
pub use ndarray_ext::DenseBlockExt;
pub use sparse::{read_primary, CompressedArrays, CompressedSparseMatrix};
#[cfg(feature = "mmap")]
pub use store::ContainerStore;
pub use store::{ContainerWriter, CountingStore, MemoryStore, ReadCounts, StoreBuilder};
