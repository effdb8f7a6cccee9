//! Backing store implementations
//!
//! - [`ContainerStore`]: read-only memory-mapped `.fba` container
//! - [`ContainerWriter`]: authors `.fba` containers
//! - [`MemoryStore`]: named arrays held in memory
//! - [`CountingStore`]: wraps any store and counts physical reads

use fbarray_core::format::constants::{attrs, members};
use fbarray_core::{member_path, ArrayData, AttrValue, CompressedBlock, Result};

#[cfg(feature = "mmap")]
pub mod container;
pub mod counting;
pub mod memory;
pub mod writer;

#[cfg(feature = "mmap")]
pub use container::ContainerStore;
pub use counting::{CountingStore, ReadCounts};
pub use memory::MemoryStore;
pub use writer::ContainerWriter;

/// Trait for destinations that arrays and attributes can be added to
pub trait StoreBuilder {
    /// Add a row-major array, optionally declaring its chunk geometry
    fn add_array_chunked(
        &mut self,
        name: &str,
        shape: &[usize],
        chunk_shape: Option<&[usize]>,
        data: ArrayData,
    ) -> Result<()>;

    /// Attach an attribute to an array, or to a group of that name
    fn set_attr(&mut self, name: &str, key: &str, value: AttrValue) -> Result<()>;

    fn add_array(&mut self, name: &str, shape: &[usize], data: ArrayData) -> Result<()> {
        self.add_array_chunked(name, shape, None, data)
    }

    /// Store a compressed block as a `data`/`indices`/`indptr` group with
    /// anndata-style `encoding-type` and `shape` attributes
    fn add_compressed(&mut self, group: &str, block: &CompressedBlock) -> Result<()> {
        let indptr: Vec<i64> = block.indptr().iter().map(|&offset| offset as i64).collect();
        let nnz = block.nnz();

        self.add_array(&member_path(group, members::DATA), &[nnz], block.data().clone())?;
        self.add_array(&member_path(group, members::INDICES), &[nnz], block.indices().clone())?;
        self.add_array(&member_path(group, members::INDPTR), &[indptr.len()], indptr.into())?;

        let encoding = if block.by_column() {
            attrs::CSC_ENCODING
        } else {
            attrs::CSR_ENCODING
        };
        let (nrows, ncols) = block.shape();
        self.set_attr(group, attrs::ENCODING_TYPE, encoding.into())?;
        self.set_attr(group, attrs::SHAPE, AttrValue::from(&[nrows, ncols][..]))
    }
}
