//! Dense arrays and the dense extraction engine
//!
//! A contiguous selection on every axis becomes a single slab read. Any
//! other selection becomes one gather read over the sorted distinct indices
//! per axis, remapped afterwards into the caller's order (so unordered and
//! repeated indices work). With `native_order == false` the logical axes
//! are the physical axes reversed.

use std::path::{Path, PathBuf};

use fbarray_core::slab::product_positions;
use fbarray_core::{
    infer, normalize_selectors, ArrayStore, AxisSelection, Block, DatasetDescriptor, DenseBlock,
    Error, ExtractArray, Layout, LayoutHint, Result, ScalarType, Selector,
};
use tracing::debug;

use crate::config::DenseOptions;
use crate::lifecycle::StoreHandle;
#[cfg(feature = "mmap")]
use crate::store::ContainerStore;

/// Extract a dense block from the physical array `name` of shape `physical_shape`
///
/// Every selector is validated before the first read.
pub fn extract_dense_block<S: ArrayStore + ?Sized>(
    store: &S,
    name: &str,
    physical_shape: &[usize],
    selectors: &[Selector],
    dtype: ScalarType,
    native_order: bool,
) -> Result<DenseBlock> {
    let logical_shape = oriented(physical_shape, native_order);
    let mut selections = normalize_selectors(selectors, &logical_shape)?;
    if !native_order {
        selections.reverse();
    }
    let out_shape: Vec<usize> = selections.iter().map(AxisSelection::len).collect();

    let block = if selections.iter().any(AxisSelection::is_empty) {
        DenseBlock::zeros(out_shape, dtype)
    } else if let Some(ranges) = selections
        .iter()
        .map(AxisSelection::as_range)
        .collect::<Option<Vec<_>>>()
    {
        debug!(array = name, ?ranges, "planned dense slab read");
        DenseBlock::new(out_shape, store.read_slab(name, &ranges)?.cast(dtype))?
    } else {
        let plans: Vec<_> = selections.iter().map(AxisSelection::sorted_unique).collect();
        let unique: Vec<&[usize]> = plans.iter().map(|plan| plan.unique.as_slice()).collect();
        debug!(
            array = name,
            gathered = ?unique.iter().map(|u| u.len()).collect::<Vec<_>>(),
            "planned dense gather read"
        );
        let gathered = store.read_gather(name, &unique)?;

        let in_order = plans
            .iter()
            .all(|plan| plan.slots.iter().enumerate().all(|(i, &slot)| i == slot));
        let values = if in_order {
            gathered
        } else {
            let gathered_shape: Vec<usize> = unique.iter().map(|u| u.len()).collect();
            let slots: Vec<&[usize]> = plans.iter().map(|plan| plan.slots.as_slice()).collect();
            gathered.take(&product_positions(&gathered_shape, &slots))
        };
        DenseBlock::new(out_shape, values.cast(dtype))?
    };

    Ok(if native_order {
        block
    } else {
        block.reversed_axes()
    })
}

fn oriented(shape: &[usize], native_order: bool) -> Vec<usize> {
    if native_order {
        shape.to_vec()
    } else {
        shape.iter().rev().copied().collect()
    }
}

/// A dense array backed by a store
#[derive(Debug)]
pub struct DenseArray<S> {
    handle: StoreHandle<S>,
    descriptor: DatasetDescriptor,
    dtype: ScalarType,
    native_order: bool,
    path: Option<PathBuf>,
}

#[cfg(feature = "mmap")]
impl DenseArray<ContainerStore> {
    /// Open the dense array `name` of a container file
    pub fn open<P: AsRef<Path>>(path: P, name: &str, options: DenseOptions) -> Result<Self> {
        let store = ContainerStore::open(&path)?;
        let mut array = Self::from_store(store, name, options)?;
        array.set_path(path.as_ref().to_path_buf());
        Ok(array)
    }
}

impl<S: ArrayStore> DenseArray<S> {
    /// Take ownership of `store` and describe the array `name` in it
    pub fn from_store(store: S, name: &str, options: DenseOptions) -> Result<Self> {
        let descriptor = infer(&store, name, &LayoutHint::default())?;
        Self::from_descriptor(store, descriptor, options)
    }

    pub(crate) fn from_descriptor(
        store: S,
        descriptor: DatasetDescriptor,
        options: DenseOptions,
    ) -> Result<Self> {
        if descriptor.layout != Layout::Dense {
            return Err(Error::UnsupportedLayout(format!(
                "{} is stored compressed, not dense",
                descriptor.name
            )));
        }
        debug!(
            array = %descriptor.name,
            shape = ?descriptor.shape,
            dtype = %descriptor.scalar_type,
            native_order = options.native_order,
            "opened dense array"
        );
        Ok(Self {
            handle: StoreHandle::new(store, descriptor.name.clone()),
            dtype: options.dtype.unwrap_or(descriptor.scalar_type),
            native_order: options.native_order,
            descriptor,
            path: None,
        })
    }

    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Container path, `None` when built from an arbitrary store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn native_order(&self) -> bool {
        self.native_order
    }

    /// Stored scalar type, before any output cast
    pub fn stored_dtype(&self) -> ScalarType {
        self.descriptor.scalar_type
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
}

impl<S: ArrayStore> ExtractArray for DenseArray<S> {
    fn shape(&self) -> Vec<usize> {
        oriented(&self.descriptor.shape, self.native_order)
    }

    fn dtype(&self) -> ScalarType {
        self.dtype
    }

    fn chunk_shape(&self) -> Vec<usize> {
        oriented(&self.descriptor.chunk_shape, self.native_order)
    }

    fn extract_dense(&self, selectors: &[Selector]) -> Result<DenseBlock> {
        extract_dense_block(
            self.handle.get()?,
            &self.descriptor.name,
            &self.descriptor.shape,
            selectors,
            self.dtype,
            self.native_order,
        )
    }

    fn extract_sparse(&self, selectors: &[Selector]) -> Result<Block> {
        self.extract_dense(selectors).map(Block::Dense)
    }
}
