//! In-memory backing store

use std::ops::Range;

use fbarray_core::slab::{gather_positions, slab_spans};
use fbarray_core::{ArrayData, ArrayInfo, ArrayStore, AttrValue, Attributes, Error, Result};
use hashbrown::HashMap;

use super::StoreBuilder;

#[derive(Debug, Clone)]
struct StoredArray {
    shape: Vec<usize>,
    chunk_shape: Option<Vec<usize>>,
    data: ArrayData,
    attrs: Attributes,
}

/// Named arrays and group attributes held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    arrays: HashMap<String, StoredArray>,
    groups: HashMap<String, Attributes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name) || self.groups.contains_key(name)
    }

    pub fn array_names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    fn stored(&self, name: &str) -> Result<&StoredArray> {
        self.arrays
            .get(name)
            .ok_or_else(|| Error::MissingArray(name.into()))
    }
}

impl StoreBuilder for MemoryStore {
    fn add_array_chunked(
        &mut self,
        name: &str,
        shape: &[usize],
        chunk_shape: Option<&[usize]>,
        data: ArrayData,
    ) -> Result<()> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::ShapeMismatch(format!(
                "{} values for array {name} of shape {shape:?}",
                data.len()
            )));
        }
        if let Some(chunks) = chunk_shape {
            if chunks.len() != shape.len() || chunks.contains(&0) {
                return Err(Error::ShapeMismatch(format!(
                    "chunk shape {chunks:?} does not fit array {name}"
                )));
            }
        }
        self.arrays.insert(
            name.into(),
            StoredArray {
                shape: shape.to_vec(),
                chunk_shape: chunk_shape.map(<[usize]>::to_vec),
                data,
                attrs: Attributes::new(),
            },
        );
        Ok(())
    }

    fn set_attr(&mut self, name: &str, key: &str, value: AttrValue) -> Result<()> {
        let attrs = match self.arrays.get_mut(name) {
            Some(array) => &mut array.attrs,
            None => self.groups.entry(name.into()).or_default(),
        };
        attrs.insert(key.into(), value);
        Ok(())
    }
}

impl ArrayStore for MemoryStore {
    fn array_info(&self, name: &str) -> Result<Option<ArrayInfo>> {
        Ok(self.arrays.get(name).map(|array| ArrayInfo {
            shape: array.shape.clone(),
            scalar_type: array.data.scalar_type(),
            chunk_shape: array.chunk_shape.clone(),
        }))
    }

    fn attributes(&self, name: &str) -> Result<Option<Attributes>> {
        Ok(match self.arrays.get(name) {
            Some(array) => Some(array.attrs.clone()),
            None => self.groups.get(name).cloned(),
        })
    }

    fn read_slab(&self, name: &str, ranges: &[Range<usize>]) -> Result<ArrayData> {
        let array = self.stored(name)?;
        let mut spans = slab_spans(&array.shape, ranges)?.into_iter();
        let Some(first) = spans.next() else {
            return Ok(ArrayData::empty(array.data.scalar_type()));
        };
        let mut out = array.data.slice(first);
        for span in spans {
            out.append(array.data.slice(span))?;
        }
        Ok(out)
    }

    fn read_gather(&self, name: &str, indices: &[&[usize]]) -> Result<ArrayData> {
        let array = self.stored(name)?;
        let positions = gather_positions(&array.shape, indices)?;
        Ok(array.data.take(&positions))
    }
}
