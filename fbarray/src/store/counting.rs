//! Read-counting store wrapper
//!
//! Used to verify the I/O plans the engines produce: how many slab and
//! gather reads each named array received.

use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};

use fbarray_core::{ArrayData, ArrayInfo, ArrayStore, Attributes, Result};
use hashbrown::HashMap;
use tracing::trace;

/// Physical reads issued against one array
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCounts {
    pub slab: usize,
    pub gather: usize,
}

impl ReadCounts {
    pub fn total(&self) -> usize {
        self.slab + self.gather
    }
}

/// Store wrapper that counts every read it forwards
#[derive(Debug)]
pub struct CountingStore<S> {
    inner: S,
    counts: Mutex<HashMap<String, ReadCounts>>,
}

impl<S: ArrayStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Reads issued against `name` so far
    pub fn counts(&self, name: &str) -> ReadCounts {
        self.lock().get(name).copied().unwrap_or_default()
    }

    /// Reads issued against every array so far
    pub fn total_reads(&self) -> usize {
        self.lock().values().map(ReadCounts::total).sum()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ReadCounts>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, name: &str, gather: bool) {
        let mut counts = self.lock();
        let entry = counts.entry_ref(name).or_default();
        if gather {
            entry.gather += 1;
        } else {
            entry.slab += 1;
        }
    }
}

impl<S: ArrayStore> ArrayStore for CountingStore<S> {
    fn array_info(&self, name: &str) -> Result<Option<ArrayInfo>> {
        self.inner.array_info(name)
    }

    fn attributes(&self, name: &str) -> Result<Option<Attributes>> {
        self.inner.attributes(name)
    }

    fn read_slab(&self, name: &str, ranges: &[Range<usize>]) -> Result<ArrayData> {
        trace!(array = name, ?ranges, "slab read");
        self.record(name, false);
        self.inner.read_slab(name, ranges)
    }

    fn read_gather(&self, name: &str, indices: &[&[usize]]) -> Result<ArrayData> {
        trace!(array = name, axes = indices.len(), "gather read");
        self.record(name, true);
        self.inner.read_gather(name, indices)
    }
}
