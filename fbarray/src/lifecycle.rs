//! Ownership of the open store handle
//!
//! An array owns exactly one [`StoreHandle`]. Closing releases the store
//! immediately; closing again is a no-op, and any extraction afterwards
//! fails with [`Error::UseAfterClose`]. Dropping an open handle closes it.

use fbarray_core::{Error, Result};
use tracing::trace;

/// Exclusively owned, explicitly releasable store handle
#[derive(Debug)]
pub struct StoreHandle<S> {
    store: Option<S>,
    label: String,
}

impl<S> StoreHandle<S> {
    pub fn new(store: S, label: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            label: label.into(),
        }
    }

    /// The open store, or `UseAfterClose` once released
    pub fn get(&self) -> Result<&S> {
        self.store.as_ref().ok_or(Error::UseAfterClose)
    }

    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    /// Release the store; returns whether this call did the releasing
    pub fn close(&mut self) -> bool {
        match self.store.take() {
            Some(store) => {
                drop(store);
                trace!(array = %self.label, "released store handle");
                true
            }
            None => false,
        }
    }
}

impl<S> Drop for StoreHandle<S> {
    fn drop(&mut self) {
        self.close();
    }
}
