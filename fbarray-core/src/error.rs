//! Error types for file-backed array operations

use alloc::string::String;

use crate::format::ScalarType;

/// Errors that can occur while describing or extracting from a backed array
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The stored artifact is neither a dense array nor a compressed-sparse triple
    #[error("unsupported storage layout: {0}")]
    UnsupportedLayout(String),
    /// A requested index exceeds the extent of its axis
    #[error("index {index} out of bounds for axis {axis} with extent {extent}")]
    IndexOutOfBounds {
        axis: usize,
        index: usize,
        extent: usize,
    },
    /// More axis selectors than the array has dimensions
    #[error("{given} selectors supplied for an array with {ndim} dimensions")]
    TooManySelectors { given: usize, ndim: usize },
    /// Operation attempted on a released store handle
    #[error("array handle used after close")]
    UseAfterClose,
    /// Selector could not be expanded (zero step, unparsable text)
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    /// Named array or group does not exist in the store
    #[error("array not found: {0}")]
    MissingArray(String),
    /// Scalar type is not usable where it was supplied
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: ScalarType,
    },
    /// Buffer length disagrees with the declared shape
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// Invalid container header
    #[error("invalid container header")]
    InvalidHeader,
    /// Stored structure violates its own invariants
    #[error("corrupted data: {0}")]
    CorruptedData(String),
    /// Byte length is not a multiple of the element size
    #[error("array size not aligned to element size")]
    ArrayAlignment,
    /// Array size calculation would overflow
    #[error("array size calculation would overflow")]
    ArraySizeOverflow,
    /// Failure reported by the underlying file system
    #[error("I/O error: {0}")]
    Io(String),
}

/// Coarse grouping of [`Error`] kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Construction-time layout and type problems
    Layout,
    /// Caller-supplied selections
    Selection,
    /// Handle lifetime misuse
    Lifecycle,
    /// Backing store content or access failures
    Storage,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnsupportedLayout(_) | Error::TypeMismatch { .. } => ErrorCategory::Layout,
            Error::IndexOutOfBounds { .. }
            | Error::TooManySelectors { .. }
            | Error::InvalidSelector(_) => ErrorCategory::Selection,
            Error::UseAfterClose => ErrorCategory::Lifecycle,
            Error::MissingArray(_)
            | Error::ShapeMismatch(_)
            | Error::InvalidHeader
            | Error::CorruptedData(_)
            | Error::ArrayAlignment
            | Error::ArraySizeOverflow
            | Error::Io(_) => ErrorCategory::Storage,
        }
    }
}

/// Result type for file-backed array operations
pub type Result<T> = core::result::Result<T, Error>;
