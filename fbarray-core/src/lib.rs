#![cfg_attr(not(test), no_std)]

//! fbarray core - layout, selection and block definitions for file-backed matrices
//!
//! This crate provides the I/O-free half of fbarray: the container format
//! definitions, index normalization, layout inference and the in-memory
//! blocks that extraction produces. Stores and engines live in `fbarray`.

extern crate alloc;

pub mod block;
pub mod data;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod selection;
pub mod slab;
pub mod traits;
pub mod validation;

pub use block::{Block, CompressedBlock, DenseBlock};
pub use data::ArrayData;
pub use descriptor::{infer, member_path, DatasetDescriptor, Layout, LayoutHint, StorageArrays};
pub use error::*;
pub use format::*;
pub use selection::{normalize, normalize_selectors, AxisSelection, Selector};
pub use traits::*;
