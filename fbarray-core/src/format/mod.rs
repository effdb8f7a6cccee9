//! Binary container format definitions
//!
//! This module contains pure data structure definitions for the `.fba`
//! container: the fixed header, the scalar type tags and the JSON directory
//! entries. No I/O happens here.

pub mod constants;
pub mod directory;
pub mod header;

pub use directory::{ArrayEntry, AttrValue, Attributes, Directory, GroupEntry};
pub use header::{ContainerHeader, ScalarType};
