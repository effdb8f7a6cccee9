//! Validation utilities
//!
//! Pure functions with no I/O dependencies: byte-length and alignment
//! checks for stored payloads, region bounds, and selector text parsing.

pub mod bounds;
pub mod format;
pub mod parsing;

pub use bounds::{validate_array_bounds, validate_typed_len};
pub use format::{align_to_8, align_to_boundary, validate_region};
pub use parsing::parse_selector;
