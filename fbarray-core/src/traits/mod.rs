//! Abstract interfaces
//!
//! This module defines the trait abstractions shared by the store
//! implementations and the array types. Traits are pure interfaces; the
//! only implementations here are for primitives and references.

pub mod element;
pub mod extract;
pub mod store;

pub use element::Element;
pub use extract::ExtractArray;
pub use store::{ArrayInfo, ArrayStore};
