//! Element type constraints
//!
//! This module defines the trait that ties a Rust primitive to its
//! [`ScalarType`] tag and to the matching [`ArrayData`] variant.

use alloc::vec::Vec;

use crate::data::ArrayData;
use crate::format::ScalarType;

/// Types that can be read out of an array or extracted into
///
/// All element types must be:
/// - Pod: reinterpretable from stored little-endian bytes
/// - Default: the zero used for implicit sparse entries
/// - Send + Sync: shareable across threads with their blocks
pub trait Element:
    bytemuck::Pod + Default + PartialEq + core::fmt::Debug + Send + Sync + 'static
{
    /// Scalar type tag for this element type
    const SCALAR_TYPE: ScalarType;

    /// Consume a buffer, casting with `as` semantics when the variant differs
    fn vec_from_data(data: ArrayData) -> Vec<Self>;

    /// Wrap a vector in the matching variant
    fn vec_into_data(values: Vec<Self>) -> ArrayData;

    /// Borrow the values when the buffer already holds this type
    fn slice_of(data: &ArrayData) -> Option<&[Self]>;

    /// Get the size in bytes of this element type
    fn size_bytes() -> usize {
        core::mem::size_of::<Self>()
    }
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const SCALAR_TYPE: ScalarType = ScalarType::$variant;

                fn vec_from_data(data: ArrayData) -> Vec<Self> {
                    match data.cast(ScalarType::$variant) {
                        ArrayData::$variant(values) => values,
                        _ => Vec::new(),
                    }
                }

                fn vec_into_data(values: Vec<Self>) -> ArrayData {
                    ArrayData::$variant(values)
                }

                fn slice_of(data: &ArrayData) -> Option<&[Self]> {
                    match data {
                        ArrayData::$variant(values) => Some(values),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_element! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}
