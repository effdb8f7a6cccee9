//! Runtime-typed element buffers
//!
//! [`ArrayData`] is what every store read returns and what blocks carry.
//! Casting between variants follows Rust `as` semantics (through
//! [`num_traits::AsPrimitive`]): integer narrowing wraps, float to integer
//! truncates toward zero and saturates, NaN becomes zero. No range checks.

use alloc::format;
use alloc::vec::Vec;
use core::ops::Range;

use num_traits::AsPrimitive;

use crate::format::ScalarType;
use crate::traits::Element;
use crate::validation::validate_array_bounds;
use crate::{Error, Result};

/// A typed, owned buffer of scalar values
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Run an expression against the inner vector of any variant
macro_rules! with_values {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::I8($v) => $body,
            ArrayData::I16($v) => $body,
            ArrayData::I32($v) => $body,
            ArrayData::I64($v) => $body,
            ArrayData::U8($v) => $body,
            ArrayData::U16($v) => $body,
            ArrayData::U32($v) => $body,
            ArrayData::U64($v) => $body,
            ArrayData::F32($v) => $body,
            ArrayData::F64($v) => $body,
        }
    };
}

/// Like `with_values!`, rewrapping the result in the same variant
macro_rules! map_values {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::I8($v) => ArrayData::I8($body),
            ArrayData::I16($v) => ArrayData::I16($body),
            ArrayData::I32($v) => ArrayData::I32($body),
            ArrayData::I64($v) => ArrayData::I64($body),
            ArrayData::U8($v) => ArrayData::U8($body),
            ArrayData::U16($v) => ArrayData::U16($body),
            ArrayData::U32($v) => ArrayData::U32($body),
            ArrayData::U64($v) => ArrayData::U64($body),
            ArrayData::F32($v) => ArrayData::F32($body),
            ArrayData::F64($v) => ArrayData::F64($body),
        }
    };
}

/// Cast every element of a buffer to `$target` with `as` semantics
macro_rules! cast_values {
    ($data:expr, $target:ty) => {
        with_values!($data, v => v.into_iter().map(AsPrimitive::<$target>::as_).collect::<Vec<$target>>())
    };
}

impl ArrayData {
    /// Zero-filled buffer of the given type
    pub fn zeros(dtype: ScalarType, len: usize) -> Self {
        match dtype {
            ScalarType::I8 => ArrayData::I8(alloc::vec![0; len]),
            ScalarType::I16 => ArrayData::I16(alloc::vec![0; len]),
            ScalarType::I32 => ArrayData::I32(alloc::vec![0; len]),
            ScalarType::I64 => ArrayData::I64(alloc::vec![0; len]),
            ScalarType::U8 => ArrayData::U8(alloc::vec![0; len]),
            ScalarType::U16 => ArrayData::U16(alloc::vec![0; len]),
            ScalarType::U32 => ArrayData::U32(alloc::vec![0; len]),
            ScalarType::U64 => ArrayData::U64(alloc::vec![0; len]),
            ScalarType::F32 => ArrayData::F32(alloc::vec![0.0; len]),
            ScalarType::F64 => ArrayData::F64(alloc::vec![0.0; len]),
        }
    }

    pub fn empty(dtype: ScalarType) -> Self {
        Self::zeros(dtype, 0)
    }

    /// Decode a little-endian payload; alignment of `bytes` does not matter
    pub fn from_le_bytes(dtype: ScalarType, bytes: &[u8]) -> Result<Self> {
        validate_array_bounds(dtype, bytes.len())?;
        Ok(match dtype {
            ScalarType::I8 => ArrayData::I8(bytemuck::pod_collect_to_vec(bytes)),
            ScalarType::I16 => ArrayData::I16(bytemuck::pod_collect_to_vec(bytes)),
            ScalarType::I32 => ArrayData::I32(bytemuck::pod_collect_to_vec(bytes)),
            ScalarType::I64 => ArrayData::I64(bytemuck::pod_collect_to_vec(bytes)),
            ScalarType::U8 => ArrayData::U8(bytes.to_vec()),
            ScalarType::U16 => ArrayData::U16(bytemuck::pod_collect_to_vec(bytes)),
            ScalarType::U32 => ArrayData::U32(bytemuck::pod_collect_to_vec(bytes)),
            ScalarType::U64 => ArrayData::U64(bytemuck::pod_collect_to_vec(bytes)),
            ScalarType::F32 => ArrayData::F32(bytemuck::pod_collect_to_vec(bytes)),
            ScalarType::F64 => ArrayData::F64(bytemuck::pod_collect_to_vec(bytes)),
        })
    }

    /// Raw bytes of the buffer in native (little-endian) order
    pub fn as_bytes(&self) -> &[u8] {
        with_values!(self, v => bytemuck::cast_slice(v.as_slice()))
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ArrayData::I8(_) => ScalarType::I8,
            ArrayData::I16(_) => ScalarType::I16,
            ArrayData::I32(_) => ScalarType::I32,
            ArrayData::I64(_) => ScalarType::I64,
            ArrayData::U8(_) => ScalarType::U8,
            ArrayData::U16(_) => ScalarType::U16,
            ArrayData::U32(_) => ScalarType::U32,
            ArrayData::U64(_) => ScalarType::U64,
            ArrayData::F32(_) => ScalarType::F32,
            ArrayData::F64(_) => ScalarType::F64,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element-wise cast to another scalar type
    pub fn cast(self, dtype: ScalarType) -> Self {
        if self.scalar_type() == dtype {
            return self;
        }
        match dtype {
            ScalarType::I8 => ArrayData::I8(cast_values!(self, i8)),
            ScalarType::I16 => ArrayData::I16(cast_values!(self, i16)),
            ScalarType::I32 => ArrayData::I32(cast_values!(self, i32)),
            ScalarType::I64 => ArrayData::I64(cast_values!(self, i64)),
            ScalarType::U8 => ArrayData::U8(cast_values!(self, u8)),
            ScalarType::U16 => ArrayData::U16(cast_values!(self, u16)),
            ScalarType::U32 => ArrayData::U32(cast_values!(self, u32)),
            ScalarType::U64 => ArrayData::U64(cast_values!(self, u64)),
            ScalarType::F32 => ArrayData::F32(cast_values!(self, f32)),
            ScalarType::F64 => ArrayData::F64(cast_values!(self, f64)),
        }
    }

    /// Consume into a concrete vector, casting if needed
    pub fn into_vec<T: Element>(self) -> Vec<T> {
        T::vec_from_data(self)
    }

    /// Copy out as a concrete vector, casting if needed
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        T::vec_from_data(self.clone())
    }

    /// Borrow the values when the buffer already holds `T`
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice_of(self)
    }

    /// Single value widened to f64
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        with_values!(self, v => v.get(index).map(|&x| AsPrimitive::<f64>::as_(x)))
    }

    /// Values at the given positions, in order
    ///
    /// Panics if a position is out of range.
    pub fn take(&self, positions: &[usize]) -> Self {
        map_values!(self, v => positions.iter().map(|&p| v[p]).collect())
    }

    /// Copy of a contiguous sub-range
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Self {
        map_values!(self, v => v[range].to_vec())
    }

    /// Append another buffer of the same type
    pub fn append(&mut self, other: ArrayData) -> Result<()> {
        let found = other.scalar_type();
        match (self, other) {
            (ArrayData::I8(a), ArrayData::I8(b)) => a.extend(b),
            (ArrayData::I16(a), ArrayData::I16(b)) => a.extend(b),
            (ArrayData::I32(a), ArrayData::I32(b)) => a.extend(b),
            (ArrayData::I64(a), ArrayData::I64(b)) => a.extend(b),
            (ArrayData::U8(a), ArrayData::U8(b)) => a.extend(b),
            (ArrayData::U16(a), ArrayData::U16(b)) => a.extend(b),
            (ArrayData::U32(a), ArrayData::U32(b)) => a.extend(b),
            (ArrayData::U64(a), ArrayData::U64(b)) => a.extend(b),
            (ArrayData::F32(a), ArrayData::F32(b)) => a.extend(b),
            (ArrayData::F64(a), ArrayData::F64(b)) => a.extend(b),
            (this, _) => {
                return Err(Error::TypeMismatch {
                    expected: this.scalar_type().name(),
                    found,
                })
            }
        }
        Ok(())
    }

    /// Write `values` into a zero-initialized buffer of length `len` at `positions`
    pub fn scatter(&self, positions: &[usize], len: usize) -> Result<Self> {
        if positions.len() != self.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} positions for {} values",
                positions.len(),
                self.len()
            )));
        }
        if let Some(&bad) = positions.iter().find(|&&p| p >= len) {
            return Err(Error::CorruptedData(format!(
                "scatter position {bad} outside buffer of {len}"
            )));
        }
        let mut out = Self::zeros(self.scalar_type(), len);
        match (&mut out, self) {
            (ArrayData::I8(o), ArrayData::I8(v)) => scatter_into(o, v, positions),
            (ArrayData::I16(o), ArrayData::I16(v)) => scatter_into(o, v, positions),
            (ArrayData::I32(o), ArrayData::I32(v)) => scatter_into(o, v, positions),
            (ArrayData::I64(o), ArrayData::I64(v)) => scatter_into(o, v, positions),
            (ArrayData::U8(o), ArrayData::U8(v)) => scatter_into(o, v, positions),
            (ArrayData::U16(o), ArrayData::U16(v)) => scatter_into(o, v, positions),
            (ArrayData::U32(o), ArrayData::U32(v)) => scatter_into(o, v, positions),
            (ArrayData::U64(o), ArrayData::U64(v)) => scatter_into(o, v, positions),
            (ArrayData::F32(o), ArrayData::F32(v)) => scatter_into(o, v, positions),
            (ArrayData::F64(o), ArrayData::F64(v)) => scatter_into(o, v, positions),
            _ => unreachable!("zeros() keeps the source scalar type"),
        }
        Ok(out)
    }

    /// Interpret an integer buffer as non-negative positions
    pub fn to_positions(&self) -> Result<Vec<usize>> {
        macro_rules! positions {
            ($v:expr) => {
                $v.iter()
                    .map(|&x| {
                        usize::try_from(x).map_err(|_| {
                            Error::CorruptedData(format!("invalid stored position {x}"))
                        })
                    })
                    .collect()
            };
        }
        match self {
            ArrayData::I8(v) => positions!(v),
            ArrayData::I16(v) => positions!(v),
            ArrayData::I32(v) => positions!(v),
            ArrayData::I64(v) => positions!(v),
            ArrayData::U8(v) => positions!(v),
            ArrayData::U16(v) => positions!(v),
            ArrayData::U32(v) => positions!(v),
            ArrayData::U64(v) => positions!(v),
            ArrayData::F32(_) | ArrayData::F64(_) => Err(Error::TypeMismatch {
                expected: "an integer type",
                found: self.scalar_type(),
            }),
        }
    }
}

fn scatter_into<T: Copy>(out: &mut [T], values: &[T], positions: &[usize]) {
    for (&p, &value) in positions.iter().zip(values) {
        out[p] = value;
    }
}

impl<T: Element> From<Vec<T>> for ArrayData {
    fn from(values: Vec<T>) -> Self {
        T::vec_into_data(values)
    }
}
