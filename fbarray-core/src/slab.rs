//! Row-major addressing for hyperslab and gather reads
//!
//! Stores hold each array as one flat row-major payload. These helpers turn
//! a per-axis request into flat element positions, after checking it against
//! the array shape, so every store answers reads the same way.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use crate::{Error, Result};

fn check_rank(shape: &[usize], given: usize) -> Result<()> {
    if given != shape.len() {
        return Err(Error::ShapeMismatch(format!(
            "{given} axis requests for an array of rank {}",
            shape.len()
        )));
    }
    Ok(())
}

pub(crate) fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Advance a multi-index over `extents`; returns false once exhausted
pub(crate) fn advance(counter: &mut [usize], extents: &[usize]) -> bool {
    for axis in (0..counter.len()).rev() {
        counter[axis] += 1;
        if counter[axis] < extents[axis] {
            return true;
        }
        counter[axis] = 0;
    }
    false
}

/// Flat element spans covered by a hyperslab, in row-major order
///
/// Adjacent spans are merged, so a slab that covers whole trailing axes
/// comes back as a single span.
pub fn slab_spans(shape: &[usize], ranges: &[Range<usize>]) -> Result<Vec<Range<usize>>> {
    check_rank(shape, ranges.len())?;
    for (axis, (range, &extent)) in ranges.iter().zip(shape).enumerate() {
        if range.end > extent {
            return Err(Error::IndexOutOfBounds {
                axis,
                index: range.end - 1,
                extent,
            });
        }
        if range.start > range.end {
            return Err(Error::InvalidSelector(format!(
                "reversed range {}..{} on axis {axis}",
                range.start, range.end
            )));
        }
    }

    let Some((inner, outer)) = ranges.split_last() else {
        return Ok(vec![0..1]);
    };
    if ranges.iter().any(|range| range.is_empty()) {
        return Ok(Vec::new());
    }

    let strides = strides(shape);
    let outer_extents: Vec<usize> = outer.iter().map(|range| range.len()).collect();
    let mut counter = vec![0; outer.len()];
    let mut spans: Vec<Range<usize>> = Vec::new();

    loop {
        let base: usize = counter
            .iter()
            .zip(outer)
            .zip(&strides)
            .map(|((&step, range), &stride)| (range.start + step) * stride)
            .sum();
        let span = base + inner.start..base + inner.end;
        match spans.last_mut() {
            Some(last) if last.end == span.start => last.end = span.end,
            _ => spans.push(span),
        }
        if !advance(&mut counter, &outer_extents) {
            break;
        }
    }
    Ok(spans)
}

/// Flat element positions of the outer product of per-axis index lists
///
/// Every list must be strictly increasing and inside its axis.
pub fn gather_positions(shape: &[usize], indices: &[&[usize]]) -> Result<Vec<usize>> {
    check_rank(shape, indices.len())?;
    for (axis, (list, &extent)) in indices.iter().zip(shape).enumerate() {
        if let Some(&index) = list.iter().find(|&&index| index >= extent) {
            return Err(Error::IndexOutOfBounds {
                axis,
                index,
                extent,
            });
        }
        if !list.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::InvalidSelector(format!(
                "gather coordinates on axis {axis} must be strictly increasing"
            )));
        }
    }

    Ok(product_positions(shape, indices))
}

/// Flat positions of the outer product of per-axis lists, unchecked
///
/// Lists may be unordered or repeat; every entry must lie inside its axis.
pub fn product_positions(shape: &[usize], lists: &[&[usize]]) -> Vec<usize> {
    if shape.is_empty() {
        return vec![0];
    }
    if lists.iter().any(|list| list.is_empty()) {
        return Vec::new();
    }

    let strides = strides(shape);
    let extents: Vec<usize> = lists.iter().map(|list| list.len()).collect();
    let mut counter = vec![0; lists.len()];
    let mut positions = Vec::with_capacity(extents.iter().product());

    loop {
        positions.push(
            counter
                .iter()
                .zip(lists)
                .zip(&strides)
                .map(|((&slot, list), &stride)| list[slot] * stride)
                .sum(),
        );
        if !advance(&mut counter, &extents) {
            break;
        }
    }
    positions
}
