//! Index normalization
//!
//! Callers describe what they want along each axis with a [`Selector`].
//! Before any engine touches the store, every selector is expanded against
//! its axis extent into an [`AxisSelection`]: a concrete, bounds-checked
//! index list that also records whether it is contiguous, which is what
//! lets the engines pick one ranged read over a gather.

use alloc::format;
use alloc::vec::Vec;
use core::ops::{Range, RangeFull};
use core::str::FromStr;

use crate::{Error, Result};

/// Caller-facing description of the indices wanted along one axis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    /// Every index of the axis
    #[default]
    All,
    /// `start, start + step, ...` up to but excluding `stop`
    Range {
        start: usize,
        stop: usize,
        step: usize,
    },
    /// Explicit indices, possibly unordered or repeated
    List(Vec<usize>),
}

impl Selector {
    /// Unit-step range `start..stop`
    pub fn range(start: usize, stop: usize) -> Self {
        Selector::Range {
            start,
            stop,
            step: 1,
        }
    }

    /// Strided range; a zero step is rejected
    pub fn step(start: usize, stop: usize, step: usize) -> Result<Self> {
        if step == 0 {
            return Err(Error::InvalidSelector("range step must be positive".into()));
        }
        Ok(Selector::Range { start, stop, step })
    }

    pub fn list(indices: impl Into<Vec<usize>>) -> Self {
        Selector::List(indices.into())
    }
}

impl From<Range<usize>> for Selector {
    fn from(range: Range<usize>) -> Self {
        Selector::range(range.start, range.end)
    }
}

impl From<RangeFull> for Selector {
    fn from(_: RangeFull) -> Self {
        Selector::All
    }
}

impl From<Vec<usize>> for Selector {
    fn from(indices: Vec<usize>) -> Self {
        Selector::List(indices)
    }
}

impl From<&[usize]> for Selector {
    fn from(indices: &[usize]) -> Self {
        Selector::List(indices.to_vec())
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::validation::parse_selector(s)
    }
}

/// A validated, fully expanded selection along one axis
///
/// Built fresh for every extraction call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSelection {
    indices: Vec<usize>,
    extent: usize,
    is_contiguous: bool,
    is_strictly_increasing: bool,
}

impl AxisSelection {
    /// Every index of an axis of the given extent
    pub fn full(extent: usize) -> Self {
        Self {
            indices: (0..extent).collect(),
            extent,
            is_contiguous: true,
            is_strictly_increasing: true,
        }
    }

    fn from_indices(indices: Vec<usize>, extent: usize) -> Self {
        let is_strictly_increasing = indices.windows(2).all(|w| w[0] < w[1]);
        let is_contiguous = indices.windows(2).all(|w| w[1] == w[0] + 1);
        Self {
            indices,
            extent,
            is_contiguous,
            is_strictly_increasing,
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Extent of the axis the selection was normalized against
    pub fn extent(&self) -> usize {
        self.extent
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Consecutive ascending indices (vacuously true when empty)
    pub fn is_contiguous(&self) -> bool {
        self.is_contiguous
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.is_strictly_increasing
    }

    /// Selection is exactly `0..extent`
    pub fn is_full(&self) -> bool {
        self.is_contiguous && self.indices.len() == self.extent
    }

    /// Covering range when the selection is contiguous
    pub fn as_range(&self) -> Option<Range<usize>> {
        if !self.is_contiguous {
            return None;
        }
        match (self.indices.first(), self.indices.last()) {
            (Some(&first), Some(&last)) => Some(first..last + 1),
            _ => Some(0..0),
        }
    }

    /// Maximal runs of consecutive ascending indices, in selection order
    pub fn runs(&self) -> Runs<'_> {
        Runs {
            indices: &self.indices,
            pos: 0,
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs().count()
    }

    /// Sorted distinct indices plus, for each selected position, its slot in that list
    ///
    /// Gather reads want strictly increasing coordinates; the slot map puts
    /// the gathered values back into the caller's order afterwards.
    pub fn sorted_unique(&self) -> SortedUnique {
        if self.is_strictly_increasing {
            return SortedUnique {
                unique: self.indices.clone(),
                slots: (0..self.indices.len()).collect(),
            };
        }

        let mut unique = self.indices.clone();
        unique.sort_unstable();
        unique.dedup();
        let slots = self
            .indices
            .iter()
            .map(|index| unique.partition_point(|u| u < index))
            .collect();
        SortedUnique { unique, slots }
    }
}

/// Output of [`AxisSelection::sorted_unique`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedUnique {
    pub unique: Vec<usize>,
    pub slots: Vec<usize>,
}

/// Iterator over the contiguous runs of a selection
pub struct Runs<'a> {
    indices: &'a [usize],
    pos: usize,
}

impl Iterator for Runs<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = *self.indices.get(self.pos)?;
        let mut end = start + 1;
        self.pos += 1;
        while self.indices.get(self.pos) == Some(&end) {
            end += 1;
            self.pos += 1;
        }
        Some(start..end)
    }
}

/// Expand and validate one selector against an axis extent
pub fn normalize(selector: &Selector, extent: usize) -> Result<AxisSelection> {
    normalize_axis(selector, extent, 0)
}

/// Normalize one selector per axis; missing trailing selectors mean "everything"
pub fn normalize_selectors(selectors: &[Selector], shape: &[usize]) -> Result<Vec<AxisSelection>> {
    if selectors.len() > shape.len() {
        return Err(Error::TooManySelectors {
            given: selectors.len(),
            ndim: shape.len(),
        });
    }

    shape
        .iter()
        .enumerate()
        .map(|(axis, &extent)| match selectors.get(axis) {
            Some(selector) => normalize_axis(selector, extent, axis),
            None => Ok(AxisSelection::full(extent)),
        })
        .collect()
}

fn normalize_axis(selector: &Selector, extent: usize, axis: usize) -> Result<AxisSelection> {
    match selector {
        Selector::All => Ok(AxisSelection::full(extent)),
        &Selector::Range { start, stop, step } => {
            if step == 0 {
                return Err(Error::InvalidSelector(format!(
                    "zero step on axis {axis}"
                )));
            }
            if start >= stop {
                return Ok(AxisSelection::from_indices(Vec::new(), extent));
            }
            let last = start + (stop - start - 1) / step * step;
            if last >= extent {
                return Err(Error::IndexOutOfBounds {
                    axis,
                    index: last,
                    extent,
                });
            }
            let indices = (start..stop).step_by(step).collect();
            Ok(AxisSelection {
                indices,
                extent,
                is_contiguous: step == 1,
                is_strictly_increasing: true,
            })
        }
        Selector::List(indices) => {
            if let Some(&index) = indices.iter().find(|&&index| index >= extent) {
                return Err(Error::IndexOutOfBounds {
                    axis,
                    index,
                    extent,
                });
            }
            Ok(AxisSelection::from_indices(indices.clone(), extent))
        }
    }
}
