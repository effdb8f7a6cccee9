//! Shared fixtures: seeded reference matrices written to temporary containers

#![allow(dead_code)]

use std::path::PathBuf;

use fbarray::{ArrayData, CompressedBlock, ContainerWriter, StoreBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

/// Row-major dense reference matrix
pub struct Reference {
    pub nrows: usize,
    pub ncols: usize,
    pub values: Vec<i32>,
}

impl Reference {
    /// Random integer matrix with roughly `density` of its cells non-zero
    pub fn random(nrows: usize, ncols: usize, density: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let values = (0..nrows * ncols)
            .map(|_| {
                if rng.gen_bool(density) {
                    rng.gen_range(1..100)
                } else {
                    0
                }
            })
            .collect();
        Self {
            nrows,
            ncols,
            values,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.values[row * self.ncols + col]
    }

    /// Row-major values of the submatrix `rows x cols`
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Vec<i32> {
        rows.iter()
            .flat_map(|&r| cols.iter().map(move |&c| self.get(r, c)))
            .collect()
    }

    /// Compress by row or by column, with `i32` values and the given index buffer builder
    pub fn compress(&self, by_column: bool, indices: fn(Vec<i64>) -> ArrayData) -> CompressedBlock {
        let (primary, secondary) = if by_column {
            (self.ncols, self.nrows)
        } else {
            (self.nrows, self.ncols)
        };
        let mut data = Vec::new();
        let mut minor = Vec::new();
        let mut indptr = vec![0];
        for p in 0..primary {
            for s in 0..secondary {
                let value = if by_column {
                    self.get(s, p)
                } else {
                    self.get(p, s)
                };
                if value != 0 {
                    data.push(value);
                    minor.push(s as i64);
                }
            }
            indptr.push(data.len());
        }
        CompressedBlock::new(
            (self.nrows, self.ncols),
            by_column,
            ArrayData::I32(data),
            indices(minor),
            indptr,
        )
        .expect("reference compression is well formed")
    }
}

pub fn i32_indices(indices: Vec<i64>) -> ArrayData {
    ArrayData::I32(indices.into_iter().map(|i| i as i32).collect())
}

pub fn i64_indices(indices: Vec<i64>) -> ArrayData {
    ArrayData::I64(indices)
}

/// A container file that lives as long as its directory
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

/// Write `reference` as a compressed group `X` and as a dense array `dense`
pub fn write_fixture(reference: &Reference, by_column: bool) -> Fixture {
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = dir.path().join("matrix.fba");

    let mut writer = ContainerWriter::new();
    writer
        .add_compressed("X", &reference.compress(by_column, i32_indices))
        .expect("compressed group");
    writer
        .add_array_chunked(
            "dense",
            &[reference.nrows, reference.ncols],
            Some(&[reference.nrows.min(16), reference.ncols]),
            ArrayData::I32(reference.values.clone()),
        )
        .expect("dense array");
    writer.write_to(&path).expect("container written");
    Fixture { dir, path }
}

/// Expand a strided range into explicit indices
pub fn stepped(start: usize, stop: usize, step: usize) -> Vec<usize> {
    (start..stop).step_by(step).collect()
}
