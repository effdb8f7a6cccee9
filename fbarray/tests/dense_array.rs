mod common;

use std::path::PathBuf;

use common::stepped;
use fbarray::{
    ArrayData, ContainerStore, ContainerWriter, CountingStore, DenseArray, DenseBlockExt,
    DenseOptions, Error, ExtractArray, ScalarType, Selector, StoreBuilder,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

const NROWS: usize = 40;
const NCOLS: usize = 25;

struct Grid {
    _dir: TempDir,
    path: PathBuf,
    values: Vec<f32>,
}

impl Grid {
    fn at(&self, row: usize, col: usize) -> f32 {
        self.values[row * NCOLS + col]
    }

    fn select(&self, rows: &[usize], cols: &[usize]) -> Vec<f32> {
        rows.iter()
            .flat_map(|&r| cols.iter().map(move |&c| self.at(r, c)))
            .collect()
    }
}

/// 40x25 `f32` grid plus a 4x3x5 cube holding `100 * i + 10 * j + k`
fn grid() -> Grid {
    let mut rng = StdRng::seed_from_u64(42);
    let values: Vec<f32> = (0..NROWS * NCOLS)
        .map(|_| rng.gen_range(-500.0f32..500.0))
        .collect();
    let cube: Vec<f64> = (0..4)
        .flat_map(|i| (0..3).flat_map(move |j| (0..5).map(move |k| (100 * i + 10 * j + k) as f64)))
        .collect();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.fba");
    let mut writer = ContainerWriter::new();
    writer
        .add_array_chunked("grid", &[NROWS, NCOLS], Some(&[8, NCOLS]), ArrayData::F32(values.clone()))
        .unwrap();
    writer.add_array("cube", &[4, 3, 5], ArrayData::F64(cube)).unwrap();
    writer.write_to(&path).unwrap();
    Grid {
        _dir: dir,
        path,
        values,
    }
}

#[test]
fn test_native_extraction() {
    let grid = grid();
    let array = DenseArray::open(&grid.path, "grid", DenseOptions::new()).unwrap();
    assert_eq!(array.shape(), vec![NROWS, NCOLS]);
    assert_eq!(array.chunk_shape(), vec![8, NCOLS]);
    assert_eq!(array.dtype(), ScalarType::F32);

    let block = array
        .extract_dense(&[Selector::range(5, 30), Selector::step(1, 25, 4).unwrap()])
        .unwrap();
    let rows: Vec<usize> = (5..30).collect();
    assert_eq!(block.to_vec::<f32>(), grid.select(&rows, &stepped(1, 25, 4)));

    let rows = vec![39, 0, 17, 17];
    let cols = vec![24, 3, 11];
    let block = array
        .extract_dense(&[Selector::list(rows.clone()), Selector::list(cols.clone())])
        .unwrap();
    assert_eq!(block.shape(), &[4, 3]);
    assert_eq!(block.to_vec::<f32>(), grid.select(&rows, &cols));
}

#[test]
fn test_non_native_order_is_transpose() {
    let grid = grid();
    let native = DenseArray::open(&grid.path, "grid", DenseOptions::new()).unwrap();
    let reversed = DenseArray::open(
        &grid.path,
        "grid",
        DenseOptions::new().with_native_order(false),
    )
    .unwrap();
    assert_eq!(reversed.shape(), vec![NCOLS, NROWS]);

    let rows = Selector::list(vec![33, 2, 8]);
    let cols = Selector::step(0, 25, 6).unwrap();
    let forward = native
        .extract_dense(&[rows.clone(), cols.clone()])
        .unwrap()
        .to_array2::<f32>()
        .unwrap();
    let backward = reversed
        .extract_dense(&[cols, rows])
        .unwrap()
        .to_array2::<f32>()
        .unwrap();
    assert_eq!(backward, forward.t());
}

#[test]
fn test_cast_to_narrow_integer() {
    let grid = grid();
    let array = DenseArray::open(
        &grid.path,
        "grid",
        DenseOptions::new().with_dtype(ScalarType::I16),
    )
    .unwrap();
    let block = array
        .extract_dense(&[Selector::range(0, 10), Selector::All])
        .unwrap();
    assert_eq!(block.dtype(), ScalarType::I16);

    let rows: Vec<usize> = (0..10).collect();
    let cols: Vec<usize> = (0..NCOLS).collect();
    let expected: Vec<i16> = grid
        .select(&rows, &cols)
        .into_iter()
        .map(|v| v as i16)
        .collect();
    assert_eq!(block.to_vec::<i16>(), expected);
}

#[test]
fn test_three_dimensional_gather() {
    let grid = grid();
    let store = CountingStore::new(ContainerStore::open(&grid.path).unwrap());
    let cube = DenseArray::from_store(store, "cube", DenseOptions::new()).unwrap();
    assert_eq!(cube.shape(), vec![4, 3, 5]);

    let block = cube
        .extract_dense(&[
            Selector::list(vec![3, 1]),
            Selector::All,
            Selector::list(vec![4, 0]),
        ])
        .unwrap();
    assert_eq!(block.shape(), &[2, 3, 2]);
    assert_eq!(block.get(&[0, 2, 0]), Some(324.0));
    assert_eq!(block.get(&[1, 0, 1]), Some(100.0));

    let counts = cube.store().unwrap().counts("cube");
    assert_eq!((counts.slab, counts.gather), (0, 1));

    // Trailing axes default to everything
    let block = cube.extract_dense(&[Selector::range(2, 3)]).unwrap();
    assert_eq!(block.shape(), &[1, 3, 5]);
    assert_eq!(block.to_ndarray::<f64>().unwrap()[[0, 1, 2]], 212.0);
}

#[test]
fn test_invalid_selections_issue_no_reads() {
    let grid = grid();
    let store = CountingStore::new(ContainerStore::open(&grid.path).unwrap());
    let array = DenseArray::from_store(store, "grid", DenseOptions::new()).unwrap();

    assert_eq!(
        array.extract_dense(&[Selector::list(vec![1, 40])]),
        Err(Error::IndexOutOfBounds {
            axis: 0,
            index: 40,
            extent: 40
        })
    );
    assert!(matches!(
        array.extract_dense(&[Selector::All, Selector::range(20, 26)]),
        Err(Error::IndexOutOfBounds { axis: 1, .. })
    ));
    assert_eq!(array.store().unwrap().total_reads(), 0);

    let empty = array
        .extract_dense(&[Selector::list(vec![]), Selector::range(0, 5)])
        .unwrap();
    assert_eq!(empty.shape(), &[0, 5]);
    assert_eq!(array.store().unwrap().total_reads(), 0);
}

#[test]
fn test_missing_array() {
    let grid = grid();
    assert!(matches!(
        DenseArray::open(&grid.path, "absent", DenseOptions::new()),
        Err(Error::UnsupportedLayout(_))
    ));
}
