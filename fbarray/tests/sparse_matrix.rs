mod common;

use common::{stepped, write_fixture, Reference};
use fbarray::{
    BackedArray, BackedOptions, CompressedSparseMatrix, ContainerStore, CountingStore, Error,
    ExtractArray, Layout, ScalarType, Selector, SparseOptions,
};

fn counting(path: &std::path::Path) -> CountingStore<ContainerStore> {
    CountingStore::new(ContainerStore::open(path).unwrap())
}

#[test]
fn test_csc_matches_reference() {
    let reference = Reference::random(100, 80, 0.1, 7);
    let fixture = write_fixture(&reference, true);
    let matrix = CompressedSparseMatrix::open(&fixture.path, "X", SparseOptions::new()).unwrap();

    assert!(matrix.by_column());
    assert_eq!((matrix.nrows(), matrix.ncols()), (100, 80));
    assert_eq!(matrix.path(), Some(fixture.path.as_path()));
    assert_eq!(matrix.descriptor().layout, Layout::CompressedByColumn);

    let rows = vec![99, 0, 42, 42, 17];
    let cols = stepped(5, 75, 4);
    let block = matrix
        .extract_dense(&[Selector::list(rows.clone()), Selector::list(cols.clone())])
        .unwrap();
    assert_eq!(block.shape(), &[rows.len(), cols.len()]);
    assert_eq!(block.to_vec::<i32>(), reference.select(&rows, &cols));
}

#[test]
fn test_csr_contiguous_and_strided() {
    let reference = Reference::random(100, 200, 0.15, 11);
    let fixture = write_fixture(&reference, false);
    let matrix = CompressedSparseMatrix::open(&fixture.path, "X", SparseOptions::new()).unwrap();

    let contiguous = matrix
        .extract_dense(&[Selector::range(10, 80), Selector::range(50, 150)])
        .unwrap();
    let rows: Vec<usize> = (10..80).collect();
    let cols: Vec<usize> = (50..150).collect();
    assert_eq!(contiguous.shape(), &[70, 100]);
    assert_eq!(contiguous.to_vec::<i32>(), reference.select(&rows, &cols));

    let strided = matrix
        .extract_dense(&[
            Selector::step(10, 80, 2).unwrap(),
            Selector::step(50, 150, 3).unwrap(),
        ])
        .unwrap();
    assert_eq!(
        strided.to_vec::<i32>(),
        reference.select(&stepped(10, 80, 2), &stepped(50, 150, 3))
    );
}

#[test]
fn test_unordered_selection_on_both_axes() {
    let reference = Reference::random(100, 200, 0.15, 13);
    let fixture = write_fixture(&reference, false);
    let matrix = CompressedSparseMatrix::open(&fixture.path, "X", SparseOptions::new()).unwrap();

    let rows = vec![70, 3, 3, 15];
    let cols = vec![40, 2, 2, 199, 17];
    let block = matrix
        .extract_sparse(&[Selector::list(rows.clone()), Selector::list(cols.clone())])
        .unwrap();
    assert!(block.is_compressed());
    assert_eq!(
        block.to_dense().unwrap().to_vec::<i32>(),
        reference.select(&rows, &cols)
    );
}

#[test]
fn test_output_types() {
    let reference = Reference::random(55, 45, 0.2, 3);
    let fixture = write_fixture(&reference, false);
    let options = SparseOptions::new()
        .with_dtype(ScalarType::I16)
        .with_index_dtype(ScalarType::U8);
    let matrix = CompressedSparseMatrix::open(&fixture.path, "X", options).unwrap();
    assert_eq!(matrix.dtype(), ScalarType::I16);
    assert_eq!(matrix.index_dtype(), ScalarType::U8);

    let block = matrix
        .extract_compressed(&[Selector::range(5, 50), Selector::step(0, 45, 2).unwrap()])
        .unwrap();
    assert_eq!(block.dtype(), ScalarType::I16);
    assert_eq!(block.index_dtype(), ScalarType::U8);

    let rows: Vec<usize> = (5..50).collect();
    let expected: Vec<i16> = reference
        .select(&rows, &stepped(0, 45, 2))
        .into_iter()
        .map(|v| v as i16)
        .collect();
    assert_eq!(block.to_dense().unwrap().to_vec::<i16>(), expected);
}

#[test]
fn test_sparse_agrees_with_dense_storage() {
    let reference = Reference::random(60, 40, 0.2, 21);
    let fixture = write_fixture(&reference, true);
    let sparse = BackedArray::open(&fixture.path, "X", BackedOptions::new()).unwrap();
    let dense = BackedArray::open(&fixture.path, "dense", BackedOptions::new()).unwrap();
    assert!(sparse.is_sparse());
    assert!(!dense.is_sparse());
    assert_eq!(sparse.shape(), dense.shape());

    for selectors in [
        vec![Selector::range(0, 60), Selector::range(0, 40)],
        vec![Selector::list(vec![59, 1, 30]), Selector::step(3, 40, 5).unwrap()],
        vec![Selector::All, Selector::list(vec![0, 0, 39])],
    ] {
        assert_eq!(
            sparse.extract_dense(&selectors).unwrap(),
            dense.extract_dense(&selectors).unwrap()
        );
    }
}

#[test]
fn test_contiguous_primary_is_one_read_per_array() {
    let reference = Reference::random(100, 200, 0.15, 5);
    let fixture = write_fixture(&reference, false);
    let matrix =
        CompressedSparseMatrix::from_store(counting(&fixture.path), "X", SparseOptions::new())
            .unwrap();

    matrix
        .extract_compressed(&[Selector::range(10, 80), Selector::list(vec![7, 3])])
        .unwrap();
    let store = matrix.store().unwrap();
    assert_eq!(store.counts(matrix.indptr_name()).slab, 1);
    assert_eq!(store.counts(matrix.data_name()).slab, 1);
    assert_eq!(store.counts(matrix.indices_name()).slab, 1);
    assert_eq!(store.total_reads(), 3);
}

#[test]
fn test_csc_contiguous_columns_are_one_read_per_array() {
    let reference = Reference::random(120, 90, 0.15, 31);
    let fixture = write_fixture(&reference, true);
    let matrix =
        CompressedSparseMatrix::from_store(counting(&fixture.path), "X", SparseOptions::new())
            .unwrap();

    let rows = vec![100, 4, 57];
    let block = matrix
        .extract_dense(&[Selector::list(rows.clone()), Selector::range(20, 70)])
        .unwrap();
    let cols: Vec<usize> = (20..70).collect();
    assert_eq!(block.to_vec::<i32>(), reference.select(&rows, &cols));

    let store = matrix.store().unwrap();
    assert_eq!(store.counts(matrix.indptr_name()).slab, 1);
    assert_eq!(store.counts(matrix.data_name()).slab, 1);
    assert_eq!(store.counts(matrix.indices_name()).slab, 1);
    assert_eq!(store.total_reads(), 3);
}

#[test]
fn test_csc_scattered_columns_read_once_per_run() {
    let reference = Reference::random(120, 90, 0.15, 31);
    let fixture = write_fixture(&reference, true);
    let matrix =
        CompressedSparseMatrix::from_store(counting(&fixture.path), "X", SparseOptions::new())
            .unwrap();

    // Two runs: 10..=12, 80..=81
    let cols = vec![10, 11, 12, 80, 81];
    let block = matrix
        .extract_dense(&[Selector::All, Selector::list(cols.clone())])
        .unwrap();
    let rows: Vec<usize> = (0..120).collect();
    assert_eq!(block.to_vec::<i32>(), reference.select(&rows, &cols));

    let store = matrix.store().unwrap();
    assert_eq!(store.counts(matrix.indptr_name()).slab, 2);
    assert!(store.counts(matrix.data_name()).slab <= 2);
    assert_eq!(store.counts(matrix.indices_name()).gather, 0);
}

#[test]
fn test_scattered_primary_reads_once_per_run() {
    let reference = Reference::random(100, 200, 0.15, 5);
    let fixture = write_fixture(&reference, false);
    let matrix =
        CompressedSparseMatrix::from_store(counting(&fixture.path), "X", SparseOptions::new())
            .unwrap();

    // Three runs: 3..=5, 20..=21, 60
    let rows = vec![3, 4, 5, 20, 21, 60];
    let block = matrix
        .extract_dense(&[Selector::list(rows.clone()), Selector::All])
        .unwrap();
    let cols: Vec<usize> = (0..200).collect();
    assert_eq!(block.to_vec::<i32>(), reference.select(&rows, &cols));

    let store = matrix.store().unwrap();
    assert_eq!(store.counts(matrix.indptr_name()).slab, 3);
    assert!(store.counts(matrix.data_name()).slab <= 3);
    assert_eq!(
        store.counts(matrix.data_name()),
        store.counts(matrix.indices_name())
    );
}

#[test]
fn test_out_of_bounds_issues_no_reads() {
    let reference = Reference::random(30, 20, 0.2, 9);
    let fixture = write_fixture(&reference, false);
    let matrix =
        CompressedSparseMatrix::from_store(counting(&fixture.path), "X", SparseOptions::new())
            .unwrap();

    assert_eq!(
        matrix.extract_dense(&[Selector::list(vec![0, 30]), Selector::All]),
        Err(Error::IndexOutOfBounds {
            axis: 0,
            index: 30,
            extent: 30
        })
    );
    assert!(matches!(
        matrix.extract_dense(&[Selector::All, Selector::range(15, 21)]),
        Err(Error::IndexOutOfBounds { axis: 1, .. })
    ));
    assert!(matches!(
        matrix.extract_dense(&[Selector::All, Selector::All, Selector::All]),
        Err(Error::TooManySelectors { given: 3, ndim: 2 })
    ));
    assert_eq!(matrix.store().unwrap().total_reads(), 0);
}

#[test]
fn test_empty_selection() {
    let reference = Reference::random(30, 20, 0.2, 9);
    let fixture = write_fixture(&reference, false);
    let matrix =
        CompressedSparseMatrix::from_store(counting(&fixture.path), "X", SparseOptions::new())
            .unwrap();

    let block = matrix
        .extract_compressed(&[Selector::list(vec![]), Selector::All])
        .unwrap();
    assert_eq!(block.shape(), (0, 20));
    assert_eq!(block.nnz(), 0);
    assert_eq!(block.indptr(), &[0]);
    assert_eq!(matrix.store().unwrap().total_reads(), 0);

    let block = matrix
        .extract_dense(&[Selector::range(2, 6), Selector::list(vec![])])
        .unwrap();
    assert_eq!(block.shape(), &[4, 0]);
    assert!(block.is_empty());
}

#[test]
fn test_extraction_is_repeatable() {
    let reference = Reference::random(50, 50, 0.3, 17);
    let fixture = write_fixture(&reference, true);
    let matrix = CompressedSparseMatrix::open(&fixture.path, "X", SparseOptions::new()).unwrap();

    let selectors = [Selector::list(vec![9, 2, 44]), Selector::step(1, 50, 7).unwrap()];
    let first = matrix.extract_compressed(&selectors).unwrap();
    let second = matrix.extract_compressed(&selectors).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_csc_missing_column_selector_selects_all() {
    let reference = Reference::random(100, 80, 0.1, 29);
    let fixture = write_fixture(&reference, true);
    let matrix = CompressedSparseMatrix::open(&fixture.path, "X", SparseOptions::new()).unwrap();

    let block = matrix.extract_dense(&[Selector::range(5, 10)]).unwrap();
    assert_eq!(block.shape(), &[5, 80]);
    let rows: Vec<usize> = (5..10).collect();
    let cols: Vec<usize> = (0..80).collect();
    assert_eq!(block.to_vec::<i32>(), reference.select(&rows, &cols));
}

#[test]
fn test_shape_override_and_closed_handle() {
    let reference = Reference::random(30, 20, 0.2, 1);
    let fixture = write_fixture(&reference, false);

    // An indptr that disagrees with the declared primary extent is rejected
    let options = SparseOptions::new().with_shape(31, 20);
    assert!(matches!(
        CompressedSparseMatrix::open(&fixture.path, "X", options),
        Err(Error::UnsupportedLayout(_))
    ));

    let mut matrix =
        CompressedSparseMatrix::open(&fixture.path, "X", SparseOptions::new().with_shape(30, 20))
            .unwrap();
    matrix.close();
    assert_eq!(
        matrix.extract_compressed(&[Selector::All]),
        Err(Error::UseAfterClose)
    );
}
