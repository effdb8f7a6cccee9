//! Read a subset of a matrix stored in a .fba container
//!
//! ```text
//! cargo run --example read_subset -- [FILE NAME [DTYPE]]
//! ```
//!
//! Without arguments a small demo container is written to a temporary
//! directory first. DTYPE is an output type such as `float32` or `i16`
//! (default `float64`). Set `RUST_LOG=fbarray=trace` to see every read.

use std::time::Instant;

use fbarray::{
    ArrayData, BackedArray, BackedOptions, CompressedBlock, ContainerStore, ContainerWriter,
    CountingStore, ExtractArray, ScalarType, Selector, StoreBuilder,
};
use tracing_subscriber::EnvFilter;

fn write_demo(path: &std::path::Path) -> fbarray::Result<()> {
    // 6x8 matrix with a diagonal band
    let (nrows, ncols) = (6, 8);
    let mut data = Vec::new();
    let mut indices = Vec::new();
    let mut indptr = vec![0];
    for row in 0..nrows {
        for col in row..(row + 3).min(ncols) {
            data.push((10 * row + col) as f32);
            indices.push(col as i32);
        }
        indptr.push(data.len());
    }
    let block = CompressedBlock::new(
        (nrows, ncols),
        false,
        ArrayData::F32(data),
        ArrayData::I32(indices),
        indptr,
    )?;

    let mut writer = ContainerWriter::new();
    writer.add_compressed("X", &block)?;
    writer.write_to(path)
}

fn main() -> fbarray::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let _demo_dir;
    let (path, name) = match args.as_slice() {
        [path, name, ..] => (std::path::PathBuf::from(path), name.clone()),
        _ => {
            let dir = tempfile::tempdir().map_err(|e| fbarray::Error::Io(e.to_string()))?;
            let path = dir.path().join("demo.fba");
            write_demo(&path)?;
            println!("Wrote demo container to '{}'", path.display());
            _demo_dir = dir;
            (path, "X".to_string())
        }
    };

    let dtype = match args.get(2) {
        Some(text) => match ScalarType::from_name(text) {
            Some(dtype) => dtype,
            None => {
                println!("Unknown output type '{text}'");
                return Ok(());
            }
        },
        None => ScalarType::F64,
    };

    let start = Instant::now();
    let store = CountingStore::new(ContainerStore::open(&path)?);
    let matrix = BackedArray::from_store(store, &name, BackedOptions::new().with_dtype(dtype))?;
    println!(
        "Opened '{name}' in {:.3}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    let shape = matrix.shape();
    println!("\nArray Information:");
    println!("   Shape: {shape:?}");
    println!("   Layout: {:?}", matrix.layout());
    println!("   Output type: {}", matrix.dtype());
    println!("   Chunk shape: {:?}", matrix.chunk_shape());

    let half = |extent: usize| Selector::range(extent / 4, extent / 4 + extent.div_ceil(2));
    let selectors: Vec<Selector> = shape.iter().map(|&extent| half(extent)).collect();

    let start = Instant::now();
    let block = matrix.extract_dense(&selectors)?;
    println!(
        "\nExtracted central block {:?} in {:.3}ms",
        block.shape(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    if block.ndim() == 2 {
        for row in 0..block.shape()[0].min(8) {
            let values: Vec<String> = (0..block.shape()[1].min(8))
                .map(|col| format!("{:6.1}", block.get(&[row, col]).unwrap_or_default()))
                .collect();
            println!("   {}", values.join(" "));
        }
    }

    let reads = match &matrix {
        BackedArray::Dense(dense) => dense.store()?.total_reads(),
        BackedArray::Sparse(sparse) => sparse.store()?.total_reads(),
    };
    println!("\nPhysical reads issued: {reads}");
    Ok(())
}
