//! Format constants and well-known names

/// Alignment boundary for every array payload in a container
pub const ALIGNMENT_BOUNDARY: usize = 8;

/// Upper bound on the directory region, guards against corrupt headers
pub const MAX_DIRECTORY_SIZE: u64 = 64 * 1024 * 1024;

/// Separator between a group name and its member arrays
pub const PATH_SEPARATOR: char = '/';

/// Member array names of a compressed-sparse group
pub mod members {
    pub const DATA: &str = "data";
    pub const INDICES: &str = "indices";
    pub const INDPTR: &str = "indptr";
}

/// Attribute keys consulted during layout inference
pub mod attrs {
    /// anndata-style encoding tag, `csr_matrix` or `csc_matrix`
    pub const ENCODING_TYPE: &str = "encoding-type";
    /// anndata-style logical shape
    pub const SHAPE: &str = "shape";
    /// h5sparse-style format tag, `csr` or `csc`
    pub const H5SPARSE_FORMAT: &str = "h5sparse_format";
    /// h5sparse-style logical shape
    pub const H5SPARSE_SHAPE: &str = "h5sparse_shape";

    pub const CSR_ENCODING: &str = "csr_matrix";
    pub const CSC_ENCODING: &str = "csc_matrix";
    pub const CSR_SHORT: &str = "csr";
    pub const CSC_SHORT: &str = "csc";
}
