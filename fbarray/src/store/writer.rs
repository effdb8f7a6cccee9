//! Container writer
//!
//! Builds a `.fba` container in memory and writes it out in one pass:
//! header, 8-byte aligned payloads, then the JSON directory. Arrays opened
//! from the result are read-only; this is how containers get authored.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fbarray_core::validation::align_to_8;
use fbarray_core::{
    ArrayData, ArrayEntry, AttrValue, Attributes, ContainerHeader, Directory, Error, GroupEntry,
    Result,
};
use tracing::debug;

use super::StoreBuilder;

/// Accumulates arrays and attributes for a new container file
#[derive(Debug, Default)]
pub struct ContainerWriter {
    directory: Directory,
    payload: Vec<u8>,
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of arrays added so far
    pub fn len(&self) -> usize {
        self.directory.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.arrays.is_empty()
    }

    /// Serialize the container into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let directory = serde_json::to_vec(&self.directory)
            .map_err(|e| Error::CorruptedData(format!("failed to encode directory: {e}")))?;

        let data_offset = ContainerHeader::SIZE as u64;
        let directory_offset = align_to_8(data_offset as usize + self.payload.len()) as u64;

        let mut header = ContainerHeader::new();
        header.entry_count = self.directory.arrays.len() as u64;
        header.data_offset = data_offset;
        header.directory_offset = directory_offset;
        header.directory_size = directory.len() as u64;

        let mut bytes = Vec::with_capacity(directory_offset as usize + directory.len());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes.resize(directory_offset as usize, 0);
        bytes.extend_from_slice(&directory);
        Ok(bytes)
    }

    /// Write the container to `path`, replacing any existing file
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let file = File::create(path)
            .map_err(|e| Error::Io(format!("failed to create {}: {e}", path.display())))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&bytes)
            .and_then(|()| writer.flush())
            .map_err(|e| Error::Io(format!("failed to write {}: {e}", path.display())))?;

        debug!(
            path = %path.display(),
            arrays = self.directory.arrays.len(),
            bytes = bytes.len(),
            "wrote container"
        );
        Ok(())
    }
}

impl StoreBuilder for ContainerWriter {
    fn add_array_chunked(
        &mut self,
        name: &str,
        shape: &[usize],
        chunk_shape: Option<&[usize]>,
        data: ArrayData,
    ) -> Result<()> {
        if self.directory.array(name).is_some() {
            return Err(Error::ShapeMismatch(format!("array {name} added twice")));
        }

        // Payload offsets are absolute; the payload region starts right after the header
        let start = align_to_8(self.payload.len());
        self.payload.resize(start, 0);
        self.payload.extend_from_slice(data.as_bytes());

        let entry = ArrayEntry {
            name: name.into(),
            dtype: data.scalar_type(),
            shape: shape.iter().map(|&extent| extent as u64).collect(),
            chunks: chunk_shape.map(|chunks| chunks.iter().map(|&extent| extent as u64).collect()),
            offset: (ContainerHeader::SIZE + start) as u64,
            size: data.as_bytes().len() as u64,
            attrs: Attributes::new(),
        };
        // Same checks the reader applies, against a file that ends here
        let end = entry.offset + entry.size;
        if let Err(e) = entry.validate(end) {
            self.payload.truncate(start);
            return Err(e);
        }
        self.directory.arrays.push(entry);
        Ok(())
    }

    fn set_attr(&mut self, name: &str, key: &str, value: AttrValue) -> Result<()> {
        let attrs = if let Some(entry) = self.directory.arrays.iter_mut().find(|a| a.name == name) {
            &mut entry.attrs
        } else {
            let index = match self.directory.groups.iter().position(|g| g.name == name) {
                Some(index) => index,
                None => {
                    self.directory.groups.push(GroupEntry {
                        name: name.into(),
                        attrs: Attributes::new(),
                    });
                    self.directory.groups.len() - 1
                }
            };
            &mut self.directory.groups[index].attrs
        };
        attrs.insert(key.into(), value);
        Ok(())
    }
}
