//! Memory-mapped container store
//!
//! This module opens `.fba` container files read-only through a memory map
//! and serves slab and gather reads straight out of the mapped payloads.

use std::fmt;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

use fbarray_core::format::constants::ALIGNMENT_BOUNDARY;
use fbarray_core::slab::{gather_positions, slab_spans};
use fbarray_core::validation::{validate_region, validate_typed_len};
use fbarray_core::{
    ArrayData, ArrayEntry, ArrayInfo, ArrayStore, Attributes, ContainerHeader, Directory, Error,
    Result,
};
use hashbrown::HashMap;
use memmap2::{Mmap, MmapOptions};
use tracing::{debug, trace};

/// Read-only view of a `.fba` container file
///
/// The mapping stays alive for as long as the store does; dropping the
/// store releases it.
pub struct ContainerStore {
    mmap: Mmap,
    header: ContainerHeader,
    path: PathBuf,
    arrays: HashMap<String, ArrayEntry>,
    groups: HashMap<String, Attributes>,
}

impl ContainerStore {
    /// Map a container file and validate its header and directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(|e| Error::Io(format!("failed to open {}: {e}", path.display())))?;

        // SAFETY: Read-only mapping; every region is bounds-checked below
        // before it is sliced
        let mmap = unsafe {
            MmapOptions::new()
                .map(&file)
                .map_err(|e| Error::Io(format!("failed to map {}: {e}", path.display())))?
        };

        let header = ContainerHeader::from_bytes(&mmap)?;
        let file_len = mmap.len() as u64;

        let directory = match header.directory_region() {
            Some((offset, size)) => {
                validate_region(offset, size, file_len)?;
                let bytes = &mmap[offset as usize..(offset + size) as usize];
                serde_json::from_slice::<Directory>(bytes)
                    .map_err(|e| Error::CorruptedData(format!("unreadable directory: {e}")))?
            }
            None => Directory::default(),
        };

        if directory.arrays.len() as u64 != header.entry_count {
            return Err(Error::CorruptedData(format!(
                "header declares {} arrays, directory lists {}",
                header.entry_count,
                directory.arrays.len()
            )));
        }

        let mut arrays = HashMap::with_capacity(directory.arrays.len());
        for entry in directory.arrays {
            entry.validate(file_len)?;
            if entry.offset < header.data_offset {
                return Err(Error::CorruptedData(format!(
                    "array {} payload starts at {}, before the data region at {}",
                    entry.name, entry.offset, header.data_offset
                )));
            }
            if entry.offset % ALIGNMENT_BOUNDARY as u64 != 0 {
                return Err(Error::CorruptedData(format!(
                    "array {} payload is not {ALIGNMENT_BOUNDARY}-byte aligned",
                    entry.name
                )));
            }
            let name = entry.name.clone();
            if arrays.insert(name, entry).is_some() {
                return Err(Error::CorruptedData("duplicate array name in directory".into()));
            }
        }
        let groups = directory
            .groups
            .into_iter()
            .map(|group| (group.name, group.attrs))
            .collect::<HashMap<_, _>>();

        debug!(
            path = %path.display(),
            arrays = arrays.len(),
            groups = groups.len(),
            "opened container"
        );

        Ok(Self {
            mmap,
            header,
            path,
            arrays,
            groups,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn array_names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    fn entry(&self, name: &str) -> Result<&ArrayEntry> {
        self.arrays
            .get(name)
            .ok_or_else(|| Error::MissingArray(name.into()))
    }

    /// Payload bytes of an entry; offsets were validated at open
    fn payload(&self, entry: &ArrayEntry) -> &[u8] {
        let start = entry.offset as usize;
        &self.mmap[start..start + entry.size as usize]
    }
}

impl fmt::Debug for ContainerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerStore")
            .field("path", &self.path)
            .field("bytes", &self.mmap.len())
            .field("arrays", &self.arrays.len())
            .field("groups", &self.groups.len())
            .finish()
    }
}

impl ArrayStore for ContainerStore {
    fn array_info(&self, name: &str) -> Result<Option<ArrayInfo>> {
        self.arrays
            .get(name)
            .map(|entry| {
                Ok(ArrayInfo {
                    shape: entry.shape_usize()?,
                    scalar_type: entry.dtype,
                    chunk_shape: entry.chunks_usize()?,
                })
            })
            .transpose()
    }

    fn attributes(&self, name: &str) -> Result<Option<Attributes>> {
        Ok(match self.arrays.get(name) {
            Some(entry) => Some(entry.attrs.clone()),
            None => self.groups.get(name).cloned(),
        })
    }

    fn read_slab(&self, name: &str, ranges: &[Range<usize>]) -> Result<ArrayData> {
        let entry = self.entry(name)?;
        let spans = slab_spans(&entry.shape_usize()?, ranges)?;
        let size = entry.dtype.size_bytes();
        let payload = self.payload(entry);
        trace!(array = name, spans = spans.len(), "container slab read");

        match spans.as_slice() {
            [] => Ok(ArrayData::empty(entry.dtype)),
            [span] => ArrayData::from_le_bytes(entry.dtype, &payload[span.start * size..span.end * size]),
            _ => {
                let total: usize = spans.iter().map(|span| span.len()).sum();
                let mut bytes = Vec::with_capacity(validate_typed_len(entry.dtype, total)?);
                for span in &spans {
                    bytes.extend_from_slice(&payload[span.start * size..span.end * size]);
                }
                ArrayData::from_le_bytes(entry.dtype, &bytes)
            }
        }
    }

    fn read_gather(&self, name: &str, indices: &[&[usize]]) -> Result<ArrayData> {
        let entry = self.entry(name)?;
        let positions = gather_positions(&entry.shape_usize()?, indices)?;
        let size = entry.dtype.size_bytes();
        let payload = self.payload(entry);
        trace!(array = name, elements = positions.len(), "container gather read");

        let mut bytes = Vec::with_capacity(validate_typed_len(entry.dtype, positions.len())?);
        for position in positions {
            let start = position * size;
            bytes.extend_from_slice(&payload[start..start + size]);
        }
        ArrayData::from_le_bytes(entry.dtype, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContainerWriter, StoreBuilder};
    use fbarray_core::{AttrValue, ScalarType};
    use std::io::Write;

    fn write_fixture(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("fixture.fba");
        let mut writer = ContainerWriter::new();
        writer
            .add_array_chunked(
                "grid",
                &[3, 4],
                Some(&[1, 4]),
                ArrayData::F64((0..12).map(|v| v as f64).collect()),
            )
            .unwrap();
        writer
            .add_array("labels", &[3], ArrayData::U8(vec![7, 8, 9]))
            .unwrap();
        writer.set_attr("meta", "kind", AttrValue::from("demo")).unwrap();
        writer.write_to(&path).unwrap();
        path
    }

    #[test]
    fn test_open_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContainerStore::open(write_fixture(&dir)).unwrap();

        let info = store.array_info("grid").unwrap().unwrap();
        assert_eq!(info.shape, vec![3, 4]);
        assert_eq!(info.scalar_type, ScalarType::F64);
        assert_eq!(info.chunk_shape, Some(vec![1, 4]));

        assert_eq!(
            store.read_slab("grid", &[1..3, 2..4]).unwrap(),
            ArrayData::F64(vec![6.0, 7.0, 10.0, 11.0])
        );
        let rows: &[usize] = &[0, 2];
        let cols: &[usize] = &[1];
        assert_eq!(
            store.read_gather("grid", &[rows, cols]).unwrap(),
            ArrayData::F64(vec![1.0, 9.0])
        );
        assert_eq!(store.read_all("labels").unwrap(), ArrayData::U8(vec![7, 8, 9]));
        assert_eq!(
            store.attributes("meta").unwrap().unwrap()["kind"].as_str(),
            Some("demo")
        );
        assert_eq!(store.header().entry_count, 2);
    }

    #[test]
    fn test_read_bounds_checked() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContainerStore::open(write_fixture(&dir)).unwrap();
        assert!(matches!(
            store.read_slab("grid", &[0..4, 0..1]),
            Err(Error::IndexOutOfBounds { axis: 0, .. })
        ));
        assert!(matches!(
            store.read_slab("missing", &[0..1]),
            Err(Error::MissingArray(_))
        ));
    }

    #[test]
    fn test_rejects_payload_inside_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlap.fba");

        let directory = Directory {
            arrays: vec![ArrayEntry {
                name: "a".into(),
                dtype: ScalarType::U8,
                shape: vec![8],
                chunks: None,
                offset: 0,
                size: 8,
                attrs: Attributes::new(),
            }],
            groups: Vec::new(),
        };
        let json = serde_json::to_vec(&directory).unwrap();

        let mut header = ContainerHeader::new();
        header.entry_count = 1;
        header.data_offset = ContainerHeader::SIZE as u64;
        header.directory_offset = ContainerHeader::SIZE as u64 + 8;
        header.directory_size = json.len() as u64;

        let mut bytes = header.as_bytes().to_vec();
        bytes.extend_from_slice(&[1u8; 8]);
        bytes.extend_from_slice(&json);
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            ContainerStore::open(&path),
            Err(Error::CorruptedData(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.fba");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0u8; 128]).unwrap();
        drop(file);
        assert_eq!(ContainerStore::open(&path).err(), Some(Error::InvalidHeader));

        assert!(matches!(
            ContainerStore::open(dir.path().join("absent.fba")),
            Err(Error::Io(_))
        ));
    }
}
