//! `<base>.index`: `chunk_id -> (byte_offset, record_count)` (spec
//! §4.3). A sparse map keyed by a non-contiguous `u32`, so it goes
//! through `serde` + `bincode` rather than the teacher's hand-rolled
//! fixed-stride `chunktab` layout (see DESIGN.md).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GfaError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkIndexEntry {
    pub offset: u64,
    pub record_count: u32,
}

pub type ChunkIndex = BTreeMap<u32, ChunkIndexEntry>;

pub fn write_index(path: &Path, index: &ChunkIndex) -> Result<()> {
    let bytes = bincode::serialize(index)
        .map_err(|e| GfaError::Corruption { detail: format!("failed to serialize chunk index: {e}") })?;
    let mut f = File::create(path)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn read_index(path: &Path) -> Result<ChunkIndex> {
    if !path.exists() {
        return Err(GfaError::MissingSidecar {
            path: path.to_path_buf(),
            kind: "index",
        });
    }
    let mut f = File::open(path)?;
    let mut bytes = Vec::new();
    f.read_to_end(&mut bytes)?;
    bincode::deserialize(&bytes)
        .map_err(|e| GfaError::Corruption { detail: format!("failed to deserialize chunk index: {e}") })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let mut index = ChunkIndex::new();
        index.insert(1, ChunkIndexEntry { offset: 0, record_count: 3 });
        index.insert(2, ChunkIndexEntry { offset: 120, record_count: 5 });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.index");
        write_index(&path, &index).unwrap();
        let read_back = read_index(&path).unwrap();
        assert_eq!(read_back, index);
    }

    #[test]
    fn missing_file_is_missing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.index");
        assert!(matches!(read_index(&path), Err(GfaError::MissingSidecar { .. })));
    }
}
