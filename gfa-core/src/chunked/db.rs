//! `<base>.db`: a random-access `node_id -> chunk_id` store (spec
//! §4.3), backed by `sled` — the natural pick among the pack's
//! dependency surface for an embedded, point-get-by-string-key map,
//! and a direct replacement for the original Python's `shelve.open`.

use std::path::Path;

use crate::error::{GfaError, Result};
use crate::model::NodeId;

pub struct ChunkDb {
    tree: sled::Db,
}

impl ChunkDb {
    /// Creates (or replaces) the database at `path` for writing.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            std::fs::remove_dir_all(path).or_else(|_| std::fs::remove_file(path)).ok();
        }
        let tree = sled::open(path).map_err(|e| GfaError::Corruption { detail: format!("failed to create chunk db: {e}") })?;
        Ok(ChunkDb { tree })
    }

    /// Opens an existing database for point lookups; `MissingSidecar`
    /// if it was never written.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GfaError::MissingSidecar {
                path: path.to_path_buf(),
                kind: "db",
            });
        }
        let tree = sled::open(path).map_err(|e| GfaError::Corruption { detail: format!("failed to open chunk db: {e}") })?;
        Ok(ChunkDb { tree })
    }

    pub fn insert(&self, id: &NodeId, chunk_id: u32) -> Result<()> {
        self.tree
            .insert(id.as_str().as_bytes(), &chunk_id.to_le_bytes())
            .map_err(|e| GfaError::Corruption { detail: format!("chunk db write failed: {e}") })?;
        Ok(())
    }

    /// `Ok(None)` means the key is genuinely absent (spec's
    /// `UnknownNode`); `Err` means the lookup itself failed.
    pub fn get(&self, id: &NodeId) -> Result<Option<u32>> {
        let raw = self
            .tree
            .get(id.as_str().as_bytes())
            .map_err(|e| GfaError::Corruption { detail: format!("chunk db read failed: {e}") })?;
        match raw {
            Some(bytes) => {
                let arr: [u8; 4] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| GfaError::Corruption { detail: "chunk db value is not 4 bytes".to_string() })?;
                Ok(Some(u32::from_le_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.tree
            .flush()
            .map_err(|e| GfaError::Corruption { detail: format!("chunk db flush failed: {e}") })?;
        Ok(())
    }

    /// Total key count, used once by the demand-paged graph at open
    /// time to learn `|V|` for BFS's size clamp (spec §4.5) without
    /// holding the whole map in memory.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_lookup_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.db");
        let db = ChunkDb::create(&path).unwrap();
        db.insert(&NodeId::from("A"), 3).unwrap();
        db.flush().unwrap();
        assert_eq!(db.get(&NodeId::from("A")).unwrap(), Some(3));
        assert_eq!(db.get(&NodeId::from("Z")).unwrap(), None);
    }

    #[test]
    fn opening_missing_db_is_missing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        assert!(matches!(ChunkDb::open(&path), Err(GfaError::MissingSidecar { .. })));
    }
}
