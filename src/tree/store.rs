//! sled-backed persistence for folder records.

use std::path::Path;
use uuid::Uuid;

use super::node::FolderRecord;
use crate::error::{DocGateError, DocGateResult};

/// Folder records live in one tree keyed by local id; a second tree indexes
/// external id to local id for reconciliation lookups. Writes flush before
/// returning.
#[derive(Clone)]
pub struct FolderStore {
    folders_tree: sled::Tree,
    external_index_tree: sled::Tree,
}

impl FolderStore {
    pub fn open(path: &Path) -> DocGateResult<Self> {
        let db = sled::open(path)?;
        Self::with_db(&db)
    }

    pub fn with_db(db: &sled::Db) -> DocGateResult<Self> {
        Ok(Self {
            folders_tree: db.open_tree("folders")?,
            external_index_tree: db.open_tree("folders_by_external_id")?,
        })
    }

    /// Insert or replace a record, keeping the external-id index in step.
    pub fn put(&self, record: &FolderRecord) -> DocGateResult<()> {
        let bytes = serde_json::to_vec(record)?;
        self.folders_tree
            .insert(record.id.to_string().as_bytes(), bytes)?;
        self.external_index_tree.insert(
            record.external_id.as_bytes(),
            record.id.to_string().as_bytes(),
        )?;
        self.folders_tree.flush()?;
        self.external_index_tree.flush()?;
        Ok(())
    }

    pub fn get(&self, id: &Uuid) -> DocGateResult<Option<FolderRecord>> {
        match self.folders_tree.get(id.to_string().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_by_external_id(&self, external_id: &str) -> DocGateResult<Option<FolderRecord>> {
        match self.external_index_tree.get(external_id.as_bytes())? {
            Some(id_bytes) => {
                let id_str = String::from_utf8_lossy(&id_bytes).to_string();
                match self.folders_tree.get(id_str.as_bytes())? {
                    Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    /// Remove a record by external id. Returns whether anything existed.
    pub fn remove_by_external_id(&self, external_id: &str) -> DocGateResult<bool> {
        let existed = match self.external_index_tree.remove(external_id.as_bytes())? {
            Some(id_bytes) => {
                let id_str = String::from_utf8_lossy(&id_bytes).to_string();
                self.folders_tree.remove(id_str.as_bytes())?.is_some()
            }
            None => false,
        };
        self.folders_tree.flush()?;
        self.external_index_tree.flush()?;
        Ok(existed)
    }

    /// All persisted records, in unspecified order.
    pub fn list_all(&self) -> DocGateResult<Vec<FolderRecord>> {
        let mut records = Vec::new();
        for result in self.folders_tree.iter() {
            let (_, bytes) = result
                .map_err(|e| DocGateError::Database(format!("folder scan failed: {}", e)))?;
            records.push(serde_json::from_slice(&bytes)?);
        }
        Ok(records)
    }

    /// All persisted records belonging to one group.
    pub fn list_group(&self, group_id: &str) -> DocGateResult<Vec<FolderRecord>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|r| r.group_id == group_id)
            .collect())
    }
}
