//! Persisted folder record.
//!
//! The tree is stored as a flat arena keyed by local id with explicit parent
//! pointers instead of embedded child lists; arbitrary depth never nests
//! serialized structures or risks deep recursion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::AccessMetadata;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderRecord {
    /// Local persisted id.
    pub id: Uuid,
    /// Identity in the external store; the reconciliation key.
    pub external_id: String,
    /// Local id of the parent folder; `None` for a node directly under its
    /// group's external root.
    pub parent_id: Option<Uuid>,
    pub name: String,
    /// Which configured external root hierarchy this record belongs to.
    pub group_id: String,
    /// Access attributes as resolved at sync time. Read-time code never
    /// re-walks ancestors; it evaluates visibility against this snapshot.
    pub metadata: AccessMetadata,
    pub synced_at: DateTime<Utc>,
}

impl FolderRecord {
    pub fn new(
        external_id: String,
        parent_id: Option<Uuid>,
        name: String,
        group_id: String,
        metadata: AccessMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id,
            parent_id,
            name,
            group_id,
            metadata,
            synced_at: Utc::now(),
        }
    }
}
