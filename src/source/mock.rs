//! In-memory [`ExternalSource`] for tests and local development.

use async_trait::async_trait;
use futures_util::stream;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{ExternalFolder, ExternalSource, ObjectStream};
use crate::access::AccessMetadata;
use crate::error::{DocGateError, DocGateResult};

/// A scripted external hierarchy. Folders are registered parent-first;
/// specific ids can be marked as failing to exercise branch-skip behavior.
#[derive(Default)]
pub struct MockSource {
    children: Mutex<HashMap<String, Vec<ExternalFolder>>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing_folders: Mutex<HashSet<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a folder under `parent_external_id`.
    pub fn add_folder(
        &self,
        parent_external_id: &str,
        external_id: &str,
        name: &str,
        metadata: AccessMetadata,
    ) {
        let folder = ExternalFolder {
            external_id: external_id.to_string(),
            name: name.to_string(),
            parent_external_id: Some(parent_external_id.to_string()),
            metadata,
        };
        self.children
            .lock()
            .expect("mock lock poisoned")
            .entry(parent_external_id.to_string())
            .or_default()
            .push(folder);
    }

    /// Remove a folder (and anything listed beneath it stays orphaned, as a
    /// real listing would report).
    pub fn remove_folder(&self, parent_external_id: &str, external_id: &str) {
        if let Some(list) = self
            .children
            .lock()
            .expect("mock lock poisoned")
            .get_mut(parent_external_id)
        {
            list.retain(|f| f.external_id != external_id);
        }
    }

    pub fn add_object(&self, external_id: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .expect("mock lock poisoned")
            .insert(external_id.to_string(), bytes.to_vec());
    }

    /// Make listings under `external_id` fail with an upstream error.
    pub fn fail_folder(&self, external_id: &str) {
        self.failing_folders
            .lock()
            .expect("mock lock poisoned")
            .insert(external_id.to_string());
    }
}

#[async_trait]
impl ExternalSource for MockSource {
    async fn list_child_folders(
        &self,
        parent_external_id: &str,
    ) -> DocGateResult<Vec<ExternalFolder>> {
        if self
            .failing_folders
            .lock()
            .expect("mock lock poisoned")
            .contains(parent_external_id)
        {
            return Err(DocGateError::Upstream(format!(
                "simulated failure listing {}",
                parent_external_id
            )));
        }
        Ok(self
            .children
            .lock()
            .expect("mock lock poisoned")
            .get(parent_external_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_object(&self, external_id: &str) -> DocGateResult<ObjectStream> {
        let bytes = self
            .objects
            .lock()
            .expect("mock lock poisoned")
            .get(external_id)
            .cloned()
            .ok_or_else(|| {
                DocGateError::NotFound(format!("object {} not found upstream", external_id))
            })?;

        // Chunked so proxy tests exercise more than one poll.
        let chunks: Vec<Result<bytes::Bytes, DocGateError>> = bytes
            .chunks(16)
            .map(|c| Ok(bytes::Bytes::copy_from_slice(c)))
            .collect();

        Ok(ObjectStream {
            content_type: "application/pdf".to_string(),
            content_length: Some(bytes.len() as u64),
            stream: Box::pin(stream::iter(chunks)),
        })
    }
}
