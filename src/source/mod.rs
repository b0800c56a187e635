//! External collaborator interfaces: the hierarchical-storage listing API and
//! the object-byte-stream fetch API.
//!
//! Both are opaque to the core; this module only specifies the shape of data
//! read from them (id, name, parent id, attribute sets, byte stream). The
//! production implementation talks HTTP; the `mock` feature provides an
//! in-memory source for tests and local development.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::access::AccessMetadata;
use crate::error::{DocGateError, DocGateResult};

pub mod http;
#[cfg(feature = "mock")]
pub mod mock;

pub use http::HttpSource;
#[cfg(feature = "mock")]
pub use mock::MockSource;

/// A folder as reported by the external listing API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalFolder {
    pub external_id: String,
    pub name: String,
    /// External id of the parent, `None` for a configured root.
    pub parent_external_id: Option<String>,
    /// The attributes declared directly on this folder. Empty fields inherit
    /// during sync.
    #[serde(default)]
    pub metadata: AccessMetadata,
}

/// Bytes flowing back from the external object store.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, DocGateError>> + Send>>;

/// An opened object read: headers worth forwarding plus the body stream.
pub struct ObjectStream {
    pub content_type: String,
    pub content_length: Option<u64>,
    pub stream: ByteStream,
}

/// The external hierarchical-storage and object-fetch APIs.
#[async_trait]
pub trait ExternalSource: Send + Sync {
    /// List the immediate child folders of `parent_external_id`.
    async fn list_child_folders(
        &self,
        parent_external_id: &str,
    ) -> DocGateResult<Vec<ExternalFolder>>;

    /// Open a byte stream for the object with the given external id.
    async fn fetch_object(&self, external_id: &str) -> DocGateResult<ObjectStream>;
}
