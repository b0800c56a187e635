//! docgate: access-controlled views over an external folder hierarchy.
//!
//! The crate mirrors externally hosted folder trees into a local sled cache,
//! resolving inherited access attributes at sync time, then serves
//! per-principal filtered views where denied folders vanish and their visible
//! descendants are promoted into place. File bytes are streamed from the
//! upstream store to holders of short-lived HMAC capability tokens.

pub mod access;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod source;
pub mod token;
pub mod tree;

pub use access::{AccessEvaluator, AccessMetadata, Principal};
pub use config::{load_config, AppConfig};
pub use error::{DocGateError, DocGateResult};
pub use server::DocGateHttpServer;
pub use token::{CapabilityClaims, CapabilityToken, CapabilityTokenService, TokenError};
pub use tree::{
    FolderRecord, FolderStore, FolderSyncEngine, SyncReport, TreeFilterPromoter, VisibleNode,
};
