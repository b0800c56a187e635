//! Unified error handling for the docgate crate.
//!
//! `DocGateError` is the top-level error type surfaced by the store, the sync
//! engine and the HTTP server. Leaf components with a caller-visible error
//! vocabulary of their own (token validation, configuration) define dedicated
//! enums and convert into `DocGateError` at the boundary.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::token::TokenError;

#[derive(Debug)]
pub enum DocGateError {
    Io(io::Error),
    Serde(serde_json::Error),
    Sled(sled::Error),
    Config(ConfigError),
    Token(TokenError),
    /// A failure talking to the external folder/object store.
    Upstream(String),
    /// The requested folder or file does not exist locally.
    NotFound(String),
    /// The caller is not allowed to perform the operation.
    PermissionDenied(String),
    InvalidData(String),
    Database(String),
}

impl fmt::Display for DocGateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocGateError::Io(err) => write!(f, "IO error: {}", err),
            DocGateError::Serde(err) => write!(f, "Serialization error: {}", err),
            DocGateError::Sled(err) => write!(f, "Database error: {}", err),
            DocGateError::Config(err) => write!(f, "Configuration error: {}", err),
            DocGateError::Token(err) => write!(f, "Token error: {}", err),
            DocGateError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            DocGateError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DocGateError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            DocGateError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            DocGateError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DocGateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocGateError::Io(err) => Some(err),
            DocGateError::Serde(err) => Some(err),
            DocGateError::Sled(err) => Some(err),
            DocGateError::Config(err) => Some(err),
            DocGateError::Token(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DocGateError {
    fn from(error: io::Error) -> Self {
        DocGateError::Io(error)
    }
}

impl From<serde_json::Error> for DocGateError {
    fn from(error: serde_json::Error) -> Self {
        DocGateError::Serde(error)
    }
}

impl From<sled::Error> for DocGateError {
    fn from(error: sled::Error) -> Self {
        DocGateError::Sled(error)
    }
}

impl From<ConfigError> for DocGateError {
    fn from(error: ConfigError) -> Self {
        DocGateError::Config(error)
    }
}

impl From<TokenError> for DocGateError {
    fn from(error: TokenError) -> Self {
        DocGateError::Token(error)
    }
}

pub type DocGateResult<T> = Result<T, DocGateError>;
