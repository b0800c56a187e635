//! Short-lived capability tokens for file access.
//!
//! A token is a URL-safe base64 JSON payload plus a hex HMAC-SHA256 signature
//! over the encoded payload, carried as two query parameters. Holding a valid
//! pair is the entire proof of access; the streaming endpoint re-checks
//! nothing else.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use ring::hmac;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TokenConfig;
use crate::error::DocGateResult;

/// Validation failures, ordered by how far validation got. The HTTP layer
/// maps these onto distinct statuses so a client can tell a stale link from
/// a forged one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("missing query parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("token payload is malformed")]
    MalformedPayload,
    #[error("token signature does not verify")]
    SignatureMismatch,
    #[error("token is bound to a different resource")]
    ResourceMismatch,
    #[error("token has expired")]
    Expired,
}

/// What a token asserts. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityClaims {
    pub resource_id: String,
    pub principal_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// An issued token as it travels on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityToken {
    /// Base64 of the JSON claims.
    pub token: String,
    /// Lowercase hex HMAC-SHA256 over the base64 string.
    pub sig: String,
    /// Expiry copied out of the claims for callers building responses; the
    /// authoritative copy is inside the signed payload.
    pub expires_at: i64,
}

/// Issues and validates capability tokens with a single shared secret.
pub struct CapabilityTokenService {
    key: hmac::Key,
    ttl_secs: u64,
}

impl CapabilityTokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, config.secret.as_bytes()),
            ttl_secs: config.ttl_secs,
        }
    }

    /// Issue a token binding `principal_id` to `resource_id` for the
    /// configured lifetime.
    pub fn issue(&self, resource_id: &str, principal_id: &str) -> DocGateResult<CapabilityToken> {
        self.issue_at(resource_id, principal_id, Utc::now().timestamp())
    }

    /// Issue relative to an explicit clock. Validation with the same clock
    /// makes expiry testable without sleeping.
    pub fn issue_at(
        &self,
        resource_id: &str,
        principal_id: &str,
        now: i64,
    ) -> DocGateResult<CapabilityToken> {
        let claims = CapabilityClaims {
            resource_id: resource_id.to_string(),
            principal_id: principal_id.to_string(),
            issued_at: now,
            expires_at: now + self.ttl_secs as i64,
        };
        // CapabilityClaims has a fixed field order, so the serialized form
        // is stable for a given claims value.
        let json = serde_json::to_vec(&claims)?;
        let token = BASE64.encode(json);
        let tag = hmac::sign(&self.key, token.as_bytes());
        Ok(CapabilityToken {
            sig: hex::encode(tag.as_ref()),
            expires_at: claims.expires_at,
            token,
        })
    }

    /// Validate a presented pair against the current clock.
    pub fn validate(
        &self,
        token: &str,
        sig: &str,
        resource_id: &str,
    ) -> Result<CapabilityClaims, TokenError> {
        self.validate_at(token, sig, resource_id, Utc::now().timestamp())
    }

    /// Checks run in order: signature, then binding, then expiry. The
    /// signature check is constant-time and never inspects the payload
    /// first, so a forged payload learns nothing from the failure mode.
    /// A token remains valid through its `expires_at` instant.
    pub fn validate_at(
        &self,
        token: &str,
        sig: &str,
        resource_id: &str,
        now: i64,
    ) -> Result<CapabilityClaims, TokenError> {
        let sig_bytes = hex::decode(sig).map_err(|_| TokenError::SignatureMismatch)?;
        hmac::verify(&self.key, token.as_bytes(), &sig_bytes)
            .map_err(|_| TokenError::SignatureMismatch)?;

        let json = BASE64
            .decode(token)
            .map_err(|_| TokenError::MalformedPayload)?;
        let claims: CapabilityClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::MalformedPayload)?;

        if claims.resource_id != resource_id {
            return Err(TokenError::ResourceMismatch);
        }
        if now > claims.expires_at {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
