use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

use super::AppState;
use crate::error::DocGateError;
use crate::token::TokenError;

#[derive(Deserialize)]
pub struct ViewRequest {
    pub principal_id: String,
}

#[derive(Serialize)]
pub struct ViewResponse {
    /// Relative URL carrying the capability pair; valid until `expires_at`.
    pub view_url: String,
    pub expires_at: i64,
}

/// Issue a short-lived capability URL for one file. Restricted to callers
/// presenting the service key; the capability pair it returns is what grants
/// access, so minting must not be open to the world.
pub async fn issue_view_token(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ViewRequest>,
) -> impl Responder {
    if !state.is_authenticated_caller(&req) {
        return HttpResponse::Forbidden().json(json!({ "error": "service key required" }));
    }

    let resource_id = path.into_inner();
    let issued = match state.tokens.issue(&resource_id, &body.principal_id) {
        Ok(issued) => issued,
        Err(e) => {
            log::error!("Token issuance for '{}' failed: {}", resource_id, e);
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "token issuance failed" }));
        }
    };

    // Token and signature are URL-safe base64 and hex, safe to embed as-is.
    HttpResponse::Ok().json(ViewResponse {
        view_url: format!(
            "/api/files/{}/stream?token={}&sig={}",
            resource_id, issued.token, issued.sig
        ),
        expires_at: issued.expires_at,
    })
}

/// Stream a file's bytes to a holder of a valid capability pair.
///
/// The pair is the entire proof; no other authentication applies here. Bytes
/// are forwarded chunk by chunk, never buffered whole. Response headers
/// force inline display and forbid caching.
pub async fn stream_file(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let resource_id = path.into_inner();

    let token = match query.get("token") {
        Some(token) => token.as_str(),
        None => return token_failure(TokenError::MissingParameter("token")),
    };
    let sig = match query.get("sig") {
        Some(sig) => sig.as_str(),
        None => return token_failure(TokenError::MissingParameter("sig")),
    };

    if let Err(e) = state.tokens.validate(token, sig, &resource_id) {
        log::info!("Rejected stream request for '{}': {}", resource_id, e);
        return token_failure(e);
    }

    match state.source.fetch_object(&resource_id).await {
        Ok(object) => {
            let mut builder = HttpResponse::Ok();
            builder
                .insert_header((header::CONTENT_TYPE, object.content_type))
                .insert_header((header::CONTENT_DISPOSITION, "inline"))
                .insert_header((
                    header::CACHE_CONTROL,
                    "no-store, no-cache, must-revalidate, private",
                ))
                .insert_header((header::PRAGMA, "no-cache"))
                .insert_header((header::EXPIRES, "0"))
                .insert_header(("X-Content-Type-Options", "nosniff"))
                .insert_header(("X-Frame-Options", "DENY"));
            if let Some(len) = object.content_length {
                builder.no_chunking(len);
            }
            builder.streaming(object.stream)
        }
        Err(DocGateError::NotFound(msg)) => HttpResponse::NotFound().json(json!({ "error": msg })),
        Err(e) => {
            log::error!("Upstream fetch for '{}' failed: {}", resource_id, e);
            HttpResponse::BadGateway().json(json!({ "error": "upstream fetch failed" }))
        }
    }
}

/// Each validation failure keeps its own status so a client can distinguish
/// a stale link (410) from a forged or mismatched one (403).
fn token_failure(error: TokenError) -> HttpResponse {
    let body = json!({ "error": error.to_string() });
    match error {
        TokenError::MissingParameter(_) | TokenError::MalformedPayload => {
            HttpResponse::BadRequest().json(body)
        }
        TokenError::SignatureMismatch | TokenError::ResourceMismatch => {
            HttpResponse::Forbidden().json(body)
        }
        TokenError::Expired => HttpResponse::Gone().json(body),
    }
}
