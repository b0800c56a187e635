use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::error::DocGateError;

/// Optional request body for the sync trigger. Absent body syncs every
/// configured group.
#[derive(Deserialize)]
pub struct SyncRequest {
    pub group_id: Option<String>,
}

/// Trigger a reconciliation run. Admin-only.
pub async fn trigger_sync(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<SyncRequest>>,
) -> impl Responder {
    if !state.is_admin(&req) {
        return HttpResponse::Forbidden().json(json!({ "error": "admin key required" }));
    }

    let group_id = body.and_then(|b| b.into_inner().group_id);
    let result = match group_id {
        Some(group_id) => state.sync.sync_group_id(&group_id).await,
        None => state.sync.sync_all().await,
    };

    match result {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(DocGateError::NotFound(msg)) => HttpResponse::NotFound().json(json!({ "error": msg })),
        Err(e) => {
            log::error!("Sync run failed: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        }
    }
}
