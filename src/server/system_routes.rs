use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use super::AppState;

/// Get system status information
pub async fn get_system_status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "running",
        "groups": state.groups.len(),
        "uptime": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
