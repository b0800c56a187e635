use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use super::AppState;
use crate::access::Principal;

/// The unfiltered folder tree of every group, keyed by group id. Admin-only.
pub async fn full_tree(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if !state.is_admin(&req) {
        return HttpResponse::Forbidden().json(json!({ "error": "admin key required" }));
    }

    let mut trees = serde_json::Map::new();
    for group in &state.groups {
        match state.promoter.full_tree(&group.group_id) {
            Ok(tree) => {
                trees.insert(
                    group.group_id.clone(),
                    serde_json::to_value(tree).unwrap_or_default(),
                );
            }
            Err(e) => {
                log::error!("Failed to assemble tree for group '{}': {}", group.group_id, e);
                return HttpResponse::InternalServerError()
                    .json(json!({ "error": e.to_string() }));
            }
        }
    }
    HttpResponse::Ok().json(trees)
}

/// The folder tree as seen by the supplied principal, denied folders removed
/// and their visible descendants promoted.
pub async fn visible_tree(
    state: web::Data<AppState>,
    principal: web::Json<Principal>,
) -> impl Responder {
    let principal = principal.into_inner();

    let mut trees = serde_json::Map::new();
    for group in &state.groups {
        match state.promoter.visible_tree(&group.group_id, &principal) {
            Ok(tree) => {
                trees.insert(
                    group.group_id.clone(),
                    serde_json::to_value(tree).unwrap_or_default(),
                );
            }
            Err(e) => {
                log::error!("Failed to assemble tree for group '{}': {}", group.group_id, e);
                return HttpResponse::InternalServerError()
                    .json(json!({ "error": e.to_string() }));
            }
        }
    }
    HttpResponse::Ok().json(trees)
}
