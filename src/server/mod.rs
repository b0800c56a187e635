//! HTTP surface for the docgate service.

pub mod file_routes;
pub mod folder_routes;
pub mod sync_routes;
pub mod system_routes;

use actix_cors::Cors;
use actix_web::{web, App, HttpRequest, HttpServer as ActixHttpServer};
use log::info;
use std::sync::Arc;

use crate::config::{AppConfig, GroupConfig};
use crate::error::DocGateResult;
use crate::source::ExternalSource;
use crate::token::CapabilityTokenService;
use crate::tree::{FolderStore, FolderSyncEngine, TreeFilterPromoter};

/// Shared application state for the HTTP server.
pub struct AppState {
    pub sync: Arc<FolderSyncEngine>,
    pub promoter: Arc<TreeFilterPromoter>,
    pub tokens: Arc<CapabilityTokenService>,
    pub source: Arc<dyn ExternalSource>,
    pub groups: Vec<GroupConfig>,
    admin_key: String,
    api_key: String,
}

impl AppState {
    /// Assemble the component graph from a validated configuration and an
    /// external source implementation.
    pub fn build(config: &AppConfig, source: Arc<dyn ExternalSource>) -> DocGateResult<Self> {
        let store = FolderStore::open(&config.storage_path)?;
        Ok(Self {
            sync: Arc::new(FolderSyncEngine::new(
                store.clone(),
                Arc::clone(&source),
                config.groups.clone(),
            )),
            promoter: Arc::new(TreeFilterPromoter::new(store)),
            tokens: Arc::new(CapabilityTokenService::new(&config.token)),
            source,
            groups: config.groups.clone(),
            admin_key: config.admin_key.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Whether the request carries the privileged-endpoint key.
    pub fn is_admin(&self, req: &HttpRequest) -> bool {
        Self::key_matches(req, "X-Admin-Key", &self.admin_key)
    }

    /// Whether the request carries the service key required to mint
    /// capability tokens.
    pub fn is_authenticated_caller(&self, req: &HttpRequest) -> bool {
        Self::key_matches(req, "X-Api-Key", &self.api_key)
    }

    fn key_matches(req: &HttpRequest, header: &str, expected: &str) -> bool {
        req.headers()
            .get(header)
            .and_then(|v| v.to_str().ok())
            .map(|presented| presented == expected)
            .unwrap_or(false)
    }
}

/// Route table under `/api`. Shared by the server and the route tests.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/sync", web::post().to(sync_routes::trigger_sync))
            .route("/folders/tree", web::get().to(folder_routes::full_tree))
            .route(
                "/folders/visible",
                web::post().to(folder_routes::visible_tree),
            )
            .route(
                "/files/{resource_id}/view",
                web::post().to(file_routes::issue_view_token),
            )
            .route(
                "/files/{resource_id}/stream",
                web::get().to(file_routes::stream_file),
            )
            .service(
                web::scope("/system")
                    .route("/status", web::get().to(system_routes::get_system_status)),
            ),
    );
}

/// HTTP server for a docgate instance.
///
/// Serves the folder-tree views, the sync trigger and the capability-token
/// file endpoints over REST.
pub struct DocGateHttpServer {
    state: web::Data<AppState>,
    bind_address: String,
}

impl DocGateHttpServer {
    pub fn new(config: &AppConfig, source: Arc<dyn ExternalSource>) -> DocGateResult<Self> {
        config.validate()?;
        let state = AppState::build(config, source)?;
        Ok(Self {
            state: web::Data::new(state),
            bind_address: config.bind_address.clone(),
        })
    }

    /// Run the HTTP server until the process is stopped.
    pub async fn run(&self) -> DocGateResult<()> {
        info!("HTTP server running on {}", self.bind_address);

        let app_state = self.state.clone();
        let server = ActixHttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(app_state.clone())
                .configure(configure_api)
        })
        .bind(&self.bind_address)?
        .run();

        server.await?;
        Ok(())
    }
}
