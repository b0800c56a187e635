use std::sync::Arc;

use docgate::source::HttpSource;
use docgate::{load_config, DocGateHttpServer};

#[actix_web::main]
async fn main() {
    docgate::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(|s| s.as_str());

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let source = Arc::new(HttpSource::new(config.upstream.clone()));
    let server = match DocGateHttpServer::new(&config, source) {
        Ok(server) => server,
        Err(e) => {
            log::error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        log::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
