// web-server/src/main.rs
use actix_web::middleware::{Compress, Condition};
use actix_web::{web, App, HttpServer};
use common::{setup_tracing, Config};
use std::io;
use std::sync::Arc;
use web_server::backend::HttpBackend;
use web_server::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Tracing comes up before config so config loading is logged
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    setup_tracing(&log_level);

    let config = Config::from_env();
    let server_addr = config.web_server_addr.clone();
    let compress = config.static_files.enable_compression;

    let backend = HttpBackend::from_config(&config)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let state = AppState::new(&config, Arc::new(backend)).map_err(|e| {
        tracing::error!("Invalid route table: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;
    let state = web::Data::new(state);

    tracing::info!(
        "Starting Web Server on {} (backend {}, origin {})",
        server_addr,
        config.backend_url,
        config.app_origin
    );

    HttpServer::new(move || {
        App::new()
            .wrap(state.route_guard())
            .wrap(state.rate_limiter())
            .wrap(Condition::new(compress, Compress::default()))
            .configure(|cfg| web_server::configure(cfg, state.clone()))
    })
    .bind(&server_addr)?
    .run()
    .await
}
