// web-server/src/pages.rs
use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::{web, HttpResponse};
use common::models::session::ErrorBody;
use common::StaticFilesConfig;
use std::path::PathBuf;

fn index_path(config: &StaticFilesConfig) -> PathBuf {
    PathBuf::from(&config.path).join(&config.index)
}

/// Serve the built UI bundle. Unknown page paths fall back to the index
/// so client-side routing can take over; API paths never do.
pub fn configure(cfg: &mut web::ServiceConfig, config: &StaticFilesConfig) {
    let index = index_path(config);

    cfg.service(
        Files::new("/", &config.path)
            .index_file(config.index.clone())
            .prefer_utf8(true)
            .use_etag(true)
            .use_last_modified(true)
            .default_handler(fn_service(move |req: ServiceRequest| {
                let index = index.clone();
                async move {
                    let (req, _) = req.into_parts();
                    if req.path().starts_with("/api/") {
                        let resp = HttpResponse::NotFound().json(ErrorBody::new("Not found"));
                        return Ok(ServiceResponse::new(req, resp));
                    }
                    let file = NamedFile::open_async(&index).await?;
                    let resp = file.into_response(&req);
                    Ok(ServiceResponse::new(req, resp))
                }
            })),
    );
}
