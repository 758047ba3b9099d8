// web-server/src/state.rs
use actix_web::web;
use common::models::routes::{RouteTable, RouteTableError};
use common::{Config, StaticFilesConfig};
use std::sync::Arc;

use crate::backend::BackendApi;
use crate::cookies::SessionCookies;
use crate::middleware::{RateLimiter, RouteGuard};
use crate::proxy::BackendProxy;
use crate::relay::SessionRelay;

/// Everything the handlers share, built once from config and an injected
/// backend.
pub struct AppState {
    pub relay: SessionRelay,
    pub proxy: BackendProxy,
    pub cookies: SessionCookies,
    pub routes: Arc<RouteTable>,
    pub static_files: StaticFilesConfig,
    rate_limiter: RateLimiter,
}

impl AppState {
    /// Fails when the route table does not validate
    pub fn new(config: &Config, backend: Arc<dyn BackendApi>) -> Result<Self, RouteTableError> {
        let routes = Arc::new(RouteTable::from_config(&config.routes)?);

        for (path, class) in routes.entries() {
            tracing::debug!("Route {} is {:?}", path, class);
        }

        Ok(Self {
            relay: SessionRelay::new(backend.clone(), config.app_origin.clone()),
            proxy: BackendProxy::new(backend, routes.login_path()),
            cookies: SessionCookies::from_config(&config.cookies),
            routes,
            static_files: config.static_files.clone(),
            rate_limiter: RateLimiter::new(&config.rate_limit),
        })
    }

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.routes.clone())
    }

    /// Clones share one attempt store across workers
    pub fn rate_limiter(&self) -> RateLimiter {
        self.rate_limiter.clone()
    }
}

/// Register the API scope and page serving against shared state
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let static_files = state.static_files.clone();
    cfg.app_data(state);
    crate::api::configure(cfg);
    crate::pages::configure(cfg, &static_files);
}
