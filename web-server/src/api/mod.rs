// web-server/src/api/mod.rs
pub mod auth;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(
        actix_web::web::scope("/api")
            .service(auth::api_index)
            .service(auth::login)
            .service(auth::logout)
            .service(auth::signup)
            .configure(crate::proxy::configure)
    );
}
