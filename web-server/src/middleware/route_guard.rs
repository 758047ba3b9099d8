// web-server/src/middleware/route_guard.rs
use actix_service::{Service, Transform};
use actix_web::{
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{header, StatusCode},
    Error, HttpResponse,
};
use common::models::routes::{GuardDecision, RouteTable};
use common::models::session::ACCESS_TOKEN_COOKIE;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;

/// Redirects page requests between the public and protected partitions
/// based on whether an access cookie is present.
#[derive(Clone)]
pub struct RouteGuard {
    routes: Arc<RouteTable>,
}

impl RouteGuard {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RouteGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RouteGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RouteGuardMiddleware {
            service: Rc::new(service),
            routes: self.routes.clone(),
        }))
    }
}

pub struct RouteGuardMiddleware<S> {
    service: Rc<S>,
    routes: Arc<RouteTable>,
}

impl<S, B> Service<ServiceRequest> for RouteGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let has_access_cookie = req
            .cookie(ACCESS_TOKEN_COOKIE)
            .map(|c| !c.value().is_empty())
            .unwrap_or(false);

        let decision = self.routes.decide(req.path(), has_access_cookie);
        if let GuardDecision::Redirect(location) = decision {
            tracing::debug!("Route guard redirecting {} to {}", req.path(), location);
            return Box::pin(async move {
                Ok(req.into_response(
                    HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
                        .insert_header((header::LOCATION, location))
                        .finish()
                        .map_into_right_body(),
                ))
            });
        }

        let srv = self.service.clone();
        Box::pin(async move { Ok(srv.call(req).await?.map_into_left_body()) })
    }
}
