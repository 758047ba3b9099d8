// api-client/src/client.rs
use actix::Addr;
use common::models::session::{ErrorBody, LoginCredentials, LogoutResponse};
use common::Config;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::{ORIGIN, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKey, GetCached, InvalidateQueries, QueryCacheActor, StoreQuery};
use crate::context::SessionContext;
use crate::error::ApiError;
use crate::query_keys::{Params, QueryKey};

type InFlight = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

/// Where the client sends its requests
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Finance API base; the backend itself or the web server's proxy
    pub api_base: String,
    /// Web server hosting the login relay
    pub relay_base: String,
    /// Origin presented to the relay
    pub origin: String,
    /// Page the user is sent to when a session is rejected
    pub login_path: String,
}

impl Endpoints {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_base: config.backend_url.clone(),
            relay_base: config.app_origin.clone(),
            origin: config.app_origin.clone(),
            login_path: config.routes.login.clone(),
        }
    }
}

/// Outcome of a relayed login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: Value,
    /// Session built from the cookies the relay issued
    pub context: SessionContext,
}

/// Injected data-fetching client.
///
/// Cheap to clone; clones share the HTTP connection pool, the cache and the
/// in-flight table. Use [`FinanceClient::with_context`] to bind a different
/// page session. Cache entries and in-flight requests are keyed by session,
/// so sessions sharing a client never see each other's data.
#[derive(Clone)]
pub struct FinanceClient {
    http: Client,
    endpoints: Arc<Endpoints>,
    context: SessionContext,
    cache: Addr<QueryCacheActor>,
    inflight: Arc<DashMap<CacheKey, InFlight>>,
}

impl FinanceClient {
    pub fn new(
        http: Client,
        endpoints: Endpoints,
        context: SessionContext,
        cache: Addr<QueryCacheActor>,
    ) -> Self {
        Self {
            http,
            endpoints: Arc::new(endpoints),
            context,
            cache,
            inflight: Arc::new(DashMap::new()),
        }
    }

    pub fn http_client(timeout: Duration) -> Result<Client, ApiError> {
        Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    pub fn with_context(&self, context: SessionContext) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn cache(&self) -> &Addr<QueryCacheActor> {
        &self.cache
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.api_base.trim_end_matches('/'), path)
    }

    fn relay_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.relay_base.trim_end_matches('/'), path)
    }

    fn unauthorized(&self) -> ApiError {
        ApiError::Unauthorized {
            redirect_to: self.endpoints.login_path.clone(),
        }
    }

    /// Map any unauthorized reply to the login route and any other
    /// failure to its status and message
    async fn check(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::info!("Session rejected, redirecting to {}", self.endpoints.login_path);
            return Err(self.unauthorized());
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn fetch(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let response = builder.send().await?;
        let response = self.check(response).await?;
        Ok(response.json::<Value>().await?)
    }

    fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Cached, deduplicated GET. Disabled without a session.
    ///
    /// Concurrent calls for the same key within one session share one
    /// request; a fresh cache entry answers without touching the network.
    pub(crate) async fn query<T: DeserializeOwned>(
        &self,
        key: QueryKey,
        path: String,
        params: Params,
        stale_time: Duration,
    ) -> Result<T, ApiError> {
        let key = match self.context.csrf_token() {
            Some(session) => CacheKey::new(session, key),
            None => return Err(ApiError::Disabled),
        };

        let shared = match self.inflight.entry(key.clone()) {
            Entry::Occupied(existing) => {
                tracing::trace!("Joining in-flight query {}", key);
                existing.get().clone()
            }
            Entry::Vacant(slot) => {
                let this = self.clone();
                let fut_key = key.clone();
                let fut = async move { this.load(fut_key, path, params, stale_time).await }
                    .boxed()
                    .shared();
                slot.insert(fut.clone());
                fut
            }
        };

        let result = shared.clone().await;
        self.release(&key, &shared);
        Self::decode(result?)
    }

    /// Drop the in-flight entry only if it is still the request we awaited
    fn release(&self, key: &CacheKey, finished: &InFlight) {
        self.inflight.remove_if(key, |_, current| current.ptr_eq(finished));
    }

    async fn load(
        &self,
        key: CacheKey,
        path: String,
        params: Params,
        stale_time: Duration,
    ) -> Result<Value, ApiError> {
        if let Some(cached) = self.cache.send(GetCached { key: key.clone() }).await? {
            return Ok(cached);
        }

        tracing::debug!("Fetching {}", key);
        let builder = self
            .context
            .apply(self.http.get(self.api_url(&path)), false)
            .query(&params);
        let value = self.fetch(builder).await?;

        self.cache
            .send(StoreQuery {
                key,
                value: value.clone(),
                stale_time,
            })
            .await?;
        Ok(value)
    }

    /// Signed state-changing request. On success each key in `invalidates`
    /// is invalidated exactly once.
    pub(crate) async fn mutate<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        invalidates: &[QueryKey],
    ) -> Result<T, ApiError> {
        let session = match self.context.csrf_token() {
            Some(session) => session.to_string(),
            None => return Err(ApiError::Disabled),
        };

        let builder = self
            .context
            .apply(self.http.request(method, self.api_url(path)), true)
            .json(body);
        let value = self.fetch(builder).await?;

        for prefix in invalidates {
            self.expire(Some(session.clone()), prefix.clone()).await;
        }
        Self::decode(value)
    }

    /// Returns how many of this session's cached entries the prefix matched
    pub async fn invalidate(&self, prefix: QueryKey) -> Result<usize, ApiError> {
        let session = match self.context.csrf_token() {
            Some(session) => session.to_string(),
            None => return Ok(0),
        };
        let msg = InvalidateQueries {
            session: Some(session),
            prefix,
        };
        Ok(self.cache.send(msg).await?)
    }

    /// Invalidation after a completed write. A cache failure is logged and
    /// never turns the write into an error.
    async fn expire(&self, session: Option<String>, prefix: QueryKey) {
        let msg = InvalidateQueries {
            session,
            prefix: prefix.clone(),
        };
        if let Err(e) = self.cache.send(msg).await {
            tracing::error!("Could not invalidate {}: {}", prefix, e);
        }
    }

    /// Log in through the relay. The returned context carries the cookies
    /// the relay issued; bind it with [`FinanceClient::with_context`].
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, ApiError> {
        credentials.validate()?;

        let response = self
            .http
            .post(self.relay_url("/api/login"))
            .header(ORIGIN, self.endpoints.origin.as_str())
            .json(credentials)
            .send()
            .await?;

        // A 401 here means bad credentials, not an expired session
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Login failed".to_string());
            return Err(ApiError::Status { status, message });
        }

        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body: Value = response.json().await?;

        self.expire(None, QueryKey::any()).await;
        Ok(LoginOutcome {
            user: body.get("data").cloned().unwrap_or(Value::Null),
            context: SessionContext::from_set_cookies(&set_cookies),
        })
    }

    /// Log out through the relay and drop everything cached
    pub async fn logout(&self) -> Result<LogoutResponse, ApiError> {
        let builder = self
            .context
            .apply(self.http.post(self.relay_url("/api/logout")), true);
        let value = self.fetch(builder).await?;

        self.expire(None, QueryKey::any()).await;
        Self::decode(value)
    }
}
