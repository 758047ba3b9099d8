// api-client/src/lib.rs
pub mod cache;
pub mod client;
pub mod context;
pub mod error;
pub mod query_keys;
pub mod resources;

pub use cache::{CacheMetrics, QueryCacheActor};
pub use client::{Endpoints, FinanceClient, LoginOutcome};
pub use context::SessionContext;
pub use error::ApiError;
pub use query_keys::QueryKey;
pub use resources::ResourceList;
