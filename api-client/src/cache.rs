// api-client/src/cache.rs
use actix::{Actor, AsyncContext, Context, Handler, Message, MessageResult};
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::query_keys::QueryKey;

// Unused entries are dropped after five minutes
const DEFAULT_GC_TIME: Duration = Duration::from_secs(300);
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// A query key owned by one session. Entries of different sessions never
/// answer each other.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub session: String,
    pub query: QueryKey,
}

impl CacheKey {
    pub fn new(session: impl Into<String>, query: QueryKey) -> Self {
        Self {
            session: session.into(),
            query,
        }
    }
}

// Only the query part; the session is a credential
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}

/// Actor message: look up a fresh cached value
#[derive(Message)]
#[rtype(result = "Option<Value>")]
pub struct GetCached {
    pub key: CacheKey,
}

/// Actor message: store a fetched value
#[derive(Message)]
#[rtype(result = "()")]
pub struct StoreQuery {
    pub key: CacheKey,
    pub value: Value,
    /// How long the value may be served without refetching
    pub stale_time: Duration,
}

/// Actor message: mark every key under a prefix as stale. `session: None`
/// reaches the entries of every session.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct InvalidateQueries {
    pub session: Option<String>,
    pub prefix: QueryKey,
}

/// Actor message: drop entries nobody asked for within the GC time
#[derive(Message)]
#[rtype(result = "usize")]
pub struct CollectGarbage;

/// Actor message: read cache metrics
#[derive(Message)]
#[rtype(result = "CacheMetrics")]
pub struct GetCacheMetrics;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Invalidation requests handled, whatever they matched
    pub invalidations: u64,
    pub collected: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    fetched_at: Instant,
    stale_time: Duration,
    last_accessed: Instant,
    invalidated: bool,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        !self.invalidated && now.duration_since(self.fetched_at) < self.stale_time
    }
}

/// Keyed remote-data cache shared by every client handle
pub struct QueryCacheActor {
    entries: Arc<DashMap<CacheKey, CacheEntry>>,
    gc_time: Duration,
    cleanup_interval: Duration,
    metrics: CacheMetrics,
}

impl Default for QueryCacheActor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCacheActor {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            gc_time: DEFAULT_GC_TIME,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            metrics: CacheMetrics::default(),
        }
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    fn collect(&mut self, now: Instant) -> usize {
        let gc_time = self.gc_time;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_accessed) < gc_time);
        let removed = before.saturating_sub(self.entries.len());
        self.metrics.collected += removed as u64;
        removed
    }
}

impl Actor for QueryCacheActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("QueryCacheActor started with GC time: {:?}", self.gc_time);

        ctx.run_interval(self.cleanup_interval, |act, _ctx| {
            let removed = act.collect(Instant::now());
            if removed > 0 {
                tracing::debug!("Collected {} unused cache entries", removed);
            }
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "QueryCacheActor stopped. {} hits, {} misses, {} invalidations",
            self.metrics.hits,
            self.metrics.misses,
            self.metrics.invalidations
        );
    }
}

impl Handler<GetCached> for QueryCacheActor {
    type Result = MessageResult<GetCached>;

    fn handle(&mut self, msg: GetCached, _ctx: &mut Self::Context) -> Self::Result {
        let now = Instant::now();
        let result = match self.entries.get_mut(&msg.key) {
            Some(mut entry) => {
                entry.last_accessed = now;
                entry.is_fresh(now).then(|| entry.value.clone())
            }
            None => None,
        };

        if result.is_some() {
            self.metrics.hits += 1;
            tracing::trace!("Cache hit for {}", msg.key);
        } else {
            self.metrics.misses += 1;
            tracing::trace!("Cache miss for {}", msg.key);
        }
        MessageResult(result)
    }
}

impl Handler<StoreQuery> for QueryCacheActor {
    type Result = ();

    fn handle(&mut self, msg: StoreQuery, _ctx: &mut Self::Context) -> Self::Result {
        let now = Instant::now();
        self.entries.insert(
            msg.key,
            CacheEntry {
                value: msg.value,
                fetched_at: now,
                stale_time: msg.stale_time,
                last_accessed: now,
                invalidated: false,
            },
        );
    }
}

impl Handler<InvalidateQueries> for QueryCacheActor {
    type Result = MessageResult<InvalidateQueries>;

    fn handle(&mut self, msg: InvalidateQueries, _ctx: &mut Self::Context) -> Self::Result {
        let mut matched = 0;
        for mut entry in self.entries.iter_mut() {
            let key = entry.key();
            let in_session = msg.session.as_ref().map_or(true, |s| *s == key.session);
            if in_session && key.query.starts_with(&msg.prefix) {
                entry.value_mut().invalidated = true;
                matched += 1;
            }
        }
        self.metrics.invalidations += 1;
        tracing::debug!("Invalidated {} entries under {}", matched, msg.prefix);
        MessageResult(matched)
    }
}

impl Handler<CollectGarbage> for QueryCacheActor {
    type Result = MessageResult<CollectGarbage>;

    fn handle(&mut self, _msg: CollectGarbage, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.collect(Instant::now()))
    }
}

impl Handler<GetCacheMetrics> for QueryCacheActor {
    type Result = MessageResult<GetCacheMetrics>;

    fn handle(&mut self, _msg: GetCacheMetrics, _ctx: &mut Self::Context) -> Self::Result {
        self.metrics.entries = self.entries.len();
        MessageResult(self.metrics.clone())
    }
}
