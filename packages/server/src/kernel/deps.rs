//! Server dependencies shared by every domain activity.
//!
//! External concerns (time, the department catalog, live delivery) sit behind
//! this container so tests can swap them.

use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::departments::DepartmentCatalog;
use crate::kernel::{BaseClock, StreamHub, SystemClock};

/// Default cache key for the dashboard snapshot.
pub const DASHBOARD_CACHE_KEY: &str = "dashboard_analytics";

/// How notifications are produced after their triggering write commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Spawned onto the runtime; the caller never waits on delivery.
    #[default]
    Spawned,
    /// Awaited after commit, before the operation returns.
    Inline,
}

#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub clock: Arc<dyn BaseClock>,
    /// In-process pub/sub hub for real-time streaming to SSE endpoints
    pub stream_hub: StreamHub,
    /// Static department catalog, loaded once at startup
    pub catalog: Arc<DepartmentCatalog>,
    pub delivery_mode: DeliveryMode,
    pub analytics_cache_key: String,
    pub analytics_ttl: Duration,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        clock: Arc<dyn BaseClock>,
        stream_hub: StreamHub,
        catalog: Arc<DepartmentCatalog>,
    ) -> Self {
        Self {
            db_pool,
            clock,
            stream_hub,
            catalog,
            delivery_mode: DeliveryMode::default(),
            analytics_cache_key: DASHBOARD_CACHE_KEY.to_string(),
            analytics_ttl: Duration::minutes(30),
        }
    }

    /// Production wiring: wall clock, fresh hub.
    pub fn production(db_pool: PgPool, catalog: DepartmentCatalog) -> Self {
        Self::new(
            db_pool,
            Arc::new(SystemClock),
            StreamHub::new(),
            Arc::new(catalog),
        )
    }

    pub fn with_delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }

    pub fn with_analytics_cache(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.analytics_cache_key = key.into();
        self.analytics_ttl = ttl;
        self
    }
}
