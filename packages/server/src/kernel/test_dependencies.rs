// TestDependencies - controllable implementations for testing
//
// Provides a manual clock and a ServerDeps builder wired for deterministic
// (inline) notification delivery.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::PgPool;
use std::sync::{Arc, Mutex};

use super::{BaseClock, DeliveryMode, ServerDeps, StreamHub};
use crate::domains::departments::DepartmentCatalog;

// =============================================================================
// Manual Clock
// =============================================================================

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Starts at 2025-01-01T00:00:00Z.
    pub fn at_epoch() -> Self {
        Self::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl BaseClock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for ServerDeps used by integration tests.
pub struct TestDependencies {
    pub clock: ManualClock,
    pub stream_hub: StreamHub,
    pub catalog: DepartmentCatalog,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            clock: ManualClock::at_epoch(),
            stream_hub: StreamHub::new(),
            catalog: DepartmentCatalog::builtin(),
        }
    }

    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_catalog(mut self, catalog: DepartmentCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Inline delivery: notifications are persisted before the triggering
    /// operation returns, which keeps assertions deterministic.
    pub fn into_server_deps(self, db_pool: PgPool) -> ServerDeps {
        ServerDeps::new(
            db_pool,
            Arc::new(self.clock),
            self.stream_hub,
            Arc::new(self.catalog),
        )
        .with_delivery_mode(DeliveryMode::Inline)
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
