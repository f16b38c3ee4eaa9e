// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Naming convention: Base* for trait names (e.g., BaseClock)

use chrono::{DateTime, Utc};

// =============================================================================
// Clock Trait (Infrastructure - wall-clock time)
// =============================================================================

/// Source of "now" for every timestamp the engine writes.
///
/// Issue timestamps, `resolved_at`, notification times and analytics cache
/// windows all read from this so tests can move time forward.
pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl BaseClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        // Postgres stores microseconds; truncate so values round-trip exactly.
        let now = Utc::now();
        DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
    }
}
