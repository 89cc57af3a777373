//! Staleness rules.

use std::time::Duration;

use cycleways_core::{StoredResponse, WorkerConfig};

use super::router::Route;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Maximum entry age per route.
///
/// Navigations, static assets and ordinary API data share the long TTL;
/// live API data uses the short one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    default_ttl: Duration,
    live_ttl: Duration,
}

impl TtlPolicy {
    pub fn new(config: &WorkerConfig) -> Self {
        Self { default_ttl: config.default_ttl(), live_ttl: config.live_ttl() }
    }

    pub fn ttl_for(&self, route: Route) -> Duration {
        match route {
            Route::Api { live: true } => self.live_ttl,
            Route::Api { live: false } | Route::Navigation | Route::Static | Route::Passthrough => self.default_ttl,
        }
    }

    /// Whether `entry` may be served without a refresh at `now_ms`.
    ///
    /// Fresh iff `now - cached_at <= ttl`. An entry without a timestamp is
    /// never fresh. A timestamp in the future (clock moved backwards) counts
    /// as fresh. Pure: checking never touches the store.
    pub fn is_fresh(&self, entry: &StoredResponse, route: Route, now_ms: i64) -> bool {
        let Some(cached_at) = entry.cached_at_ms else {
            return false;
        };
        let ttl_ms = i64::try_from(self.ttl_for(route).as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(cached_at) <= ttl_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    const MINUTE: i64 = 60 * 1000;

    fn entry(cached_at_ms: Option<i64>) -> StoredResponse {
        StoredResponse {
            status: 200,
            status_text: "OK".into(),
            headers: Vec::new(),
            body: Bytes::new(),
            cached_at_ms,
        }
    }

    fn policy() -> TtlPolicy {
        TtlPolicy::new(&WorkerConfig::default())
    }

    #[test]
    fn test_ttl_per_route() {
        let p = policy();
        assert_eq!(p.ttl_for(Route::Api { live: true }), Duration::from_secs(5 * 60));
        assert_eq!(p.ttl_for(Route::Api { live: false }), Duration::from_secs(24 * 60 * 60));
        assert_eq!(p.ttl_for(Route::Navigation), p.ttl_for(Route::Static));
    }

    #[test]
    fn test_live_entry_expires_after_short_ttl() {
        let now = 1_700_000_000_000;
        let live = Route::Api { live: true };
        assert!(policy().is_fresh(&entry(Some(now - 4 * MINUTE)), live, now));
        assert!(policy().is_fresh(&entry(Some(now - 5 * MINUTE)), live, now));
        assert!(!policy().is_fresh(&entry(Some(now - 6 * MINUTE)), live, now));
    }

    #[test]
    fn test_same_age_fresh_on_long_ttl() {
        let now = 1_700_000_000_000;
        assert!(policy().is_fresh(&entry(Some(now - 6 * MINUTE)), Route::Api { live: false }, now));
        assert!(policy().is_fresh(&entry(Some(now - 6 * MINUTE)), Route::Static, now));
        assert!(!policy().is_fresh(&entry(Some(now - 25 * 60 * MINUTE)), Route::Navigation, now));
    }

    #[test]
    fn test_missing_timestamp_is_stale() {
        assert!(!policy().is_fresh(&entry(None), Route::Static, now_ms()));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let now = 1_700_000_000_000;
        assert!(policy().is_fresh(&entry(Some(now + MINUTE)), Route::Api { live: true }, now));
    }
}
