//! Time-boxed in-memory response cache.
//!
//! Entries are served without a network call for [`CACHE_DURATION_MS`]
//! after capture. There is no eviction and no background sweep: validity
//! is computed lazily on read, stale entries are treated as misses and
//! overwritten by the next successful fetch, and the key space is bounded
//! by the distinct cities searched in a session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::error::Endpoint;

/// How long a cached response stays servable, in milliseconds.
pub const CACHE_DURATION_MS: i64 = 60_000;

/// One cached response. Immutable once created; a fresh fetch replaces
/// the entry for a key rather than mutating it.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    data: T,
    timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Composite cache key: endpoint kind plus the verbatim city string.
/// Deliberately not normalized; "Paris" and "paris " are distinct keys.
pub fn cache_key(endpoint: Endpoint, city: &str) -> String {
    format!("{}:{}", endpoint, city)
}

pub struct ResponseCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    /// Store `data` under `key`, stamped with the current time, replacing
    /// any prior entry unconditionally. Last write wins on timestamp: a
    /// slow earlier request completing late can displace fresher data.
    pub fn put(&mut self, key: impl Into<String>, data: T) {
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now(),
        };
        self.entries.insert(key.into(), entry);
    }

    /// An entry is valid iff strictly less than [`CACHE_DURATION_MS`] has
    /// elapsed since capture; at exactly the boundary it is stale.
    pub fn is_valid(&self, entry: &CacheEntry<T>) -> bool {
        self.clock.now() - entry.timestamp < Duration::milliseconds(CACHE_DURATION_MS)
    }

    /// Cloned data for `key` if present and still valid.
    pub fn get_fresh(&self, key: &str) -> Option<T> {
        self.get(key)
            .filter(|entry| self.is_valid(entry))
            .map(|entry| entry.data.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::clock::test_clock::ManualClock;
    use chrono::TimeZone;

    fn cache_with_clock() -> (ResponseCache<String>, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        (ResponseCache::new(clock.clone()), clock)
    }

    #[test]
    fn test_missing_key_is_a_miss() {
        let (cache, _clock) = cache_with_clock();
        assert!(cache.get("weather:Paris").is_none());
        assert!(cache.get_fresh("weather:Paris").is_none());
    }

    #[test]
    fn test_entry_valid_strictly_inside_window() {
        let (mut cache, clock) = cache_with_clock();
        cache.put("weather:Paris", "18.5C".to_string());

        clock.advance(Duration::milliseconds(CACHE_DURATION_MS - 1));
        assert_eq!(cache.get_fresh("weather:Paris"), Some("18.5C".to_string()));
    }

    #[test]
    fn test_entry_stale_at_exact_boundary() {
        let (mut cache, clock) = cache_with_clock();
        cache.put("weather:Paris", "18.5C".to_string());

        clock.advance(Duration::milliseconds(CACHE_DURATION_MS));
        let entry = cache.get("weather:Paris").unwrap();
        assert!(!cache.is_valid(entry));
        assert!(cache.get_fresh("weather:Paris").is_none());
    }

    #[test]
    fn test_keys_isolate_endpoint_kinds() {
        let (mut cache, _clock) = cache_with_clock();
        cache.put(cache_key(Endpoint::Current, "Paris"), "current".to_string());

        assert_eq!(cache_key(Endpoint::Current, "Paris"), "weather:Paris");
        assert_eq!(cache_key(Endpoint::Forecast, "Paris"), "forecast:Paris");
        assert!(cache.get_fresh("forecast:Paris").is_none());
    }

    #[test]
    fn test_keys_are_case_and_whitespace_sensitive() {
        assert_ne!(cache_key(Endpoint::Current, "Paris"), cache_key(Endpoint::Current, "paris"));
        assert_ne!(
            cache_key(Endpoint::Current, "Paris"),
            cache_key(Endpoint::Current, "Paris ")
        );
    }

    #[test]
    fn test_put_replaces_prior_entry() {
        let (mut cache, clock) = cache_with_clock();
        cache.put("weather:Paris", "old".to_string());

        clock.advance(Duration::milliseconds(30_000));
        cache.put("weather:Paris", "new".to_string());

        let entry = cache.get("weather:Paris").unwrap();
        assert_eq!(entry.data(), "new");
        assert_eq!(entry.timestamp(), clock.now());
    }

    #[test]
    fn test_last_write_wins_even_for_slower_earlier_request() {
        // Responses for one key are applied in completion order, not issue
        // order: a slow request issued first but finishing last overwrites
        // the fresher data.
        let (mut cache, clock) = cache_with_clock();

        // Fast, later-issued request lands first.
        cache.put("weather:Paris", "fresh".to_string());
        clock.advance(Duration::milliseconds(5_000));

        // Slow, earlier-issued request lands afterwards with older data.
        cache.put("weather:Paris", "older".to_string());

        assert_eq!(cache.get_fresh("weather:Paris"), Some("older".to_string()));
    }
}
