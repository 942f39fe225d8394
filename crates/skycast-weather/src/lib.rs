//! Skycast weather data-access layer.
//!
//! Wraps the provider's current-conditions and forecast endpoints behind a
//! 60-second fetch-through cache, normalizes every failure into a fixed
//! error taxonomy, and exposes a deduplicating, auto-retrying query layer
//! for the presentation side.

pub mod cache;
pub mod client;
pub mod clock;
pub mod error;
pub mod query;
pub mod types;

pub use cache::{cache_key, CacheEntry, ResponseCache, CACHE_DURATION_MS};
pub use client::WeatherClient;
pub use clock::{Clock, SystemClock};
pub use error::{Endpoint, WeatherError};
pub use query::{QuerySnapshot, QueryState, RetryPolicy, WeatherQueries};
pub use types::{ForecastPoint, WeatherSnapshot, FORECAST_POINTS};
