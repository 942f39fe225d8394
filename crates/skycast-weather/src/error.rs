//! Weather provider error taxonomy.
//!
//! Every provider or transport failure is mapped into exactly one of five
//! kinds before it leaves the gateway; raw `reqwest` errors never travel
//! upward. `Display` carries the exact user-visible message for each kind.

use thiserror::Error;

/// Which provider endpoint a request targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    /// Path segment on the provider API, also used in cache keys and
    /// user-facing messages.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Current => "weather",
            Self::Forecast => "forecast",
        }
    }

    /// Provider call budget per minute for this endpoint kind.
    pub fn calls_per_minute(&self) -> u32 {
        match self {
            Self::Current => 60,
            Self::Forecast => 5,
        }
    }

    fn rate_limit_label(&self) -> String {
        match self {
            Self::Current => format!("{} calls per minute allowed", self.calls_per_minute()),
            Self::Forecast => format!("{} forecasts per minute allowed", self.calls_per_minute()),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("Please enter a city name")]
    InvalidInput,

    #[error("Invalid API key")]
    InvalidCredential,

    #[error("City not found. Please try another location.")]
    NotFound,

    #[error("API rate limit exceeded. Please wait a moment and try again. ({})", .0.rate_limit_label())]
    RateLimited(Endpoint),

    #[error("Failed to fetch {0} data. Please try again.")]
    Unavailable(Endpoint),
}

impl WeatherError {
    /// Whether the orchestrator may retry automatically. Retrying a
    /// rate-limit error would worsen it, so that kind is never retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RateLimited(_))
    }

    /// User-friendly message for UI display.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
