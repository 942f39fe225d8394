//! Provider gateway: fetch-through-cache access to the weather API.
//!
//! Single point of contact with the provider. Both operations follow the
//! same protocol: reject blank input, serve a still-valid cache entry
//! without touching the network, otherwise issue exactly one request and
//! either cache the mapped result or classify the failure. Failed fetches
//! never write the cache, so a previously stored entry is never displaced
//! by an error.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::instrument;

use crate::cache::{cache_key, ResponseCache};
use crate::clock::{Clock, SystemClock};
use crate::error::{Endpoint, WeatherError};
use crate::types::{
    ApiCurrentResponse, ApiForecastResponse, ForecastPoint, WeatherSnapshot, FORECAST_POINTS,
};

const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";

pub struct WeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    clock: Arc<dyn Clock>,
    current_cache: Mutex<ResponseCache<WeatherSnapshot>>,
    forecast_cache: Mutex<ResponseCache<Vec<ForecastPoint>>>,
}

impl WeatherClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, OPENWEATHER_API_BASE)
    }

    /// Point the gateway at a different provider base URL (tests, proxies).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self::with_clock(api_key, base_url, Arc::new(SystemClock))
    }

    /// Inject the time source used for freshness decisions and capture
    /// timestamps.
    pub fn with_clock(api_key: &str, base_url: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            current_cache: Mutex::new(ResponseCache::new(clock.clone())),
            forecast_cache: Mutex::new(ResponseCache::new(clock.clone())),
            clock,
        }
    }

    /// Fetch current conditions for `city`, served from cache within the
    /// freshness window.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        if city.trim().is_empty() {
            return Err(WeatherError::InvalidInput);
        }

        let key = cache_key(Endpoint::Current, city);
        if let Some(hit) = self.current_cache.lock().get_fresh(&key) {
            tracing::debug!(%key, "cache hit, skipping network call");
            return Ok(hit);
        }

        let api: ApiCurrentResponse = self.get_json(Endpoint::Current, city).await?;
        let snapshot = WeatherSnapshot::from_api(api, self.clock.now());
        self.current_cache.lock().put(key, snapshot.clone());
        Ok(snapshot)
    }

    /// Fetch the short-term forecast for `city`: the first
    /// [`FORECAST_POINTS`] 3-hour steps in provider order, served from
    /// cache within the freshness window.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastPoint>, WeatherError> {
        if city.trim().is_empty() {
            return Err(WeatherError::InvalidInput);
        }

        let key = cache_key(Endpoint::Forecast, city);
        if let Some(hit) = self.forecast_cache.lock().get_fresh(&key) {
            tracing::debug!(%key, "cache hit, skipping network call");
            return Ok(hit);
        }

        let api: ApiForecastResponse = self.get_json(Endpoint::Forecast, city).await?;
        let points: Vec<ForecastPoint> = api
            .list
            .into_iter()
            .take(FORECAST_POINTS)
            .map(ForecastPoint::from_api)
            .collect();
        self.forecast_cache.lock().put(key, points.clone());
        Ok(points)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        city: &str,
    ) -> Result<T, WeatherError> {
        let url = format!(
            "{}/{}?q={}&appid={}&units=metric",
            self.base_url,
            endpoint.path(),
            urlencoding::encode(city),
            self.api_key,
        );

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%endpoint, "transport failure: {}", e);
                return Err(WeatherError::Unavailable(endpoint));
            }
        };

        self.handle_response(endpoint, response).await
    }

    /// Classify a provider response into the fixed error taxonomy.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        response: reqwest::Response,
    ) -> Result<T, WeatherError> {
        let status = response.status();

        if status.is_success() {
            // An empty or malformed body counts as a provider failure.
            response.json().await.map_err(|e| {
                tracing::warn!(%endpoint, "unusable provider body: {}", e);
                WeatherError::Unavailable(endpoint)
            })
        } else if status.as_u16() == 401 {
            Err(WeatherError::InvalidCredential)
        } else if status.as_u16() == 404 {
            Err(WeatherError::NotFound)
        } else if status.as_u16() == 429 {
            Err(WeatherError::RateLimited(endpoint))
        } else {
            tracing::warn!(%endpoint, %status, "provider failure");
            Err(WeatherError::Unavailable(endpoint))
        }
    }
}
