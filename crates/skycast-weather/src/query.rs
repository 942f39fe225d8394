//! Query orchestration between the presentation layer and the gateway.
//!
//! Each (endpoint, city) key runs an explicit state machine
//! `Idle -> Fetching -> (Fresh | Failed)` driven by cache validity and the
//! retry policy, independent of any UI re-render cycle. Concurrent
//! triggers for a key in flight coalesce onto the same outcome instead of
//! issuing a second network call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::client::WeatherClient;
use crate::error::{Endpoint, WeatherError};
use crate::types::{ForecastPoint, WeatherSnapshot};

/// Automatic re-attempt policy after a classified failure.
///
/// `RateLimited` failures are never retried regardless of this policy;
/// retrying a rate-limit error would worsen it.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Delay before each re-attempt.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Lifecycle of one query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryState {
    #[default]
    Idle,
    Fetching,
    Fresh,
    Failed,
}

/// Presentation-facing view of a query: the last successful data, the
/// last classified error, and whether a fetch is underway.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    pub data: Option<T>,
    pub error: Option<WeatherError>,
    pub is_loading: bool,
}

impl<T> Default for QuerySnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
        }
    }
}

#[derive(Debug, Clone)]
struct KeyState<T> {
    state: QueryState,
    data: Option<T>,
    error: Option<WeatherError>,
}

impl<T> Default for KeyState<T> {
    fn default() -> Self {
        Self {
            state: QueryState::Idle,
            data: None,
            error: None,
        }
    }
}

/// Per-endpoint bookkeeping: key states plus the in-flight senders used
/// to coalesce concurrent triggers.
struct QueryCell<T: Clone> {
    states: Mutex<HashMap<String, KeyState<T>>>,
    inflight: Mutex<HashMap<String, broadcast::Sender<Result<T, WeatherError>>>>,
}

impl<T: Clone> QueryCell<T> {
    fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    fn mark_fetching(&self, city: &str) {
        let mut states = self.states.lock();
        states.entry(city.to_string()).or_default().state = QueryState::Fetching;
    }

    fn apply(&self, city: &str, outcome: &Result<T, WeatherError>) {
        let mut states = self.states.lock();
        let entry = states.entry(city.to_string()).or_default();
        match outcome {
            Ok(data) => {
                entry.state = QueryState::Fresh;
                entry.data = Some(data.clone());
                entry.error = None;
            }
            Err(e) => {
                // The last successful result stays servable alongside the
                // surfaced error.
                entry.state = QueryState::Failed;
                entry.error = Some(e.clone());
            }
        }
    }

    fn snapshot(&self, city: &str) -> QuerySnapshot<T> {
        self.states
            .lock()
            .get(city)
            .map(|entry| QuerySnapshot {
                data: entry.data.clone(),
                error: entry.error.clone(),
                is_loading: entry.state == QueryState::Fetching,
            })
            .unwrap_or_default()
    }

    fn state(&self, city: &str) -> QueryState {
        self.states
            .lock()
            .get(city)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }
}

enum Role<T> {
    Leader(broadcast::Sender<Result<T, WeatherError>>),
    Follower(broadcast::Receiver<Result<T, WeatherError>>),
}

/// Run one deduplicated, auto-retried query for `city`.
async fn run_query<T, F, Fut>(
    cell: &QueryCell<T>,
    endpoint: Endpoint,
    city: &str,
    policy: &RetryPolicy,
    fetch: F,
) -> Result<T, WeatherError>
where
    T: Clone,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, WeatherError>>,
{
    let role = {
        let mut inflight = cell.inflight.lock();
        match inflight.get(city) {
            Some(tx) => Role::Follower(tx.subscribe()),
            None => {
                let (tx, _) = broadcast::channel(1);
                inflight.insert(city.to_string(), tx.clone());
                Role::Leader(tx)
            }
        }
    };

    match role {
        Role::Follower(mut rx) => {
            tracing::debug!(%endpoint, city, "fetch already in flight, awaiting shared outcome");
            match rx.recv().await {
                Ok(outcome) => outcome,
                Err(_) => Err(WeatherError::Unavailable(endpoint)),
            }
        }
        Role::Leader(tx) => {
            cell.mark_fetching(city);
            let outcome = retry_loop(endpoint, policy, &fetch).await;
            cell.inflight.lock().remove(city);
            cell.apply(city, &outcome);
            let _ = tx.send(outcome.clone());
            outcome
        }
    }
}

async fn retry_loop<T, F, Fut>(
    endpoint: Endpoint,
    policy: &RetryPolicy,
    fetch: &F,
) -> Result<T, WeatherError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, WeatherError>>,
{
    let mut attempt = 0;
    loop {
        match fetch().await {
            Ok(data) => {
                if attempt > 0 {
                    tracing::info!(%endpoint, attempt, "query succeeded after retry");
                }
                return Ok(data);
            }
            Err(e) if !e.is_retryable() => {
                tracing::warn!(%endpoint, "rate limited, automatic retry suppressed");
                return Err(e);
            }
            Err(e) if attempt >= policy.max_retries => {
                tracing::warn!(%endpoint, attempts = attempt + 1, "query failed, retries exhausted: {}", e);
                return Err(e);
            }
            Err(e) => {
                attempt += 1;
                tracing::debug!(%endpoint, attempt, "query failed, retrying: {}", e);
                tokio::time::sleep(policy.retry_delay).await;
            }
        }
    }
}

/// Cache-aware, deduplicated, auto-retried weather queries for the active
/// city, on behalf of the presentation layer.
pub struct WeatherQueries {
    client: Arc<WeatherClient>,
    policy: RetryPolicy,
    active_city: Mutex<Option<String>>,
    current: QueryCell<WeatherSnapshot>,
    forecast: QueryCell<Vec<ForecastPoint>>,
}

impl WeatherQueries {
    pub fn new(client: Arc<WeatherClient>) -> Self {
        Self::with_policy(client, RetryPolicy::default())
    }

    pub fn with_policy(client: Arc<WeatherClient>, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            active_city: Mutex::new(None),
            current: QueryCell::new(),
            forecast: QueryCell::new(),
        }
    }

    /// Make `city` the active query key and trigger both fetches. Blank
    /// input leaves the orchestrator idle: no network activity, no error.
    ///
    /// Switching away from a city does not cancel its in-flight work; the
    /// result simply stops being consumed and stays cached for reuse.
    pub async fn search_city(&self, city: &str) {
        if city.trim().is_empty() {
            *self.active_city.lock() = None;
            return;
        }
        *self.active_city.lock() = Some(city.to_string());
        self.refresh(city).await;
    }

    /// Re-trigger both fetches for the active city, regardless of any
    /// previously surfaced failure. A still-valid cache entry is reused;
    /// only the retry-count bookkeeping is bypassed.
    pub async fn retry(&self) {
        let city = { self.active_city.lock().clone() };
        let Some(city) = city else { return };
        self.refresh(&city).await;
    }

    /// Presentation view of the current-conditions query for the active
    /// city.
    pub fn current(&self) -> QuerySnapshot<WeatherSnapshot> {
        match self.active_city() {
            Some(city) => self.current.snapshot(&city),
            None => QuerySnapshot::default(),
        }
    }

    /// Presentation view of the forecast query for the active city.
    pub fn forecast(&self) -> QuerySnapshot<Vec<ForecastPoint>> {
        match self.active_city() {
            Some(city) => self.forecast.snapshot(&city),
            None => QuerySnapshot::default(),
        }
    }

    /// State machine position of the current-conditions query for `city`.
    pub fn current_state(&self, city: &str) -> QueryState {
        self.current.state(city)
    }

    /// State machine position of the forecast query for `city`.
    pub fn forecast_state(&self, city: &str) -> QueryState {
        self.forecast.state(city)
    }

    pub fn active_city(&self) -> Option<String> {
        self.active_city.lock().clone()
    }

    async fn refresh(&self, city: &str) {
        let current_client = Arc::clone(&self.client);
        let current_city = city.to_string();
        let fetch_current = move || {
            let client = Arc::clone(&current_client);
            let city = current_city.clone();
            async move { client.fetch_current(&city).await }
        };

        let forecast_client = Arc::clone(&self.client);
        let forecast_city = city.to_string();
        let fetch_forecast = move || {
            let client = Arc::clone(&forecast_client);
            let city = forecast_city.clone();
            async move { client.fetch_forecast(&city).await }
        };

        let _ = tokio::join!(
            run_query(&self.current, Endpoint::Current, city, &self.policy, fetch_current),
            run_query(&self.forecast, Endpoint::Forecast, city, &self.policy, fetch_forecast),
        );
    }
}
