//! Provider wire schemas and the domain values mapped from them.
//!
//! Wire types mirror the provider's current-conditions and 5-day/3-hour
//! forecast JSON; only the consumed fields are declared. Domain values
//! are immutable once mapped and always carry canonical Celsius.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of 3-hour forecast steps kept per fetch (~ next 24 hours).
pub const FORECAST_POINTS: usize = 8;

// ---- Provider wire format ----

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCurrentResponse {
    pub name: String,
    pub main: ApiMain,
    pub weather: Vec<ApiConditionEntry>,
    pub wind: ApiWind,
    #[serde(default)]
    pub visibility: Option<u32>,
    pub sys: ApiSys,
    pub clouds: ApiClouds,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMain {
    pub temp: f64,
    pub humidity: u8,
    pub feels_like: f64,
    pub pressure: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConditionEntry {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiWind {
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSys {
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiClouds {
    pub all: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiForecastResponse {
    pub list: Vec<ApiForecastEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiForecastEntry {
    pub dt: i64,
    pub dt_txt: String,
    pub main: ApiForecastMain,
    pub weather: Vec<ApiConditionEntry>,
    pub wind: ApiWind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiForecastMain {
    pub temp: f64,
    pub humidity: u8,
}

// ---- Domain values ----

/// One fetched, immutable current-conditions result.
/// Temperatures are canonical Celsius; display conversion happens in the
/// presentation layer and never touches these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: String,
    pub icon: String,
    pub feels_like: f64,
    pub pressure: u32,
    pub visibility: Option<u32>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub cloudiness: u8,
    pub captured_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn from_api(api: ApiCurrentResponse, captured_at: DateTime<Utc>) -> Self {
        let (condition, icon) = primary_condition(api.weather);
        Self {
            city: api.name,
            temperature: api.main.temp,
            humidity: api.main.humidity,
            wind_speed: api.wind.speed,
            condition,
            icon,
            feels_like: api.main.feels_like,
            pressure: api.main.pressure,
            visibility: api.visibility,
            sunrise: DateTime::from_timestamp(api.sys.sunrise, 0).unwrap_or_default(),
            sunset: DateTime::from_timestamp(api.sys.sunset, 0).unwrap_or_default(),
            cloudiness: api.clouds.all,
            captured_at,
        }
    }
}

/// One 3-hour forecast step, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub label: String,
    pub temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: String,
    pub icon: String,
}

impl ForecastPoint {
    pub fn from_api(entry: ApiForecastEntry) -> Self {
        let (condition, icon) = primary_condition(entry.weather);
        Self {
            time: DateTime::from_timestamp(entry.dt, 0).unwrap_or_default(),
            label: entry.dt_txt,
            temperature: entry.main.temp,
            humidity: entry.main.humidity,
            wind_speed: entry.wind.speed,
            condition,
            icon,
        }
    }
}

/// The provider reports an array of condition entries; the first one is
/// the headline condition.
fn primary_condition(weather: Vec<ApiConditionEntry>) -> (String, String) {
    weather
        .into_iter()
        .next()
        .map(|w| (w.description, w.icon))
        .unwrap_or_default()
}
