use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default provider API base. The free OpenWeatherMap tier serves both the
/// current-conditions and forecast endpoints under this root.
pub const DEFAULT_API_BASE: &str = "https://api.openweathermap.org/data/2.5";

/// Environment variable consulted for the provider credential when the
/// config file does not carry one.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Temperature unit preference. Celsius is canonical; Fahrenheit is a
/// display-time conversion only and never alters stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a canonical Celsius value for display in this unit.
    pub fn convert(&self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Display symbol for this unit.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// The other unit.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Weather provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// UI preferences
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for the weather provider API
    pub base_url: String,

    /// Provider API credential (optional, can be set via environment)
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Temperature unit preference
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Dark mode. `None` means the user never chose; the effective value
    /// then falls back to an environment signal (see `prefs`).
    #[serde(default)]
    pub dark_mode: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skycast");

        Self {
            config_dir,
            provider: ProviderConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config directory, creating the
    /// default file if it doesn't exist.
    pub fn load() -> Result<Self> {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skycast");
        Self::load_from(&dir)
    }

    /// Load configuration from `config.toml` under the given directory,
    /// creating a default file if it doesn't exist.
    pub fn load_from(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join("config.toml");

        if !config_path.exists() {
            let config = Self {
                config_dir: config_dir.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Persist the configuration to `config.toml` in its config directory.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(self.config_dir.join("config.toml"), contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        match Url::parse(&self.provider.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        "provider.base_url",
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error("provider.base_url", "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error("provider.base_url", format!("Invalid URL: {}", e));
            }
        }

        if self.provider.api_key.as_deref().map_or(true, str::is_empty) {
            result.add_warning(
                "provider.api_key",
                format!(
                    "No API key configured - set {} or provider.api_key",
                    API_KEY_ENV
                ),
            );
        }

        result
    }
}
