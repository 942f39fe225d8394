//! Owned preference store for the two persisted user choices:
//! temperature unit and dark mode.
//!
//! Loaded once at startup, saved on every change. Default resolution
//! order for dark mode: saved value, then the `SKYCAST_DARK_MODE`
//! environment signal, then light. The temperature unit hard-defaults to
//! Celsius.

use anyhow::Result;
use std::path::Path;

use crate::config::{Config, TemperatureUnit};

/// Environment signal consulted when no dark-mode choice was ever saved.
pub const DARK_MODE_ENV: &str = "SKYCAST_DARK_MODE";

/// Resolve the effective dark-mode value from a saved choice and an
/// optional environment signal.
fn resolve_dark_mode(saved: Option<bool>, env_value: Option<&str>) -> bool {
    if let Some(saved) = saved {
        return saved;
    }
    match env_value {
        Some(v) => matches!(v.trim(), "1" | "true" | "dark"),
        None => false,
    }
}

/// Preference store backed by the config file. Pass by reference to
/// consumers; there is no global instance.
#[derive(Debug)]
pub struct PreferenceStore {
    config: Config,
}

impl PreferenceStore {
    /// Load preferences from the default config location.
    pub fn load() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    /// Load preferences from a specific config directory.
    pub fn load_from(config_dir: &Path) -> Result<Self> {
        Ok(Self {
            config: Config::load_from(config_dir)?,
        })
    }

    /// Wrap an already-loaded config.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current temperature unit.
    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.config.ui.temperature_unit
    }

    /// Flip the temperature unit and persist the choice.
    pub fn toggle_temperature_unit(&mut self) -> Result<TemperatureUnit> {
        let next = self.config.ui.temperature_unit.toggled();
        self.config.ui.temperature_unit = next;
        self.config.save()?;
        tracing::debug!(unit = next.symbol(), "temperature unit changed");
        Ok(next)
    }

    /// Effective dark-mode value (saved choice, env signal, then light).
    pub fn dark_mode(&self) -> bool {
        resolve_dark_mode(
            self.config.ui.dark_mode,
            std::env::var(DARK_MODE_ENV).ok().as_deref(),
        )
    }

    /// Record an explicit dark-mode choice and persist it.
    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<()> {
        self.config.ui.dark_mode = Some(enabled);
        self.config.save()?;
        tracing::debug!(enabled, "dark mode changed");
        Ok(())
    }
}
