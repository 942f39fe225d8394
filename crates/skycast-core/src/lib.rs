//! Skycast core: configuration, user preferences, and logging setup.

pub mod config;
pub mod prefs;

pub use config::{Config, ProviderConfig, TemperatureUnit, UiConfig};
pub use prefs::PreferenceStore;

use anyhow::Result;

/// Initialize tracing for the application.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Skycast core initialized");
    Ok(())
}
