pub mod config;
pub mod database;

pub use config::{Config, CrmConfig, QrEntry, ScreeningConfig};
pub use database::{Database, ZoneStats};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/nephroscreen[-dev]/` based on NEPHROSCREEN_ENV.
///
/// Set NEPHROSCREEN_ENV=dev to use the development data directory, or
/// NEPHROSCREEN_DATA_DIR to override the location entirely (tests use
/// this with a temporary directory).
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = if let Ok(override_dir) = std::env::var("NEPHROSCREEN_DATA_DIR") {
        PathBuf::from(override_dir)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("NEPHROSCREEN_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("nephroscreen-dev")
        } else {
            base_dir.join("nephroscreen")
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
