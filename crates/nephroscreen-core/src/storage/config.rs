//! TOML-based application configuration.
//!
//! Stores:
//! - Screening defaults (language, relative-mode switch)
//! - CRM forwarding settings (the webhook URL itself lives in the OS
//!   keyring, not in this file)
//! - The QR directory mapping printed codes to screening locations
//!
//! Configuration is stored at `~/.config/nephroscreen/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::questionnaire::Language;

/// Screening defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    #[serde(default)]
    pub default_language: Language,
    /// Whether a resulted session may restart with identity retained.
    #[serde(default = "default_true")]
    pub allow_relative_mode: bool,
}

/// CRM forwarding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// One QR directory entry: where a printed code is posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrEntry {
    pub location_code: String,
    pub unit: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/nephroscreen/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub screening: ScreeningConfig,
    #[serde(default)]
    pub crm: CrmConfig,
    /// QR number -> screening location.
    #[serde(default)]
    pub qr_codes: HashMap<String, QrEntry>,
}

fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            default_language: Language::default(),
            allow_relative_mode: true,
        }
    }
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screening: ScreeningConfig::default(),
            crm: CrmConfig::default(),
            qr_codes: HashMap::new(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error. Never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let pointer = format!("/{}", key.replace('.', "/"));
        match json.pointer(&pointer)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a scalar config value by dot-separated key. The new value is
    /// parsed against the existing value's type; unknown keys are
    /// rejected rather than inserted.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let pointer = format!("/{}", key.replace('.', "/"));
        let slot = json
            .pointer_mut(&pointer)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let parsed = match slot {
            serde_json::Value::Bool(_) => {
                let b: bool = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as bool"),
                })?;
                serde_json::Value::Bool(b)
            }
            serde_json::Value::Number(_) => {
                let n: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as number"),
                })?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::String(_) => serde_json::Value::String(value.to_string()),
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "only scalar keys can be set".to_string(),
                })
            }
        };
        *slot = parsed;

        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.screening.default_language, Language::English);
        assert_eq!(parsed.crm.timeout_secs, 10);
        assert!(!parsed.crm.enabled);
    }

    #[test]
    fn qr_entries_roundtrip_through_toml() {
        let mut cfg = Config::default();
        cfg.qr_codes.insert(
            "KN-0042".into(),
            QrEntry {
                location_code: "TN-CHN-01".into(),
                unit: "பெரம்பலூர் முகாம்".into(),
            },
        );
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.qr_codes["KN-0042"].unit, "பெரம்பலூர் முகாம்");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("crm.enabled").as_deref(), Some("false"));
        assert_eq!(cfg.get("crm.timeout_secs").as_deref(), Some("10"));
        assert_eq!(
            cfg.get("screening.default_language").as_deref(),
            Some("english")
        );
        assert!(cfg.get("crm.missing_key").is_none());
    }

    #[test]
    fn set_updates_scalars_in_place() {
        let mut cfg = Config::default();
        cfg.set("crm.enabled", "true").unwrap();
        assert!(cfg.crm.enabled);
        cfg.set("crm.timeout_secs", "30").unwrap();
        assert_eq!(cfg.crm.timeout_secs, 30);
        cfg.set("screening.default_language", "tamil").unwrap();
        assert_eq!(cfg.screening.default_language, Language::Tamil);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("crm.nonexistent", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("crm.enabled", "not_a_bool"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_from_writes_default_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(!cfg.crm.enabled);
        assert!(path.exists());

        // Second load reads the file it just wrote.
        let again = Config::load_from(&path).unwrap();
        assert_eq!(again.crm.timeout_secs, cfg.crm.timeout_secs);
    }
}
