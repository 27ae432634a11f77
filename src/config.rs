use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date_utils::DEFAULT_MAX_OCCURRENCES;
use crate::models::{ClinicType, FutureDeleteMode, Provider};

/// Application-level constants
pub const APP_NAME: &str = "Shiftcal";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/Shiftcal/ on all platforms
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the shift database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("shifts.db")
}

/// Get the calendar configuration file path
pub fn config_path() -> PathBuf {
    app_data_dir().join("config.json")
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "shiftcal_lib=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Calendar behaviour knobs, injected once into the calendar service.
///
/// Every field falls back to its default when missing from `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarConfig {
    /// Cap on occurrences generated per recurring shift.
    pub max_occurrences: usize,
    /// How a "future" series delete is read.
    pub future_delete_mode: FutureDeleteMode,
    /// Shown when no providers have been stored yet.
    pub default_providers: Vec<Provider>,
    /// Shown when no clinic types have been stored yet.
    pub default_clinic_types: Vec<ClinicType>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            future_delete_mode: FutureDeleteMode::default(),
            default_providers: vec![
                Provider {
                    id: "default-provider-1".into(),
                    name: "Provider 1".into(),
                    credentials: Some("MD".into()),
                },
                Provider {
                    id: "default-provider-2".into(),
                    name: "Provider 2".into(),
                    credentials: Some("NP".into()),
                },
            ],
            default_clinic_types: vec![
                ClinicType {
                    id: "default-clinic-primary".into(),
                    name: "Primary Care".into(),
                    color: "#2563eb".into(),
                },
                ClinicType {
                    id: "default-clinic-urgent".into(),
                    name: "Urgent Care".into(),
                    color: "#dc2626".into(),
                },
                ClinicType {
                    id: "default-clinic-telehealth".into(),
                    name: "Telehealth".into(),
                    color: "#16a34a".into(),
                },
            ],
        }
    }
}

impl CalendarConfig {
    /// Read configuration from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No calendar config, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            future_delete_mode = %config.future_delete_mode,
            "Calendar config loaded"
        );
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
