//! Runtime configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const APP_NAME: &str = "patient-registry";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_DATABASE: &str = "PATIENT_REGISTRY_DB";
pub const ENV_EXPORT_DIR: &str = "PATIENT_REGISTRY_EXPORT_DIR";
pub const ENV_LOG: &str = "PATIENT_REGISTRY_LOG";
pub const ENV_BANNER_MS: &str = "PATIENT_REGISTRY_BANNER_MS";

/// Default tracing filter when neither `RUST_LOG` nor `PATIENT_REGISTRY_LOG` is set.
pub fn default_log_filter() -> &'static str {
    "info,patient_registry_core=info"
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// SQLite file; `None` keeps everything in memory for the session
    pub database_path: Option<PathBuf>,
    /// Where exported JSON files are written
    pub export_dir: PathBuf,
    pub log_filter: String,
    /// How long the registration success banner stays up
    pub success_banner: Duration,
    /// How long the "Copied!" acknowledgement stays up
    pub copy_ack: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            export_dir: PathBuf::from("."),
            log_filter: default_log_filter().to_string(),
            success_banner: Duration::from_secs(3),
            copy_ack: Duration::from_secs(2),
        }
    }
}

impl RegistryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DATABASE).filter(|v| !v.trim().is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup(ENV_EXPORT_DIR).filter(|v| !v.trim().is_empty()) {
            config.export_dir = PathBuf::from(dir);
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }
        if let Some(raw) = lookup(ENV_BANNER_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.success_banner = Duration::from_millis(ms),
                Err(_) => warn!("{} is not a number ({:?}), using default", ENV_BANNER_MS, raw),
            }
        }

        config
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn in_memory(&self) -> bool {
        self.database_path.is_none()
    }
}
