//! Shared configuration for the panfleet tools: TOML profiles merged
//! with environment overrides, and the credential-store capability.
//!
//! A [`Profile`] names a manager endpoint and its connection defaults.
//! Secrets never live in the config file -- they go through a
//! [`CredentialStore`](credentials::CredentialStore) implementation
//! (OS keyring, restricted fallback file, or in-memory).
//!
//! Note the absence of an "insecure" profile field: skipping
//! certificate verification is a per-invocation decision and is never
//! persisted as a default.

pub mod credentials;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use credentials::{CredentialStore, FileStore, KeyringStore, MemoryStore};

/// Keyring service / fallback-file namespace.
pub const SERVICE_NAME: &str = "panfleet";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("failed to write configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The on-disk configuration: named profiles plus a default selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// Connection defaults for one manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Manager hostname, `host:port`, or full URL.
    pub manager: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Custom CA certificate (PEM) to trust for this manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Fleet worker-pool bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    /// Aggregate deadline for fleet runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

/// Default location of the config file.
pub fn config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", SERVICE_NAME)
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("panfleet.toml"))
}

/// Load configuration from a TOML file merged with `PANFLEET_*`
/// environment overrides (e.g. `PANFLEET_DEFAULT_PROFILE`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("PANFLEET_"))
        .extract()
        .map_err(|e| ConfigError::Load(Box::new(e)))
}

/// Load from the default path, falling back to an empty config when the
/// file does not exist or cannot be read.
pub fn load_config_or_default() -> Config {
    load_config(&config_path()).unwrap_or_default()
}

/// Persist the configuration, creating parent directories as needed.
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rendered = toml::to_string_pretty(config)?;
    std::fs::write(path, rendered)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.default_profile = Some("prod".into());
        config.profiles.insert(
            "prod".into(),
            Profile {
                manager: "manager.example.com".into(),
                username: Some("ops".into()),
                ca_cert: None,
                timeout_secs: Some(15),
                concurrency: Some(8),
                deadline_secs: None,
            },
        );

        save_config(&config, &path).expect("save");
        let loaded = load_config(&path).expect("load");

        assert_eq!(loaded.default_profile.as_deref(), Some("prod"));
        let profile = &loaded.profiles["prod"];
        assert_eq!(profile.manager, "manager.example.com");
        assert_eq!(profile.timeout_secs, Some(15));
        assert_eq!(profile.concurrency, Some(8));
    }

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(&dir.path().join("absent.toml")).expect("load");
        assert!(config.profiles.is_empty());
    }
}
