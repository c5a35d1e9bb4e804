//! CLI configuration -- thin wrapper around `panfleet_config` shared
//! types, plus resolution that respects `GlobalOpts` flag overrides.
//!
//! Precedence is flag > environment > profile for every value. The
//! `--insecure` flag is deliberately not resolvable from a profile:
//! skipping verification is a per-invocation decision.

use std::time::Duration;

use panfleet_config::credentials::{CredentialStore, FileStore, KeyringStore};
use panfleet_core::{FleetConfig, ManagerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use panfleet_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Principal under which the issued API key is stored.
pub const API_KEY_PRINCIPAL: &str = "__api-key__";

// ── Resolution ──────────────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Everything a command needs to talk to the manager.
pub struct Resolved {
    pub profile_name: String,
    pub manager: ManagerConfig,
    pub fleet: FleetConfig,
    pub username: Option<String>,
}

/// Merge profile values with CLI flag overrides into explicit context
/// objects. Works without any profile when `--manager` is given.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Resolved, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = config.profiles.get(&profile_name);

    let endpoint = global
        .manager
        .clone()
        .or_else(|| profile.map(|p| p.manager.clone()))
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;

    let tls = if global.insecure {
        // Per-invocation opt-out; there is no profile field for this.
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca) = profile.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca)
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout_secs = global
        .timeout
        .or_else(|| profile.and_then(|p| p.timeout_secs))
        .unwrap_or(10);

    let mut manager = ManagerConfig::new(endpoint);
    manager.tls = tls;
    manager.timeout = Duration::from_secs(timeout_secs);

    let mut fleet = FleetConfig::default();
    if let Some(n) = global
        .concurrency
        .or_else(|| profile.and_then(|p| p.concurrency))
    {
        if n == 0 {
            return Err(CliError::Validation {
                field: "concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        fleet.concurrency = n;
    }
    if let Some(secs) = global
        .deadline
        .or_else(|| profile.and_then(|p| p.deadline_secs))
    {
        fleet.deadline = Some(Duration::from_secs(secs));
    }

    let username = global
        .username
        .clone()
        .or_else(|| profile.and_then(|p| p.username.clone()));

    Ok(Resolved {
        profile_name,
        manager,
        fleet,
        username,
    })
}

/// Pick the credential backend: the OS keyring by default, or the
/// restricted fallback file when one is configured.
pub fn credential_store(global: &GlobalOpts) -> Box<dyn CredentialStore> {
    match &global.credentials_file {
        Some(path) => Box::new(FileStore::new(path.clone())),
        None => Box::new(KeyringStore::new()),
    }
}
