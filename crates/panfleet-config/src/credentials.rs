// Credential storage capability.
//
// The rest of the workspace only ever sees the `CredentialStore` trait;
// which backend is wired in is the application's choice. Everything
// keeps working when `get` always returns `None` -- the caller then
// prompts for credentials each session.
//
// Secrets are keyed by (endpoint, principal). The principal is a
// username for passwords, or a fixed marker for a stored API key.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::SERVICE_NAME;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential backend error: {0}")]
    Backend(String),

    #[error("credential file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential file is corrupt: {0}")]
    Corrupt(String),
}

/// Get/set/delete of one secret per (endpoint, principal) pair.
///
/// `delete` is idempotent: deleting an absent entry succeeds.
pub trait CredentialStore: Send + Sync {
    fn get(&self, endpoint: &str, principal: &str)
    -> Result<Option<SecretString>, CredentialError>;

    fn set(
        &self,
        endpoint: &str,
        principal: &str,
        secret: &SecretString,
    ) -> Result<(), CredentialError>;

    fn delete(&self, endpoint: &str, principal: &str) -> Result<(), CredentialError>;
}

// ── OS keyring ──────────────────────────────────────────────────────

/// Secrets in the platform keychain (macOS Keychain, Windows Credential
/// Manager, Secret Service).
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_owned(),
        }
    }

    fn entry(&self, endpoint: &str, principal: &str) -> Result<keyring::Entry, CredentialError> {
        keyring::Entry::new(&format!("{}:{endpoint}", self.service), principal)
            .map_err(|e| CredentialError::Backend(e.to_string()))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn get(
        &self,
        endpoint: &str,
        principal: &str,
    ) -> Result<Option<SecretString>, CredentialError> {
        match self.entry(endpoint, principal)?.get_password() {
            Ok(secret) => Ok(Some(SecretString::from(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::Backend(e.to_string())),
        }
    }

    fn set(
        &self,
        endpoint: &str,
        principal: &str,
        secret: &SecretString,
    ) -> Result<(), CredentialError> {
        self.entry(endpoint, principal)?
            .set_password(secret.expose_secret())
            .map_err(|e| CredentialError::Backend(e.to_string()))
    }

    fn delete(&self, endpoint: &str, principal: &str) -> Result<(), CredentialError> {
        match self.entry(endpoint, principal)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Backend(e.to_string())),
        }
    }
}

// ── Restricted fallback file ────────────────────────────────────────

/// Plaintext JSON fallback for hosts without a usable keyring.
///
/// The file is created with owner-only permissions. This is the
/// degraded path, selected by the application only when the keyring is
/// unavailable.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<HashMap<String, String>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|e| CredentialError::Corrupt(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(CredentialError::Io(e)),
        }
    }

    fn store(&self, entries: &HashMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = serde_json::to_string_pretty(entries)
            .map_err(|e| CredentialError::Corrupt(e.to_string()))?;
        std::fs::write(&self.path, rendered)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    fn key(endpoint: &str, principal: &str) -> String {
        format!("{endpoint}|{principal}")
    }
}

impl CredentialStore for FileStore {
    fn get(
        &self,
        endpoint: &str,
        principal: &str,
    ) -> Result<Option<SecretString>, CredentialError> {
        let entries = self.load()?;
        Ok(entries
            .get(&Self::key(endpoint, principal))
            .map(|s| SecretString::from(s.clone())))
    }

    fn set(
        &self,
        endpoint: &str,
        principal: &str,
        secret: &SecretString,
    ) -> Result<(), CredentialError> {
        let mut entries = self.load()?;
        entries.insert(
            Self::key(endpoint, principal),
            secret.expose_secret().to_owned(),
        );
        self.store(&entries)
    }

    fn delete(&self, endpoint: &str, principal: &str) -> Result<(), CredentialError> {
        let mut entries = self.load()?;
        if entries.remove(&Self::key(endpoint, principal)).is_some() {
            self.store(&entries)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

// ── In-memory ───────────────────────────────────────────────────────

/// Volatile store for tests and single-invocation use.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(
        &self,
        endpoint: &str,
        principal: &str,
    ) -> Result<Option<SecretString>, CredentialError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        Ok(entries
            .get(&(endpoint.to_owned(), principal.to_owned()))
            .map(|s| SecretString::from(s.clone())))
    }

    fn set(
        &self,
        endpoint: &str,
        principal: &str,
        secret: &SecretString,
    ) -> Result<(), CredentialError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        entries.insert(
            (endpoint.to_owned(), principal.to_owned()),
            secret.expose_secret().to_owned(),
        );
        Ok(())
    }

    fn delete(&self, endpoint: &str, principal: &str) -> Result<(), CredentialError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        entries.remove(&(endpoint.to_owned(), principal.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("creds.json"));

        assert!(store.get("mgr", "ops").expect("get").is_none());

        store.set("mgr", "ops", &secret("pw-1")).expect("set");
        let loaded = store.get("mgr", "ops").expect("get").expect("present");
        assert_eq!(loaded.expose_secret(), "pw-1");

        store.delete("mgr", "ops").expect("delete");
        assert!(store.get("mgr", "ops").expect("get").is_none());
        // Idempotent delete.
        store.delete("mgr", "ops").expect("delete twice");
    }

    #[test]
    fn file_store_separates_principals() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("creds.json"));

        store.set("mgr", "alpha", &secret("a")).expect("set");
        store.set("mgr", "beta", &secret("b")).expect("set");
        store.set("other", "alpha", &secret("c")).expect("set");

        assert_eq!(
            store
                .get("mgr", "alpha")
                .expect("get")
                .expect("present")
                .expose_secret(),
            "a"
        );
        assert_eq!(
            store
                .get("other", "alpha")
                .expect("get")
                .expect("present")
                .expose_secret(),
            "c"
        );
    }

    #[cfg(unix)]
    #[test]
    fn file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("creds.json");
        let store = FileStore::new(path.clone());
        store.set("mgr", "ops", &secret("pw")).expect("set");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.set("mgr", "ops", &secret("pw")).expect("set");
        assert_eq!(
            store
                .get("mgr", "ops")
                .expect("get")
                .expect("present")
                .expose_secret(),
            "pw"
        );
        store.delete("mgr", "ops").expect("delete");
        assert!(store.get("mgr", "ops").expect("get").is_none());
    }
}
