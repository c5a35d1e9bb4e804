// Explicit configuration context for sessions and fleet operations.
//
// Everything the core needs travels in these structs -- there is no
// ambient or global state. The surrounding application decides where
// the values come from (profiles, flags, environment).

use std::path::PathBuf;
use std::time::Duration;

use panfleet_api::{RetryPolicy, TlsMode, TransportConfig};

/// Certificate trust policy for a manager connection.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// Verify against the system trust store.
    #[default]
    SystemDefaults,
    /// Verify against a custom CA certificate (PEM file).
    CustomCa(PathBuf),
    /// Skip verification. Only ever set by an explicit, per-invocation
    /// caller choice; never read from stored configuration defaults.
    DangerAcceptInvalid,
}

/// Connection parameters for one manager endpoint.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Hostname, `host:port`, or full URL of the manager.
    pub endpoint: String,
    pub tls: TlsVerification,
    /// Per-call timeout applied by the transport.
    pub timeout: Duration,
}

impl ManagerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            tls: TlsVerification::SystemDefaults,
            timeout: Duration::from_secs(10),
        }
    }

    /// Translate into the api crate's transport configuration.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            retry: RetryPolicy::default(),
        }
    }
}

/// Bounds for fleet-wide concurrent operations.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Maximum simultaneous in-flight device operations. The manager
    /// API is shared and rate-sensitive; this is never unbounded.
    pub concurrency: usize,
    /// Aggregate deadline for a whole fleet run. Devices unresolved at
    /// the deadline are recorded as timed out; completed results are
    /// kept. `None` disables the aggregate bound (per-call timeouts
    /// still apply).
    pub deadline: Option<Duration>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            deadline: Some(Duration::from_secs(40)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_maps_tls_modes() {
        let mut config = ManagerConfig::new("manager.example.com");
        assert!(matches!(config.transport().tls, TlsMode::System));

        config.tls = TlsVerification::DangerAcceptInvalid;
        assert!(matches!(
            config.transport().tls,
            TlsMode::DangerAcceptInvalid
        ));
    }

    #[test]
    fn fleet_defaults_are_bounded() {
        let config = FleetConfig::default();
        assert!(config.concurrency > 0);
        assert!(config.deadline.is_some());
    }
}
