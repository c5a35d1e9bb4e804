// Concurrent fleet operations.
//
// Fans one operation out across many devices with a semaphore-bounded
// worker pool. Every device gets exactly one result entry; a failing or
// slow device never disturbs its siblings. The aggregate deadline covers
// queue wait plus execution, so a run over a large fleet has a hard
// upper bound on wall time.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

use panfleet_api::{ConfigScope, Device, Session};

use crate::config::FleetConfig;
use crate::drift::{self, DriftReport, network_subtree};
use crate::error::CoreError;

/// Per-device outcomes of one fleet run, keyed by normalized serial.
pub type FleetResults<T> = BTreeMap<String, Result<T, CoreError>>;

/// Runs one operation across a device set concurrently.
pub struct FleetFetcher {
    config: FleetConfig,
}

impl FleetFetcher {
    pub fn new(config: FleetConfig) -> Self {
        Self { config }
    }

    /// Run `op` for every device, at most `concurrency` in flight.
    ///
    /// Returns one entry per input device, no omissions: success, the
    /// device's own error, or [`CoreError::DeadlineElapsed`] for devices
    /// still unresolved when the aggregate deadline passes. Result order
    /// is by serial, never by completion.
    pub async fn run<T, F, Fut>(&self, devices: &[Device], op: F) -> FleetResults<T>
    where
        T: Send + 'static,
        F: Fn(Device) -> Fut,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let deadline = self.config.deadline.map(|d| Instant::now() + d);
        debug!(
            devices = devices.len(),
            concurrency = self.config.concurrency,
            "starting fleet run"
        );

        let mut handles = Vec::with_capacity(devices.len());
        for device in devices {
            let serial = device.serial.clone();
            let semaphore = Arc::clone(&semaphore);
            let fut = op(device.clone());
            let handle = tokio::spawn(async move {
                let work = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| CoreError::Worker("worker pool closed".into()))?;
                    fut.await
                };
                match deadline {
                    Some(at) => tokio::time::timeout_at(at, work)
                        .await
                        .unwrap_or(Err(CoreError::DeadlineElapsed)),
                    None => work.await,
                }
            });
            handles.push((serial, handle));
        }

        let mut results = FleetResults::new();
        for (serial, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(CoreError::Worker(e.to_string())),
            };
            if let Err(ref e) = outcome {
                warn!(serial = %serial, "device operation failed: {e}");
            }
            results.insert(serial, outcome);
        }
        results
    }
}

/// Check every device's effective configuration against what its
/// template pushed, folding fetch failures into `unavailable` findings.
///
/// The comparison narrows to the device-local `network` subtree, where
/// local overrides live. Reports come back sorted by serial.
pub async fn drift_sweep(
    session: &Arc<Session>,
    devices: &[Device],
    fetcher: &FleetFetcher,
) -> Vec<DriftReport> {
    let results = fetcher
        .run(devices, |device| {
            let session = Arc::clone(session);
            async move { Ok(device_drift(&session, &device.serial).await) }
        })
        .await;

    results
        .into_iter()
        .map(|(serial, outcome)| match outcome {
            Ok(findings) => DriftReport { serial, findings },
            // Deadline and worker failures are also "couldn't check".
            Err(e) => DriftReport {
                serial,
                findings: drift::unavailable(&session.redactor().redact(&e.to_string())),
            },
        })
        .collect()
}

/// Fetch both configuration scopes for one device and diff them.
async fn device_drift(session: &Session, serial: &str) -> Vec<drift::DriftFinding> {
    let pushed = session
        .fetch_config(ConfigScope::PushedTemplate, serial)
        .await;
    let running = session.fetch_config(ConfigScope::Running, serial).await;

    let (pushed, running) = match (pushed, running) {
        (Ok(p), Ok(r)) => (p, r),
        (Err(e), _) | (_, Err(e)) => {
            return drift::unavailable(&session.redactor().redact(&e.to_string()));
        }
    };

    match (network_subtree(&pushed), network_subtree(&running)) {
        (Some(template), Some(device)) => drift::compare(&template, &device),
        (Some(template), None) => drift::compare(&template, &empty_network()),
        (None, Some(device)) if drift::has_meaningful(&device) => {
            // Nothing was pushed for this subtree, yet the device runs
            // real configuration there: a pure local override.
            drift::compare(&empty_network(), &device)
        }
        _ => Vec::new(),
    }
}

fn empty_network() -> panfleet_api::ConfigTree {
    panfleet_api::ConfigTree::from_element(panfleet_api::Element::new("network"))
}

/// Fetch the running configuration of every device.
pub async fn fetch_running_configs(
    session: &Arc<Session>,
    devices: &[Device],
    fetcher: &FleetFetcher,
) -> FleetResults<panfleet_api::ConfigTree> {
    fetcher
        .run(devices, |device| {
            let session = Arc::clone(session);
            async move {
                session
                    .fetch_config(ConfigScope::Running, &device.serial)
                    .await
                    .map_err(CoreError::Api)
            }
        })
        .await
}

/// Run one operational command on every device.
pub async fn run_on_fleet(
    session: &Arc<Session>,
    devices: &[Device],
    fetcher: &FleetFetcher,
    xml_cmd: &str,
) -> FleetResults<panfleet_api::ApiResponse> {
    let cmd: Arc<str> = Arc::from(xml_cmd);
    fetcher
        .run(devices, |device| {
            let session = Arc::clone(session);
            let cmd = Arc::clone(&cmd);
            async move {
                session
                    .run_operational(Some(&device.serial), &cmd)
                    .await
                    .map_err(CoreError::Api)
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn device(serial: &str) -> Device {
        Device {
            hostname: format!("fw-{serial}"),
            serial: serial.to_owned(),
            ip_address: "10.0.0.1".to_owned(),
            model: None,
            sw_version: None,
            connected: true,
            device_group: None,
            template: None,
        }
    }

    #[tokio::test]
    async fn one_entry_per_device_despite_failures() {
        let fetcher = FleetFetcher::new(FleetConfig {
            concurrency: 2,
            deadline: None,
        });
        let devices: Vec<Device> = ["001", "002", "003", "004"]
            .iter()
            .map(|s| device(s))
            .collect();

        let results = fetcher
            .run(&devices, |d| async move {
                if d.serial == "002" {
                    Err(CoreError::Api(panfleet_api::Error::NotFound {
                        kind: "config",
                        name: d.serial,
                    }))
                } else {
                    Ok(d.serial)
                }
            })
            .await;

        assert_eq!(results.len(), 4);
        assert!(results["002"].is_err());
        assert!(results["001"].is_ok());
        assert!(results["003"].is_ok());
        assert!(results["004"].is_ok());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let fetcher = FleetFetcher::new(FleetConfig {
            concurrency: 2,
            deadline: None,
        });
        let devices: Vec<Device> = (0..8).map(|i| device(&format!("{i:03}"))).collect();

        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = fetcher
            .run(&devices, |d| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(d.serial)
                }
            })
            .await;

        assert_eq!(results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2, "worker pool bound violated");
    }

    #[tokio::test]
    async fn deadline_marks_stragglers_without_losing_completions() {
        let fetcher = FleetFetcher::new(FleetConfig {
            concurrency: 4,
            deadline: Some(Duration::from_millis(100)),
        });
        let devices = vec![device("FAST"), device("SLOW")];

        let results = fetcher
            .run(&devices, |d| async move {
                if d.serial == "SLOW" {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                Ok(d.serial)
            })
            .await;

        assert_eq!(results.len(), 2);
        assert!(results["FAST"].is_ok());
        assert!(matches!(
            results["SLOW"],
            Err(ref e) if e.is_timeout()
        ));
    }
}
