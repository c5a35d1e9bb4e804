//! Business logic between `panfleet-api` and its consumers (CLI or
//! other frontends).
//!
//! This crate owns the fleet-level orchestration and the drift engine:
//!
//! - **[`FleetFetcher`]** — semaphore-bounded concurrent fan-out of one
//!   operation across many devices, with per-device failure isolation
//!   and an aggregate deadline. One result entry per device, always.
//!
//! - **[`drift`]** — recursive structural diff between a template's
//!   configuration tree and a device's effective tree, plus the quick
//!   local-override scan over the device-local `network` subtree.
//!
//! - **[`ManagerConfig`] / [`FleetConfig`]** — explicit context objects
//!   for session construction and fleet bounds. Nothing here reads
//!   global state; the surrounding application decides where values
//!   come from.

pub mod config;
pub mod drift;
pub mod error;
pub mod fleet;

pub use config::{FleetConfig, ManagerConfig, TlsVerification};
pub use drift::{DriftFinding, DriftKind, DriftReport};
pub use error::CoreError;
pub use fleet::{FleetFetcher, FleetResults, drift_sweep, fetch_running_configs, run_on_fleet};

// The wire types flow through unchanged; re-export for consumers.
pub use panfleet_api::{
    ApiResponse, ConfigScope, ConfigTree, Device, DeviceGroupMember, Element, Redactor, Session,
    SyncStatus, SystemInfo, TemplateMember,
};
