// panfleet-api: Async Rust client for the fleet manager's XML management API

pub mod command;
pub mod error;
pub mod model;
pub mod redact;
pub mod response;
pub mod session;
pub mod transport;
pub mod tree;

pub use command::TestCommand;
pub use error::Error;
pub use model::{Device, DeviceGroupMember, SyncStatus, SystemInfo, TemplateMember};
pub use redact::{REDACTED, Redactor};
pub use response::ApiResponse;
pub use session::{ConfigScope, Session};
pub use transport::{RetryPolicy, TlsMode, TransportConfig};
pub use tree::{ConfigTree, Element};
