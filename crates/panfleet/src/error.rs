//! CLI error types with miette diagnostics.
//!
//! Maps api/core errors into user-facing errors with actionable help
//! text: a bad credential, an unreachable host, and an untrusted
//! certificate each read differently and exit differently.

use miette::Diagnostic;
use thiserror::Error;

use panfleet_config::ConfigError;
use panfleet_config::credentials::CredentialError;

/// Exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach manager at {endpoint}")]
    #[diagnostic(
        code(panfleet::connection_failed),
        help("Check that the manager is up and the hostname resolves.\nEndpoint: {endpoint}")
    )]
    ConnectionFailed {
        endpoint: String,
        #[source]
        source: panfleet_api::Error,
    },

    #[error("Certificate verification failed for {endpoint}")]
    #[diagnostic(
        code(panfleet::tls_error),
        help(
            "The manager's certificate is not trusted.\n\
             Use --insecure (-k) to accept it for this invocation only,\n\
             or set ca_cert in your profile to the manager's CA."
        )
    )]
    TlsError { endpoint: String, detail: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(panfleet::timeout),
        help("Raise --timeout, or --deadline for fleet-wide operations.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(panfleet::auth_failed),
        help("Verify the username and password, then run: panfleet login")
    )]
    AuthFailed { message: String },

    #[error("API key rejected by the manager")]
    #[diagnostic(
        code(panfleet::key_expired),
        help("The stored key has expired or was revoked. Run: panfleet login")
    )]
    KeyExpired,

    #[error("No stored API key for profile '{profile}'")]
    #[diagnostic(
        code(panfleet::no_credentials),
        help("Authenticate first: panfleet login --profile {profile}")
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{kind} '{name}' not found")]
    #[diagnostic(code(panfleet::not_found))]
    NotFound { kind: String, name: String },

    #[error("Unsupported command: {command}")]
    #[diagnostic(
        code(panfleet::unsupported_command),
        help(
            "Supported test commands:\n\
             \x20 test vpn ike-sa [gateway <name>]\n\
             \x20 test vpn ipsec-sa [tunnel <name>]\n\
             \x20 test routing fib-lookup virtual-router <vr> ip <addr>\n\
             Show commands follow `show <words...>`; op XML is passed through."
        )
    )]
    UnsupportedCommand { command: String },

    #[error("Manager API error: {message}")]
    #[diagnostic(code(panfleet::api_error))]
    Api { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(panfleet::validation))]
    Validation { field: String, reason: String },

    #[error("No manager configured")]
    #[diagnostic(
        code(panfleet::no_config),
        help("Pass --manager <host>, or create a profile in {path}")
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(panfleet::config))]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(panfleet::credentials))]
    Credential(#[from] CredentialError),

    #[error("Malformed response: {0}")]
    #[diagnostic(code(panfleet::bad_response))]
    BadResponse(String),

    #[error("Prompt failed: {0}")]
    #[diagnostic(code(panfleet::prompt))]
    Prompt(String),

    #[error("Cancelled")]
    #[diagnostic(code(panfleet::cancelled))]
    Cancelled,
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        Self::Prompt(e.to_string())
    }
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::KeyExpired | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::UnsupportedCommand { .. } | Self::Validation { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Fold an api error into the CLI taxonomy, attaching the endpoint
    /// for connection-class failures.
    pub fn from_api(e: panfleet_api::Error, endpoint: &str) -> Self {
        use panfleet_api::Error as Api;
        match e {
            Api::Tls(detail) => Self::TlsError {
                endpoint: endpoint.to_owned(),
                detail,
            },
            Api::Timeout { .. } => Self::Timeout,
            Api::Authentication { message } => Self::AuthFailed { message },
            Api::KeyExpired => Self::KeyExpired,
            Api::NotFound { kind, name } => Self::NotFound {
                kind: kind.to_owned(),
                name,
            },
            Api::UnsupportedCommand(command) => Self::UnsupportedCommand { command },
            Api::Api { status, message } => Self::Api {
                message: format!("status '{status}': {message}"),
            },
            Api::Xml(detail) => Self::BadResponse(detail),
            e @ (Api::Transport(_) | Api::InvalidUrl(_)) => Self::ConnectionFailed {
                endpoint: endpoint.to_owned(),
                source: e,
            },
        }
    }
}
