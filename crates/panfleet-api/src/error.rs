use thiserror::Error;

/// Top-level error type for the `panfleet-api` crate.
///
/// Covers every failure mode of a manager API call: authentication,
/// transport, TLS trust, command translation, and envelope decoding.
/// `panfleet-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Key generation failed (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The manager rejected the session's API key (expired or revoked).
    /// Re-authentication is the caller's decision; the session never
    /// retries with the same credential on its own.
    #[error("API key rejected -- re-authentication required")]
    KeyExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Certificate trust failure. Never downgraded silently -- the
    /// caller must explicitly opt into an insecure retry, and only for
    /// a single call.
    #[error("TLS trust failure: {0}")]
    Tls(String),

    // ── Management API ──────────────────────────────────────────────
    /// The manager answered with a non-success status in the response
    /// envelope. Recoverable -- batch operations keep going.
    #[error("API returned status '{status}': {message}")]
    Api { status: String, message: String },

    /// Requested device, template, or device group is not in the fleet.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Command text that the translation grammar does not cover.
    /// Rejected before any network call.
    #[error("Unsupported command syntax: {0}")]
    UnsupportedCommand(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The response body was not well-formed XML.
    #[error("Malformed XML response: {0}")]
    Xml(String),
}

impl Error {
    /// Returns `true` if this error indicates the credential or key is
    /// bad and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::KeyExpired)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
