use thiserror::Error;

/// Errors produced by the core layer.
///
/// API failures pass through transparently; the core adds only the
/// failure modes of its own orchestration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] panfleet_api::Error),

    /// The fleet-wide deadline expired before this device resolved.
    /// Completed siblings are unaffected.
    #[error("operation abandoned at the fleet deadline")]
    DeadlineElapsed,

    /// A fleet worker task died (panic or runtime shutdown).
    #[error("fleet worker failed: {0}")]
    Worker(String),
}

impl CoreError {
    /// Either flavor of timeout: per-call or aggregate deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::DeadlineElapsed => true,
            Self::Api(e) => matches!(e, panfleet_api::Error::Timeout { .. }),
            Self::Worker(_) => false,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth_expired())
    }
}
