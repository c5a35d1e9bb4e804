// Shared transport configuration for building reqwest::Client instances.
//
// Session construction and the one-shot insecure retry path both build
// their clients through this module, so TLS, timeout, and retry settings
// live in exactly one place.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store (default).
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate. Never a default -- callers must opt in
    /// explicitly, and the opt-in is never written back to configuration.
    DangerAcceptInvalid,
}

/// Bounded retry for transient HTTP statuses (429 and 5xx).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Disable retries entirely.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Connection pooling and keep-alive come with the client; dropping
    /// the owning session releases the idle pool.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("panfleet/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// A copy of this config with verification disabled, for a single
    /// explicitly requested retry. The original config is untouched.
    pub fn insecure_once(&self) -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: self.timeout,
            retry: self.retry.clone(),
        }
    }
}

/// Send a GET request with the given query parameters, retrying transient
/// HTTP statuses per the policy.
///
/// Transport failures are classified into the error taxonomy here:
/// timeouts become [`Error::Timeout`], certificate failures become
/// [`Error::Tls`], everything else stays [`Error::Transport`].
pub(crate) async fn get_with_retry(
    client: &reqwest::Client,
    url: Url,
    params: &[(&str, &str)],
    config: &TransportConfig,
) -> Result<reqwest::Response, Error> {
    let mut attempt: u32 = 0;
    loop {
        let result = client.get(url.clone()).query(params).send().await;
        match result {
            Ok(resp) if is_retryable_status(resp.status()) && attempt < config.retry.max_retries => {
                attempt += 1;
                let pause = config.retry.backoff * attempt;
                warn!(
                    status = %resp.status(),
                    attempt,
                    "transient HTTP status, retrying in {:?}",
                    pause
                );
                tokio::time::sleep(pause).await;
            }
            Ok(resp) => {
                debug!(status = %resp.status(), "GET {}", url.host_str().unwrap_or("?"));
                return Ok(resp);
            }
            Err(e) => return Err(classify(e, config.timeout)),
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Map a `reqwest::Error` into the crate taxonomy.
fn classify(e: reqwest::Error, timeout: Duration) -> Error {
    if e.is_timeout() {
        return Error::Timeout {
            timeout_secs: timeout.as_secs(),
        };
    }
    if is_certificate_error(&e) {
        return Error::Tls(e.to_string());
    }
    Error::Transport(e)
}

/// Walk the source chain looking for a certificate / TLS handshake
/// failure. rustls reports these as hyper connect errors, so the
/// variant is not directly observable on `reqwest::Error`.
fn is_certificate_error(e: &reqwest::Error) -> bool {
    if !e.is_connect() {
        return false;
    }
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        let text = cause.to_string();
        if text.contains("certificate") || text.contains("UnknownIssuer") || text.contains("tls") {
            return true;
        }
        source = cause.source();
    }
    false
}
