// Output redaction.
//
// Every path that surfaces request/response text -- error messages, raw
// XML views, tracing lines -- routes through a `Redactor`. The session
// owns one and hands it to consumers, so redaction is a property of the
// output pipeline rather than a helper each call site must remember.

use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;

/// Replacement marker for redacted material.
pub const REDACTED: &str = "***REDACTED***";

static KEY_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"key=[^&\s]+").unwrap_or_else(|e| panic!("key pattern: {e}"))
});
static PASSWORD_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"password=[^&\s]+").unwrap_or_else(|e| panic!("password pattern: {e}"))
});

/// Redacts known secret values and credential-shaped URL parameters from
/// text before it leaves the library.
///
/// Cheaply cloneable; all clones share the registered secret set, so a
/// key registered at authentication time is redacted everywhere.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    secrets: Arc<RwLock<Vec<String>>>,
}

impl Redactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret value for literal redaction.
    ///
    /// Empty and single-character values are ignored -- replacing them
    /// would shred unrelated text.
    pub fn register(&self, secret: &str) {
        if secret.len() < 2 {
            return;
        }
        if let Ok(mut secrets) = self.secrets.write() {
            if !secrets.iter().any(|s| s == secret) {
                secrets.push(secret.to_owned());
            }
        }
    }

    /// Replace every occurrence of every registered secret, then redact
    /// `key=` / `password=` query fragments by pattern. The pattern pass
    /// covers secrets nobody registered, e.g. values echoed back by the
    /// manager. Idempotent: redacting already-redacted text is a no-op.
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_owned();
        if let Ok(secrets) = self.secrets.read() {
            for secret in secrets.iter() {
                out = out.replace(secret, REDACTED);
            }
        }
        out = KEY_PARAM
            .replace_all(&out, format!("key={REDACTED}"))
            .into_owned();
        out = PASSWORD_PARAM
            .replace_all(&out, format!("password={REDACTED}"))
            .into_owned();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_registered_secret() {
        let r = Redactor::new();
        r.register("LUFRPT1secret");
        let out = r.redact("response echoed LUFRPT1secret back");
        assert!(!out.contains("LUFRPT1secret"));
        assert!(out.contains(REDACTED));
    }

    #[test]
    fn redacts_url_params_without_registration() {
        let r = Redactor::new();
        let out = r.redact("GET /api/?key=ABCD1234&type=op&password=hunter2");
        assert!(!out.contains("ABCD1234"));
        assert!(!out.contains("hunter2"));
        assert_eq!(
            out,
            format!("GET /api/?key={REDACTED}&type=op&password={REDACTED}")
        );
    }

    #[test]
    fn idempotent() {
        let r = Redactor::new();
        r.register("s3cr3t");
        let once = r.redact("key=AAAA s3cr3t");
        let twice = r.redact(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn clones_share_registrations() {
        let r = Redactor::new();
        let clone = r.clone();
        r.register("shared-secret");
        assert!(!clone.redact("shared-secret").contains("shared-secret"));
    }

    #[test]
    fn short_values_are_not_registered() {
        let r = Redactor::new();
        r.register("a");
        assert_eq!(r.redact("a banana"), "a banana");
    }
}
