// Management API response envelope.
//
// Every call answers with `<response status="...">` wrapping either a
// `<result>` payload or an error `<msg>`. The envelope is parsed into the
// same normalized tree the drift engine uses; raw text is redacted at
// construction so no accessor can surface secret material.

use crate::error::Error;
use crate::redact::Redactor;
use crate::tree::{Element, parse_element};

/// A parsed API response: envelope status plus the full document tree.
///
/// `raw` is the response body after redaction -- safe to log or display
/// as-is.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    raw: String,
    root: Element,
}

impl ApiResponse {
    /// Parse a response body. The body is redacted before anything else,
    /// so both the raw view and the parsed tree are clean.
    pub fn parse(body: &str, redactor: &Redactor) -> Result<Self, Error> {
        let raw = redactor.redact(body);
        let root = parse_element(&raw)?;
        Ok(Self { raw, root })
    }

    /// The redacted response body.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The full parsed document.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The envelope status attribute (`success`, `error`, ...).
    pub fn status(&self) -> &str {
        self.root.attr("status").unwrap_or("unknown")
    }

    /// The envelope code attribute, when the manager provides one.
    pub fn code(&self) -> Option<&str> {
        self.root.attr("code")
    }

    pub fn is_success(&self) -> bool {
        self.status() == "success"
    }

    /// The `<result>` payload element, if any.
    pub fn result(&self) -> Option<&Element> {
        self.root.descendant("result")
    }

    /// Human-readable error or status message from the envelope.
    ///
    /// `<msg>` may hold plain text or a list of `<line>` children; both
    /// forms are flattened.
    pub fn message(&self) -> Option<String> {
        if let Some(msg) = self.root.descendant("msg") {
            let lines: Vec<&str> = msg
                .children_named("line")
                .map(|l| l.text.as_str())
                .filter(|t| !t.is_empty())
                .collect();
            if !lines.is_empty() {
                return Some(lines.join("\n"));
            }
            if !msg.text.is_empty() {
                return Some(msg.text.clone());
            }
        }
        self.root.descendant_text("line").map(ToOwned::to_owned)
    }

    /// The issued API key from a keygen response.
    pub fn key(&self) -> Option<&str> {
        self.root.descendant_text("key")
    }

    /// The job id from a commit response.
    pub fn job_id(&self) -> Option<&str> {
        self.root.descendant_text("job")
    }
}
