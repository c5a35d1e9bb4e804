// Authenticated manager session.
//
// A `Session` owns one endpoint, one issued API key, and one pooled HTTP
// client. It is created by `authenticate` (or `with_api_key` for a stored
// key) and issues every typed call: operational commands, test commands,
// config fetches, inventory listings, and commit-all pushes.
//
// The password used for key generation is never retained -- only the
// issued key survives, wrapped in `SecretString` and registered with the
// session's `Redactor` so no output path can echo it.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use crate::command::{TestCommand, translate_show};
use crate::error::Error;
use crate::model::{
    Device, DeviceGroupMember, SystemInfo, TemplateMember, parse_device_groups, parse_templates,
};
use crate::redact::Redactor;
use crate::response::ApiResponse;
use crate::transport::{TransportConfig, get_with_retry};
use crate::tree::{ConfigTree, parse_element};

/// Which configuration a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    /// The device's effective (running) configuration.
    Running,
    /// The configuration last pushed from the device's template.
    PushedTemplate,
}

/// Device-local root of the running configuration.
const DEVICE_CONFIG_XPATH: &str = "/config/devices/entry[@name='localhost.localdomain']";

/// An authenticated session against one manager endpoint.
///
/// Holds exactly one API key; a rejected key surfaces
/// [`Error::KeyExpired`] and re-authentication is the caller's move.
/// The HTTP client's connection pool is shared by concurrent fleet
/// workers and released when the session is dropped.
#[derive(Debug)]
pub struct Session {
    base_url: Url,
    api_url: Url,
    api_key: SecretString,
    http: reqwest::Client,
    config: TransportConfig,
    redactor: Redactor,
}

impl Session {
    /// Authenticate with username/password and construct a session
    /// holding the issued API key.
    ///
    /// The password leaves this function only as the keygen request
    /// parameter; it is not stored. TLS failures surface as
    /// [`Error::Tls`] -- retrying insecurely is the caller's explicit
    /// decision, one call at a time.
    pub async fn authenticate(
        endpoint: &str,
        username: &str,
        password: &SecretString,
        config: TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = endpoint_url(endpoint)?;
        let api_url = base_url.join("api/")?;
        let http = config.build_client()?;
        let redactor = Redactor::new();

        debug!(host = %base_url.host_str().unwrap_or("?"), "requesting API key");
        let resp = get_with_retry(
            &http,
            api_url.clone(),
            &[
                ("type", "keygen"),
                ("user", username),
                ("password", password.expose_secret()),
            ],
            &config,
        )
        .await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        let root = parse_element(&body)?;

        if root.attr("status") != Some("success") {
            let message = root
                .descendant_text("msg")
                .or_else(|| root.descendant_text("line"))
                .unwrap_or("unknown error");
            return Err(Error::Authentication {
                message: redactor.redact(message),
            });
        }
        let Some(key) = root.descendant_text("key") else {
            return Err(Error::Authentication {
                message: "manager returned success without an API key".into(),
            });
        };
        redactor.register(key);
        debug!("API key acquired");

        Ok(Self {
            base_url,
            api_url,
            api_key: SecretString::from(key.to_owned()),
            http,
            config,
            redactor,
        })
    }

    /// Construct a session around a previously issued API key.
    pub fn with_api_key(
        endpoint: &str,
        api_key: SecretString,
        config: TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = endpoint_url(endpoint)?;
        let api_url = base_url.join("api/")?;
        let http = config.build_client()?;
        let redactor = Redactor::new();
        redactor.register(api_key.expose_secret());
        Ok(Self {
            base_url,
            api_url,
            api_key,
            http,
            config,
            redactor,
        })
    }

    /// The manager endpoint this session talks to.
    pub fn endpoint(&self) -> &Url {
        &self.base_url
    }

    /// The issued API key, for callers that persist it through a
    /// credential store. Registered with the redactor, so it can never
    /// appear in surfaced text.
    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// The redactor seeded with this session's secrets. Callers wrap
    /// their own outbound text with it; everything the session itself
    /// returns is already redacted.
    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    /// A one-shot session with certificate verification disabled, for
    /// retrying exactly one call after an [`Error::Tls`] failure.
    ///
    /// The returned session shares this session's key and redactor but
    /// none of its transport; drop it after the retry. This session's
    /// own policy is not changed and the opt-out is never persisted.
    pub fn insecure_once(&self) -> Result<Self, Error> {
        let config = self.config.insecure_once();
        let http = config.build_client()?;
        Ok(Self {
            base_url: self.base_url.clone(),
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            http,
            config,
            redactor: self.redactor.clone(),
        })
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Issue a GET against the API endpoint with the session key
    /// attached, and parse the envelope.
    async fn call(&self, params: &[(&str, &str)]) -> Result<ApiResponse, Error> {
        let mut full: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        full.push(("key", self.api_key.expose_secret()));
        full.extend_from_slice(params);

        let resp = get_with_retry(&self.http, self.api_url.clone(), &full, &self.config).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        ApiResponse::parse(&body, &self.redactor)
    }

    /// Promote a non-success envelope into a typed error.
    ///
    /// A rejected key (code 403 / invalid-credentials message) maps to
    /// [`Error::KeyExpired`]; anything else stays a recoverable
    /// [`Error::Api`].
    fn ensure_success(&self, resp: ApiResponse) -> Result<ApiResponse, Error> {
        if resp.is_success() {
            return Ok(resp);
        }
        let message = resp
            .message()
            .unwrap_or_else(|| "no error detail provided".to_owned());
        if resp.code() == Some("403") || message.contains("Invalid credentials") {
            return Err(Error::KeyExpired);
        }
        Err(Error::Api {
            status: resp.status().to_owned(),
            message,
        })
    }

    // ── Typed calls ──────────────────────────────────────────────────

    /// Run an operational command, passing the XML through as-is.
    ///
    /// Returns the envelope even on a non-success status -- per-device
    /// failures are data, so batch operations keep going. Use
    /// [`ApiResponse::is_success`] to branch.
    pub async fn run_operational(
        &self,
        target: Option<&str>,
        xml_cmd: &str,
    ) -> Result<ApiResponse, Error> {
        let mut params = vec![("type", "op"), ("cmd", xml_cmd)];
        if let Some(serial) = target {
            params.push(("target", serial));
        }
        debug!(target = target.unwrap_or("manager"), "op command");
        self.call(&params).await
    }

    /// Translate and run a `show ...` CLI command.
    pub async fn run_show(&self, target: Option<&str>, cli: &str) -> Result<ApiResponse, Error> {
        let xml = translate_show(cli)?;
        self.run_operational(target, &xml).await
    }

    /// Translate and run a test command (active probe).
    ///
    /// Untranslatable syntax fails with [`Error::UnsupportedCommand`]
    /// before any network call is made.
    pub async fn run_test(&self, target: Option<&str>, cli: &str) -> Result<ApiResponse, Error> {
        let command = TestCommand::parse(cli)?;
        let xml = command.to_xml();
        let mut params = vec![("type", "test"), ("cmd", xml.as_str())];
        if let Some(serial) = target {
            params.push(("target", serial));
        }
        debug!(target = target.unwrap_or("manager"), "test command");
        self.call(&params).await
    }

    /// Run a CLI line: op XML verbatim if it looks like markup,
    /// otherwise through the `show` grammar. Anything else is a typed
    /// error, never a best-effort rewrite.
    pub async fn run_cli(&self, target: Option<&str>, input: &str) -> Result<ApiResponse, Error> {
        let trimmed = input.trim();
        if trimmed.starts_with('<') && trimmed.ends_with('>') {
            return self.run_operational(target, trimmed).await;
        }
        if trimmed.starts_with("test ") {
            return self.run_test(target, trimmed).await;
        }
        self.run_show(target, trimmed).await
    }

    /// Fetch a device's configuration tree.
    ///
    /// A fetch that fails never yields an empty tree -- the error is the
    /// result, and the drift layer folds it into an `unavailable`
    /// finding.
    pub async fn fetch_config(
        &self,
        scope: ConfigScope,
        serial: &str,
    ) -> Result<ConfigTree, Error> {
        let resp = match scope {
            ConfigScope::Running => {
                self.call(&[
                    ("type", "config"),
                    ("action", "get"),
                    ("xpath", DEVICE_CONFIG_XPATH),
                    ("target", serial),
                ])
                .await?
            }
            ConfigScope::PushedTemplate => {
                self.run_operational(
                    Some(serial),
                    "<show><config><pushed-template/></config></show>",
                )
                .await?
            }
        };
        let resp = self.ensure_success(resp)?;
        let payload = resp
            .result()
            .and_then(|r| r.children.first())
            .ok_or_else(|| Error::NotFound {
                kind: "config",
                name: serial.to_owned(),
            })?;
        Ok(ConfigTree::from_element(payload.clone()))
    }

    /// List the fleet's devices, optionally only those currently
    /// connected to the manager.
    pub async fn list_devices(&self, connected_only: bool) -> Result<Vec<Device>, Error> {
        let cmd = if connected_only {
            "<show><devices><connected/></devices></show>"
        } else {
            "<show><devices><all/></devices></show>"
        };
        let resp = self.run_operational(None, cmd).await?;
        let resp = self.ensure_success(resp)?;
        let mut devices: Vec<Device> = resp
            .result()
            .and_then(|r| r.descendant("devices"))
            .map(|d| d.children_named("entry").filter_map(Device::from_entry).collect())
            .unwrap_or_default();
        devices.sort_by(|a, b| a.hostname.cmp(&b.hostname));
        debug!(count = devices.len(), "device inventory fetched");
        Ok(devices)
    }

    /// List device groups with per-device shared-policy sync state.
    pub async fn list_device_groups(&self) -> Result<Vec<DeviceGroupMember>, Error> {
        let resp = self
            .run_operational(None, "<show><devicegroups/></show>")
            .await?;
        let resp = self.ensure_success(resp)?;
        Ok(resp.result().map(parse_device_groups).unwrap_or_default())
    }

    /// List templates with per-device template sync state.
    pub async fn list_templates(&self) -> Result<Vec<TemplateMember>, Error> {
        let resp = self
            .run_operational(None, "<show><templates/></show>")
            .await?;
        let resp = self.ensure_success(resp)?;
        Ok(resp.result().map(parse_templates).unwrap_or_default())
    }

    /// Fetch and parse `show system info` for one device.
    pub async fn system_info(&self, serial: &str) -> Result<SystemInfo, Error> {
        let resp = self
            .run_operational(Some(serial), "<show><system><info/></system></show>")
            .await?;
        let resp = self.ensure_success(resp)?;
        let system = resp
            .result()
            .and_then(|r| r.descendant("system"))
            .ok_or_else(|| Error::Xml("missing <system> element in response".into()))?;
        Ok(SystemInfo::from_element(system))
    }

    /// Start a commit-all push of a template stack. Returns the job id.
    pub async fn commit_all_template(&self, template: &str) -> Result<String, Error> {
        validate_name(template)?;
        let stack = format!("{template}_stack");
        let cmd = format!(
            "<commit-all><template-stack><name>{stack}</name></template-stack></commit-all>"
        );
        self.commit(&cmd).await
    }

    /// Start a commit-all push of a device group's shared policy.
    /// Returns the job id.
    pub async fn commit_all_device_group(&self, group: &str) -> Result<String, Error> {
        validate_name(group)?;
        let cmd = format!(
            "<commit-all><shared-policy><device-group><entry name='{group}'/></device-group></shared-policy></commit-all>"
        );
        self.commit(&cmd).await
    }

    async fn commit(&self, cmd: &str) -> Result<String, Error> {
        let resp = self
            .call(&[("type", "commit"), ("action", "all"), ("cmd", cmd)])
            .await?;
        let resp = self.ensure_success(resp)?;
        match resp.job_id() {
            Some(job) => Ok(job.to_owned()),
            None => Err(Error::Api {
                status: resp.status().to_owned(),
                message: "commit accepted without a job id".into(),
            }),
        }
    }

    /// Best-effort server-side revocation of the API key.
    ///
    /// Local transport resources are released regardless of the
    /// outcome (the session is consumed); a revocation failure comes
    /// back as the error so the caller can report it, but nothing is
    /// left to clean up.
    pub async fn logout(self) -> Result<(), Error> {
        let result = self
            .run_operational(None, "<request><delete-api-key/></request>")
            .await
            .and_then(|resp| self.ensure_success(resp).map(|_| ()));
        if let Err(ref e) = result {
            warn!("API key revocation failed: {e}");
        }
        result
    }
}

/// Accept `host`, `host:port`, or a full URL.
fn endpoint_url(endpoint: &str) -> Result<Url, Error> {
    let normalized = if endpoint.contains("://") {
        endpoint.to_owned()
    } else {
        format!("https://{endpoint}/")
    };
    let mut url = Url::parse(&normalized)?;
    let path = url.path().to_owned();
    if !path.ends_with('/') {
        url.set_path(&format!("{path}/"));
    }
    Ok(url)
}

/// Names interpolated into commit XML. The surface is closed: reject
/// anything that could change the markup rather than escaping it.
fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty()
        || name
            .chars()
            .any(|c| matches!(c, '<' | '>' | '&' | '\'' | '"'))
    {
        return Err(Error::UnsupportedCommand(format!("invalid name '{name}'")));
    }
    Ok(())
}
