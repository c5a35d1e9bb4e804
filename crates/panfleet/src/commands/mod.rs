//! Command handlers, one module per subcommand group.

pub mod devices;
pub mod drift_cmd;
pub mod groups;
pub mod login;
pub mod push;
pub mod run;
pub mod sysinfo;
pub mod templates;

use panfleet_config::credentials::CredentialStore;
use panfleet_core::{FleetFetcher, Session};
use secrecy::SecretString;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config::{API_KEY_PRINCIPAL, Resolved, credential_store, load_config_or_default, resolve};
use crate::error::CliError;

/// Shared context assembled once per invocation.
pub struct Ctx {
    pub output: OutputFormat,
    pub yes: bool,
    pub insecure: bool,
    pub resolved: Resolved,
    pub store: Box<dyn CredentialStore>,
}

impl Ctx {
    pub fn build(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = load_config_or_default();
        let resolved = resolve(global, &config)?;
        Ok(Self {
            output: global.output.clone(),
            yes: global.yes,
            insecure: global.insecure,
            resolved,
            store: credential_store(global),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.resolved.manager.endpoint
    }

    /// Construct a session from the stored API key.
    pub fn session(&self) -> Result<Session, CliError> {
        let endpoint = self.endpoint();
        let key = self
            .store
            .get(endpoint, API_KEY_PRINCIPAL)?
            .ok_or_else(|| CliError::NoCredentials {
                profile: self.resolved.profile_name.clone(),
            })?;
        Session::with_api_key(endpoint, key, self.resolved.manager.transport())
            .map_err(|e| self.map_api(e))
    }

    /// Stored API key without building a session (logout path).
    pub fn stored_key(&self) -> Result<Option<SecretString>, CliError> {
        Ok(self.store.get(self.endpoint(), API_KEY_PRINCIPAL)?)
    }

    pub fn fetcher(&self) -> FleetFetcher {
        FleetFetcher::new(self.resolved.fleet.clone())
    }

    pub fn map_api(&self, e: panfleet_api::Error) -> CliError {
        CliError::from_api(e, self.endpoint())
    }
}

/// Route a parsed command to its handler.
pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Ctx::build(global)?;
    tracing::debug!(profile = %ctx.resolved.profile_name, "dispatching command");
    match command {
        Command::Login(args) => login::login(&ctx, &args).await,
        Command::Logout => login::logout(&ctx).await,
        Command::Devices(args) => devices::list(&ctx, &args).await,
        Command::DeviceGroups => groups::list(&ctx).await,
        Command::Templates => templates::list(&ctx).await,
        Command::Run(args) => run::run(&ctx, &args).await,
        Command::Test(args) => run::test(&ctx, &args).await,
        Command::Sysinfo(args) => sysinfo::show(&ctx, &args).await,
        Command::Drift(args) => drift_cmd::check(&ctx, &args).await,
        Command::Push(args) => push::push(&ctx, &args).await,
    }
}
