//! Login / logout handlers.
//!
//! Login runs keygen authentication and stores only the issued API key;
//! the password is stored only on explicit request (`--save-password`).
//! Logout revokes the key best-effort and always forgets it locally.

use std::io::{IsTerminal, stdin};

use dialoguer::{Confirm, Input, Password};
use secrecy::SecretString;

use panfleet_core::Session;

use crate::cli::LoginArgs;
use crate::config::API_KEY_PRINCIPAL;
use crate::error::CliError;

use super::Ctx;

pub async fn login(ctx: &Ctx, args: &LoginArgs) -> Result<(), CliError> {
    let endpoint = ctx.endpoint().to_owned();

    let username = match &ctx.resolved.username {
        Some(u) => u.clone(),
        None => Input::new().with_prompt("Username").interact_text()?,
    };

    // Stored password first (unattended re-login), prompt otherwise.
    let password = match ctx.store.get(&endpoint, &username)? {
        Some(stored) => stored,
        None => SecretString::from(
            Password::new()
                .with_prompt(format!("Password for {username}@{endpoint}"))
                .interact()?,
        ),
    };

    let transport = ctx.resolved.manager.transport();
    let session = match Session::authenticate(&endpoint, &username, &password, transport).await {
        Ok(session) => session,
        Err(e @ panfleet_api::Error::Tls(_)) if !ctx.insecure => {
            retry_insecure(ctx, &endpoint, &username, &password, e).await?
        }
        Err(e) => return Err(ctx.map_api(e)),
    };

    ctx.store
        .set(&endpoint, API_KEY_PRINCIPAL, session.api_key())?;
    if args.save_password {
        ctx.store.set(&endpoint, &username, &password)?;
    }

    println!("Login successful. API key stored for '{endpoint}'.");
    Ok(())
}

/// One interactive chance to retry the keygen call without certificate
/// verification. The opt-in covers exactly this attempt; nothing is
/// persisted, so the next invocation verifies again.
async fn retry_insecure(
    ctx: &Ctx,
    endpoint: &str,
    username: &str,
    password: &SecretString,
    original: panfleet_api::Error,
) -> Result<Session, CliError> {
    if ctx.yes || !stdin().is_terminal() {
        return Err(ctx.map_api(original));
    }
    let proceed = Confirm::new()
        .with_prompt("Certificate not trusted. Retry this login without verification?")
        .default(false)
        .interact()?;
    if !proceed {
        return Err(ctx.map_api(original));
    }
    let transport = ctx.resolved.manager.transport().insecure_once();
    Session::authenticate(endpoint, username, password, transport)
        .await
        .map_err(|e| ctx.map_api(e))
}

pub async fn logout(ctx: &Ctx) -> Result<(), CliError> {
    let endpoint = ctx.endpoint().to_owned();

    if ctx.stored_key()?.is_none() {
        println!("No stored API key for '{endpoint}'.");
        return Ok(());
    }

    // Best-effort server-side revocation; local cleanup happens anyway.
    match ctx.session() {
        Ok(session) => {
            if let Err(e) = session.logout().await {
                eprintln!("warning: key revocation failed: {e}");
            }
        }
        Err(e) => eprintln!("warning: could not reach manager for revocation: {e}"),
    }

    ctx.store.delete(&endpoint, API_KEY_PRINCIPAL)?;
    println!("Logged out of '{endpoint}'.");
    Ok(())
}
