//! Commit-all push handlers.

use dialoguer::Confirm;

use crate::cli::{PushArgs, PushTarget};
use crate::error::CliError;

use super::Ctx;

pub async fn push(ctx: &Ctx, args: &PushArgs) -> Result<(), CliError> {
    let (label, name) = match &args.target {
        PushTarget::Template { name } => ("template", name),
        PushTarget::DeviceGroup { name } => ("device group", name),
    };

    if !ctx.yes {
        let proceed = Confirm::new()
            .with_prompt(format!("Push {label} '{name}' to its devices?"))
            .default(false)
            .interact()?;
        if !proceed {
            return Err(CliError::Cancelled);
        }
    }

    let session = ctx.session()?;
    let job = match &args.target {
        PushTarget::Template { name } => session.commit_all_template(name).await,
        PushTarget::DeviceGroup { name } => session.commit_all_device_group(name).await,
    }
    .map_err(|e| ctx.map_api(e))?;

    println!(
        "Push of {label} '{name}' started. Job ID: {job}\n\
         Check the manager's task list for progress."
    );
    Ok(())
}
