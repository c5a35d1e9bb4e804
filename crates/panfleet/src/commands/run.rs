//! Operational and test command handlers.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use panfleet_api::command::translate_show;
use panfleet_core::{ApiResponse, run_on_fleet};

use crate::cli::{OutputFormat, RunArgs, TestArgs};
use crate::error::CliError;
use crate::output;

use super::Ctx;

/// Per-target command outcome, serializable for `--output json`.
#[derive(Serialize)]
struct CommandOutput {
    target: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

#[derive(Tabled)]
struct FleetRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Output")]
    output: String,
}

fn from_response(target: &str, resp: &ApiResponse) -> CommandOutput {
    let rendered = resp
        .result()
        .and_then(output::flatten_entries)
        .unwrap_or_else(|| {
            panfleet_api::ConfigTree::from_element(resp.root().clone()).pretty()
        });
    CommandOutput {
        target: target.to_owned(),
        success: resp.is_success(),
        message: resp.message(),
        output: Some(rendered),
    }
}

fn print_single(format: &OutputFormat, out: &CommandOutput) {
    let text = output::render_single(
        format,
        out,
        |o| {
            let mut lines = Vec::new();
            if !o.success {
                lines.push(format!(
                    "command failed: {}",
                    o.message.as_deref().unwrap_or("no detail")
                ));
            }
            if let Some(body) = &o.output {
                lines.push(body.clone());
            }
            lines.join("\n")
        },
        |o| o.target.clone(),
    );
    println!("{text}");
}

pub async fn run(ctx: &Ctx, args: &RunArgs) -> Result<(), CliError> {
    let cli_text = args.command.join(" ");
    let session = ctx.session()?;

    if args.all {
        // One translation up front -- a bad command fails before any
        // device is contacted.
        let xml = to_op_xml(&cli_text)?;
        let session = Arc::new(session);
        let devices = session
            .list_devices(true)
            .await
            .map_err(|e| ctx.map_api(e))?;
        let fetcher = ctx.fetcher();
        let results = run_on_fleet(&session, &devices, &fetcher, &xml).await;

        let outputs: Vec<CommandOutput> = results
            .iter()
            .map(|(serial, outcome)| match outcome {
                Ok(resp) => from_response(serial, resp),
                Err(e) => CommandOutput {
                    target: serial.clone(),
                    success: false,
                    message: Some(session.redactor().redact(&e.to_string())),
                    output: None,
                },
            })
            .collect();

        println!(
            "{}",
            output::render_list(
                &ctx.output,
                &outputs,
                |o| FleetRow {
                    serial: o.target.clone(),
                    status: if o.success { "ok".into() } else { "failed".into() },
                    output: o
                        .output
                        .clone()
                        .or_else(|| o.message.clone())
                        .unwrap_or_default(),
                },
                |o| o.target.clone(),
            )
        );
        return Ok(());
    }

    let serial = args
        .serial
        .clone()
        .ok_or_else(|| CliError::Validation {
            field: "serial".into(),
            reason: "required unless --all is given".into(),
        })?;
    let resp = session
        .run_cli(Some(&serial), &cli_text)
        .await
        .map_err(|e| ctx.map_api(e))?;
    print_single(&ctx.output, &from_response(&serial, &resp));
    Ok(())
}

pub async fn test(ctx: &Ctx, args: &TestArgs) -> Result<(), CliError> {
    let cli_text = args.command.join(" ");
    let session = ctx.session()?;
    let resp = session
        .run_test(Some(&args.serial), &cli_text)
        .await
        .map_err(|e| ctx.map_api(e))?;
    print_single(&ctx.output, &from_response(&args.serial, &resp));
    Ok(())
}

/// Accept op XML verbatim or a `show` command; reject everything else
/// before it reaches the wire.
fn to_op_xml(cli_text: &str) -> Result<String, CliError> {
    let trimmed = cli_text.trim();
    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        return Ok(trimmed.to_owned());
    }
    translate_show(trimmed).map_err(|e| match e {
        panfleet_api::Error::UnsupportedCommand(command) => {
            CliError::UnsupportedCommand { command }
        }
        other => CliError::Api {
            message: other.to_string(),
        },
    })
}
