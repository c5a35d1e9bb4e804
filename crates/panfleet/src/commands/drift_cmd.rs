//! Fleet drift sweep handler.

use std::sync::Arc;

use tabled::Tabled;

use panfleet_api::model::normalize_serial;
use panfleet_core::{DriftKind, DriftReport, drift_sweep};

use crate::cli::{DriftArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::Ctx;

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Template")]
    template: String,
    #[tabled(rename = "Device")]
    device: String,
}

pub async fn check(ctx: &Ctx, args: &DriftArgs) -> Result<(), CliError> {
    let session = Arc::new(ctx.session()?);

    let mut devices = session
        .list_devices(args.connected)
        .await
        .map_err(|e| ctx.map_api(e))?;

    if let Some(wanted) = &args.serial {
        let wanted = normalize_serial(wanted);
        devices.retain(|d| d.serial == wanted);
        if devices.is_empty() {
            return Err(CliError::NotFound {
                kind: "device".into(),
                name: wanted,
            });
        }
    }

    let fetcher = ctx.fetcher();
    let reports = drift_sweep(&session, &devices, &fetcher).await;

    match ctx.output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&reports)
                    .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
            );
        }
        OutputFormat::Plain => {
            for report in reports.iter().filter(|r| r.has_drift()) {
                println!("{}", report.serial);
            }
        }
        OutputFormat::Table => print_table(&reports),
    }
    Ok(())
}

fn print_table(reports: &[DriftReport]) {
    let rows: Vec<FindingRow> = reports
        .iter()
        .flat_map(|report| {
            report.findings.iter().map(|f| FindingRow {
                serial: report.serial.clone(),
                path: f.path.clone(),
                kind: f.kind.as_str().to_owned(),
                template: f.template_value.clone().unwrap_or_else(|| "-".into()),
                device: f.device_value.clone().unwrap_or_else(|| "-".into()),
            })
        })
        .collect();

    if rows.is_empty() {
        println!("No drift detected across {} device(s).", reports.len());
        return;
    }

    println!(
        "{}",
        tabled::Table::new(&rows)
            .with(tabled::settings::Style::rounded())
            .to_string()
    );

    let drifted = reports.iter().filter(|r| r.has_drift()).count();
    let unavailable = reports
        .iter()
        .filter(|r| {
            r.findings
                .iter()
                .any(|f| f.kind == DriftKind::Unavailable)
        })
        .count();
    println!(
        "\n{} device(s) checked, {} with drift, {} unavailable.",
        reports.len(),
        drifted,
        unavailable
    );
}
