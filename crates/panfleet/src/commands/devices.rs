//! Device inventory handler.

use tabled::Tabled;

use panfleet_api::model::annotate_membership;
use panfleet_core::Device;

use crate::cli::DevicesArgs;
use crate::error::CliError;
use crate::output;

use super::Ctx;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Template")]
    template: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            hostname: d.hostname.clone(),
            serial: d.serial.clone(),
            ip: d.ip_address.clone(),
            model: d.model.clone().unwrap_or_else(|| "-".into()),
            group: d.device_group.clone().unwrap_or_else(|| "-".into()),
            template: d.template.clone().unwrap_or_else(|| "-".into()),
            state: output::connected_marker(d.connected),
        }
    }
}

pub async fn list(ctx: &Ctx, args: &DevicesArgs) -> Result<(), CliError> {
    let session = ctx.session()?;
    let mut devices = session
        .list_devices(args.connected)
        .await
        .map_err(|e| ctx.map_api(e))?;

    // Group and template membership come from separate listings;
    // inventory alone does not carry them.
    let groups = session
        .list_device_groups()
        .await
        .map_err(|e| ctx.map_api(e))?;
    let templates = session.list_templates().await.map_err(|e| ctx.map_api(e))?;
    annotate_membership(&mut devices, &groups, &templates);

    println!(
        "{}",
        output::render_list(&ctx.output, &devices, |d| DeviceRow::from(d), |d| d.serial.clone())
    );
    Ok(())
}
