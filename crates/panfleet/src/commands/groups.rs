//! Device-group sync state handler.

use tabled::Tabled;

use panfleet_core::DeviceGroupMember;

use crate::error::CliError;
use crate::output;

use super::Ctx;

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Policy Sync")]
    sync: String,
}

impl From<&DeviceGroupMember> for GroupRow {
    fn from(m: &DeviceGroupMember) -> Self {
        Self {
            group: m.group.clone(),
            device: m.hostname.clone(),
            sync: output::sync_marker(m.status),
        }
    }
}

pub async fn list(ctx: &Ctx) -> Result<(), CliError> {
    let session = ctx.session()?;
    let members = session
        .list_device_groups()
        .await
        .map_err(|e| ctx.map_api(e))?;

    println!(
        "{}",
        output::render_list(&ctx.output, &members, |m| GroupRow::from(m), |m| {
            format!("{}/{}", m.group, m.hostname)
        })
    );
    Ok(())
}
