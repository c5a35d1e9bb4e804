//! System-info handler.

use panfleet_core::SystemInfo;

use crate::cli::SysinfoArgs;
use crate::error::CliError;
use crate::output;

use super::Ctx;

fn detail(info: &SystemInfo) -> String {
    let lines = [
        format!("{:<17}{}", "Hostname:", info.hostname),
        format!("{:<17}{}", "IP Address:", info.ip_address),
        format!("{:<17}{}", "Default Gateway:", info.default_gateway),
        format!("{:<17}{}", "Netmask:", info.netmask),
        format!("{:<17}{}", "DHCP Enabled:", info.is_dhcp),
        format!("{:<17}{}", "MAC Address:", info.mac_address),
        format!("{:<17}{}", "Model:", info.model),
        format!("{:<17}{}", "SW Version:", info.sw_version),
        format!("{:<17}{}", "Serial:", info.serial),
        format!("{:<17}{}", "Uptime:", info.uptime),
    ];
    lines.join("\n")
}

pub async fn show(ctx: &Ctx, args: &SysinfoArgs) -> Result<(), CliError> {
    let session = ctx.session()?;
    let info = session
        .system_info(&args.serial)
        .await
        .map_err(|e| ctx.map_api(e))?;

    println!(
        "{}",
        output::render_single(&ctx.output, &info, detail, |i| i.serial.clone())
    );
    Ok(())
}
