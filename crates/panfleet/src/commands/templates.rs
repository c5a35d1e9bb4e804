//! Template sync state handler.

use tabled::Tabled;

use panfleet_core::TemplateMember;

use crate::error::CliError;
use crate::output;

use super::Ctx;

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "Template")]
    template: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Template Sync")]
    sync: String,
}

impl From<&TemplateMember> for TemplateRow {
    fn from(m: &TemplateMember) -> Self {
        Self {
            template: m.template.clone(),
            device: m.hostname.clone(),
            sync: output::sync_marker(m.status),
        }
    }
}

pub async fn list(ctx: &Ctx) -> Result<(), CliError> {
    let session = ctx.session()?;
    let members = session.list_templates().await.map_err(|e| ctx.map_api(e))?;

    println!(
        "{}",
        output::render_list(&ctx.output, &members, |m| TemplateRow::from(m), |m| {
            format!("{}/{}", m.template, m.hostname)
        })
    );
    Ok(())
}
