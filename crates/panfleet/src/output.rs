//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses
//! `tabled`, JSON uses serde, plain emits one identifier per line.

use std::io::{self, IsTerminal};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use panfleet_api::Element;
use panfleet_core::SyncStatus;

use crate::cli::OutputFormat;

/// Color only when stdout is an interactive terminal.
pub fn use_color() -> bool {
    io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen
/// format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single item: a pre-formatted detail view for tables, serde
/// for JSON, an identifier for plain.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data),
        OutputFormat::Plain => id_fn(data),
    }
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return "(no entries)".to_owned();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

// ── Status helpers ──────────────────────────────────────────────────

/// Connection state marker.
pub fn connected_marker(connected: bool) -> String {
    let text = if connected { "up" } else { "down" };
    if !use_color() {
        return text.to_owned();
    }
    if connected {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

/// Sync state, colored like the status it reports.
pub fn sync_marker(status: SyncStatus) -> String {
    let text = status.as_str();
    if !use_color() {
        return text.to_owned();
    }
    match status {
        SyncStatus::InSync => text.green().to_string(),
        SyncStatus::OutOfSync => text.red().to_string(),
        SyncStatus::Unknown => text.yellow().to_string(),
    }
}

// ── Response flattening ─────────────────────────────────────────────

/// Flatten an op response into `key: value | key: value` rows, one per
/// `<entry>`. Falls back to nothing when the result has no entry list;
/// the caller shows pretty XML instead.
pub fn flatten_entries(result: &Element) -> Option<String> {
    let rows: Vec<String> = result
        .descendants()
        .filter(|e| e.name == "entry")
        .map(|entry| {
            let mut parts: Vec<String> = Vec::new();
            if let Some(name) = entry.name_attr() {
                parts.push(format!("name: {name}"));
            }
            for child in &entry.children {
                if !child.text.is_empty() {
                    parts.push(format!("{}: {}", child.name, child.text));
                }
            }
            parts.join(" | ")
        })
        .filter(|row| !row.is_empty())
        .collect();
    if rows.is_empty() {
        None
    } else {
        Some(rows.join("\n"))
    }
}
