//! Output formatting

use manifest_gate::{DiffEntry, DiffResult};

use crate::error::CliResult;

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per change
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

pub fn render_diff(diff: &DiffResult, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(diff)?),
        OutputFormat::Text if diff.is_empty() => Ok("No static changes".to_string()),
        OutputFormat::Text => Ok(diff
            .iter()
            .map(render_entry)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn render_entry(entry: &DiffEntry) -> String {
    let location = match &entry.node_type {
        Some(node_type) => format!("{}[{}]/{}", entry.section, node_type, entry.parameter),
        None => format!("{}/{}", entry.section, entry.parameter),
    };
    format!(
        "{}: {} -> {} ({:?})",
        location,
        entry.old_value.as_deref().unwrap_or("<unset>"),
        entry.new_value.as_deref().unwrap_or("<unset>"),
        entry.policy
    )
}
