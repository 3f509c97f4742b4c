//! Output formatting utilities for the CLI
//!
//! Response bodies are opaque text. In table mode, JSON bodies are rendered
//! as tables where that makes sense; everything else is printed as received.

use anyhow::Result;
use colored::*;
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use hanami_core::Outcome;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    /// Parse a validated config value; anything unknown falls back to table.
    pub fn from_config(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

/// Format the body of a response.
pub fn format_outcome(outcome: &Outcome, format: OutputFormat) -> Result<String> {
    let parsed = serde_json::from_str::<Value>(&outcome.body).ok();

    match (format, parsed) {
        (OutputFormat::Json, Some(value)) => Ok(serde_json::to_string_pretty(&value)?),
        // Non-JSON body in json mode: wrap it so the output is still JSON
        (OutputFormat::Json, None) => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "success": outcome.success,
            "body": outcome.body,
        }))?),
        (OutputFormat::Table, Some(Value::Array(items))) if is_object_list(&items) => {
            Ok(render_table(&items))
        }
        (OutputFormat::Table, Some(Value::Object(map))) => {
            Ok(render_table(&[Value::Object(map)]))
        }
        (OutputFormat::Table, Some(value)) => Ok(serde_json::to_string_pretty(&value)?),
        (OutputFormat::Table, None) => Ok(outcome.body.clone()),
    }
}

/// Format a failed outcome for stderr.
pub fn format_failure(outcome: &Outcome) -> String {
    if outcome.body.is_empty() {
        format!("{} request failed", "Error:".red().bold())
    } else {
        format!("{} {}", "Error:".red().bold(), outcome.body)
    }
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green(), message)
}

fn is_object_list(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_object)
}

/// Render objects as rows; columns are the union of keys in first-seen order.
fn render_table(items: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for item in items {
        builder.push_record(columns.iter().map(|c| cell(item.get(*c))));
    }

    builder.build().with(Style::rounded()).to_string()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".dimmed().to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "yes".green().to_string(),
        Some(Value::Bool(false)) => "no".red().to_string(),
        Some(other) => other.to_string(),
    }
}
