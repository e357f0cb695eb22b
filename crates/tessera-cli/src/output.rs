//! Output formatting for the CLI.

use clap::ValueEnum;
use serde_json::{json, Value};

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => print_json(&json!({ "status": "success", "message": message })),
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!("{}", json!({ "status": "error", "message": message }));
        }
    }
}

/// Pretty-print a JSON value.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(_) => println!("{}", value),
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<14} {}", format!("{}:", label), value);
}

/// Join a list for a table row, or `-` when empty.
pub fn join_or_dash<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let joined = items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
