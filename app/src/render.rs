use chrono::Local;
use dwgpt_core::protocol::Record;
use dwgpt_core::state::{ChatMessage, MessageRole};
use serde_json::Value;

pub const PREVIEW_COLUMNS: usize = 6;
pub const PREVIEW_ROWS: usize = 50;

pub const SUGGESTIONS: [&str; 3] = [
    "Show latest shipments",
    "Shipments where POL is Nhava Sheva",
    "Find tasks for shipment ABC123",
];

pub fn role_label(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "You",
        MessageRole::Assistant => "DW-GPT",
    }
}

pub fn banner() -> String {
    let mut out = String::from("DW-GPT · your company's AI data assistant\n\nTry asking:\n");
    for suggestion in SUGGESTIONS {
        out.push_str("  → ");
        out.push_str(suggestion);
        out.push('\n');
    }
    out.push_str("\nCommands: /export [n], /help, /quit\n");
    out.push_str("Any other line, including one starting with `/`, is sent as a message.\n");
    out
}

/// One transcript entry, with its record preview when it carries data.
pub fn render_message(message: &ChatMessage) -> String {
    let time = message.created_at.with_timezone(&Local).format("%H:%M");
    let mut out = format!("[{time}] {}: {}\n", role_label(message.role), message.content);
    if let Some(records) = message.records() {
        out.push('\n');
        out.push_str(&render_table(records));
    }
    out
}

/// Preview of a record set: at most the first six columns and fifty rows.
pub fn render_table(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };
    let headers: Vec<&str> = first
        .keys()
        .take(PREVIEW_COLUMNS)
        .map(String::as_str)
        .collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .take(PREVIEW_ROWS)
        .map(|record| {
            record
                .values()
                .take(PREVIEW_COLUMNS)
                .map(cell_text)
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(idx) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }

    let mut out = format!("{} record(s)\n", records.len());
    out.push_str(&format_row(headers.iter().copied(), &widths));
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(&format_row(rule.iter().map(String::as_str), &widths));
    for row in &rows {
        out.push_str(&format_row(row.iter().map(String::as_str), &widths));
    }
    if records.len() > PREVIEW_ROWS {
        out.push_str(&format!(
            "Showing first {PREVIEW_ROWS} of {} records\n",
            records.len()
        ));
    }
    out
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    format!("{}\n", padded.join(" | ").trim_end())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) if text.is_empty() => "-".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
