use crate::protocol::Record;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use directories::UserDirs;
use serde_json::Value;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

pub const CSV_MIME: &str = "text/csv;charset=utf-8";

/// A CSV file ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
}

impl CsvExport {
    pub fn mime(&self) -> &'static str {
        CSV_MIME
    }

    /// Write the file into `dir`, replacing an export of the same name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create export directory {}", dir.display()))?;
        let path = dir.join(&self.file_name);
        fs::write(&path, self.contents.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = self.contents.len(), "records exported");
        Ok(path)
    }
}

/// Build today's export for `records`; `None` when there is nothing to export.
pub fn export_as_delimited_text(records: &[Record]) -> Option<CsvExport> {
    export_dated(records, Utc::now().date_naive())
}

pub fn export_dated(records: &[Record], date: NaiveDate) -> Option<CsvExport> {
    let contents = encode_records(records)?;
    Some(CsvExport {
        file_name: format!("data_export_{}.csv", date.format("%Y-%m-%d")),
        contents,
    })
}

/// Encode records as CSV. Columns come from the first record only.
pub fn encode_records(records: &[Record]) -> Option<String> {
    let first = records.first()?;
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(headers.join(","));
    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|header| escape_field(&field_text(record.get(*header))).into_owned())
            .collect();
        lines.push(row.join(","));
    }
    Some(lines.join("\n"))
}

/// Where exports land when no directory is configured.
pub fn default_export_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn field_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(text)) => Cow::Borrowed(text.as_str()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

// Only commas and double quotes trigger quoting.
fn escape_field(text: &str) -> Cow<'_, str> {
    if text.contains(',') || text.contains('"') {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(text)
    }
}
