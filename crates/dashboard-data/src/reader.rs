//! Loading raw experiment records from disk.
//!
//! Accepts either a JSON array of objects or JSONL (one object per line), as
//! exported by the spreadsheet ingestion step.

use std::path::Path;

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::RawRecord;
use serde_json::Value;
use tracing::{debug, warn};

/// Read every raw record from `path`.
///
/// A JSON array must parse as a whole. In JSONL, blank lines are ignored and
/// malformed lines are skipped with a warning. Non-object entries are skipped
/// in both forms.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let records = if content.trim_start().starts_with('[') {
        parse_array(&content)?
    } else {
        parse_lines(&content)
    };

    debug!("Loaded {} raw records from {}", records.len(), path.display());
    Ok(records)
}

fn parse_array(content: &str) -> Result<Vec<RawRecord>> {
    let values: Vec<Value> = serde_json::from_str(content)?;
    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| into_record(v, i + 1))
        .collect())
}

fn parse_lines(content: &str) -> Vec<RawRecord> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str::<Value>(line) {
            Ok(v) => into_record(v, i + 1),
            Err(e) => {
                warn!("Skipping malformed line {}: {}", i + 1, e);
                None
            }
        })
        .collect()
}

fn into_record(value: Value, position: usize) -> Option<RawRecord> {
    match value {
        Value::Object(map) => Some(RawRecord::from(map)),
        other => {
            warn!("Skipping entry {}: expected an object, got {}", position, other);
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
