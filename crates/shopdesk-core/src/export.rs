// ── Spreadsheet export ──
//
// Client-side CSV export of already-loaded rows. No network access.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::CoreError;
use crate::table::ColumnDef;

/// Write `rows` as CSV, one column per entry in `columns` (header from
/// `ColumnDef::header`, cell from the dotted field path `ColumnDef::id`).
/// With no columns, the first row's top-level keys are used.
///
/// Returns the number of data rows written.
pub fn write_csv<T: Serialize, W: Write>(
    writer: W,
    rows: &[T],
    columns: &[&ColumnDef],
) -> Result<usize, CoreError> {
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CoreError::Export {
            message: e.to_string(),
        })?;

    let (paths, headers): (Vec<String>, Vec<String>) = if columns.is_empty() {
        values
            .first()
            .and_then(Value::as_object)
            .map(|obj| obj.keys().map(|k| (k.clone(), k.clone())).unzip())
            .unwrap_or_default()
    } else {
        columns
            .iter()
            .map(|c| {
                let header = if c.header.is_empty() { &c.id } else { &c.header };
                (c.id.clone(), header.clone())
            })
            .unzip()
    };

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&headers).map_err(export_err)?;
    for value in &values {
        out.write_record(paths.iter().map(|p| cell(value, p)))
            .map_err(export_err)?;
    }
    out.flush().map_err(|e| CoreError::Export {
        message: e.to_string(),
    })?;
    Ok(values.len())
}

/// Render one cell. Missing and null values are empty; nested arrays and
/// objects are written as JSON text.
fn cell(row: &Value, path: &str) -> String {
    let pointer = format!("/{}", path.replace('.', "/"));
    match row.pointer(&pointer) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// [`write_csv`] into a new file at `path`. On failure the partial file
/// is removed.
pub fn write_file<T: Serialize>(
    path: &Path,
    rows: &[T],
    columns: &[&ColumnDef],
) -> Result<usize, CoreError> {
    let file = File::create(path).map_err(|e| CoreError::Export {
        message: format!("{}: {e}", path.display()),
    })?;
    write_csv(file, rows, columns).inspect_err(|_| {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "could not remove partial export");
        }
    })
}

fn export_err(e: csv::Error) -> CoreError {
    CoreError::Export {
        message: e.to_string(),
    }
}
