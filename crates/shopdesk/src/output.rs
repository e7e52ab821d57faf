//! Output formatting: table, JSON, YAML, plain.
//!
//! Records are schemaless, so tables are built column by column from
//! dotted field paths rather than from a `Tabled` derive.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use shopdesk_core::{Notice, NoticeLevel, Notifier, Record, Resource};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render records in the chosen format. `columns` are dotted paths; when
/// empty, `id` plus the first record's top-level fields are used.
pub fn render_records(
    format: OutputFormat,
    records: &[Record],
    columns: &[String],
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_record_table(records, columns)),
        OutputFormat::Plain => Ok(records
            .iter()
            .filter_map(|r| r.id().map(str::to_owned))
            .collect::<Vec<_>>()
            .join("\n")),
        other => render_structured(other, records),
    }
}

/// Render one record; tables show it as a two-column field/value list.
pub fn render_record(format: OutputFormat, record: &Record) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            if let Some(id) = record.id() {
                builder.push_record(["id", id]);
            }
            for (key, value) in &record.fields {
                builder.push_record([key.clone(), cell_text(Some(value))]);
            }
            Ok(builder.build().with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(record.id().unwrap_or_default().to_owned()),
        other => render_structured(other, record),
    }
}

/// Render rows that have a `Tabled` form.
pub fn render_rows<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
        other => render_structured(other, data),
    }
}

/// JSON/YAML for any serializable value. Table and plain fall back to
/// pretty JSON.
pub fn render_structured<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    match format {
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => {
            serde_yaml::to_string(data).map_err(|e| CliError::Internal(e.to_string()))
        }
        OutputFormat::Json | OutputFormat::Table | OutputFormat::Plain => {
            Ok(serde_json::to_string_pretty(data)?)
        }
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Record tables ────────────────────────────────────────────────────

fn default_columns(records: &[Record]) -> Vec<String> {
    let mut columns = vec!["id".to_owned()];
    if let Some(first) = records.first() {
        columns.extend(first.fields.keys().cloned());
    }
    columns
}

fn render_record_table(records: &[Record], columns: &[String]) -> String {
    let columns = if columns.is_empty() {
        default_columns(records)
    } else {
        columns.to_vec()
    };

    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for record in records {
        builder.push_record(columns.iter().map(|c| {
            if c == "id" {
                record.id().unwrap_or_default().to_owned()
            } else {
                cell_text(record.get_path(c))
            }
        }));
    }
    builder.build().with(Style::rounded()).to_string()
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ── Notices and progress ─────────────────────────────────────────────

/// Prints list notices to stderr.
#[derive(Debug, Clone, Copy)]
pub struct StderrNotifier {
    color: bool,
    quiet: bool,
}

impl StderrNotifier {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self { color, quiet }
    }
}

impl Notifier for StderrNotifier {
    fn notify(&self, notice: Notice) {
        // Errors always surface; the rest respect --quiet.
        if self.quiet && notice.level != NoticeLevel::Error {
            return;
        }
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "done",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
        };
        let tag = if self.color {
            match notice.level {
                NoticeLevel::Info => tag.cyan().to_string(),
                NoticeLevel::Success => tag.green().to_string(),
                NoticeLevel::Warning => tag.yellow().to_string(),
                NoticeLevel::Error => tag.red().bold().to_string(),
            }
        } else {
            tag.to_owned()
        };
        eprintln!("{tag}: {}", notice.message);
    }
}

/// Spinner on stderr while a request runs; hidden when not interactive.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rows() -> Vec<Record> {
        vec![
            Record::new("1")
                .with("name", "Widget")
                .with("brand", serde_json::json!({ "name": "Acme" })),
            Record::new("2").with("name", "Gadget"),
        ]
    }

    #[test]
    fn plain_lists_ids() {
        let out = render_records(OutputFormat::Plain, &rows(), &[]).unwrap();
        assert_eq!(out, "1\n2");
    }

    #[test]
    fn table_resolves_dotted_columns() {
        let out = render_records(
            OutputFormat::Table,
            &rows(),
            &["name".to_owned(), "brand.name".to_owned()],
        )
        .unwrap();
        assert!(out.contains("brand.name"));
        assert!(out.contains("Acme"));
        assert!(out.contains("Gadget"));
    }

    #[test]
    fn compact_json_is_one_line() {
        let out = render_records(OutputFormat::JsonCompact, &rows(), &[]).unwrap();
        assert!(!out.contains('\n'));
        assert!(out.starts_with("[{\"id\":\"1\""));
    }
}
