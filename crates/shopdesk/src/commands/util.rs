//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use shopdesk_core::{
    ColumnDef, ColumnSort, Console, CoreError, FilePart, MultipartPayload, Record, ResourceClient,
    ResourceList, SortOrder, TableController,
};

use crate::cli::{GlobalOpts, PayloadArgs, QueryArgs};
use crate::error::CliError;
use crate::output::{self, StderrNotifier};

type HttpList = ResourceList<Record, ResourceClient<Record>>;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, global: &GlobalOpts) -> Result<bool, CliError> {
    if global.yes {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// A request body assembled from `--data`, `--from-file`, `--set` and
/// `--attach`.
#[derive(Debug)]
pub enum Payload {
    Json(Value),
    Multipart(MultipartPayload),
}

pub fn build_payload(args: &PayloadArgs) -> Result<Payload, CliError> {
    let base = match (&args.data, &args.from_file) {
        (Some(raw), _) => serde_json::from_str(raw)?,
        (None, Some(path)) => read_json_file(path)?,
        (None, None) => Value::Object(Map::new()),
    };
    let Value::Object(mut fields) = base else {
        return Err(CliError::Validation {
            field: "data".into(),
            reason: "payload must be a JSON object".into(),
        });
    };
    for (key, value) in &args.fields {
        fields.insert(key.clone(), Value::String(value.clone()));
    }
    if fields.is_empty() && args.files.is_empty() {
        return Err(CliError::Validation {
            field: "data".into(),
            reason: "nothing to send; use --data, --from-file, --set or --attach".into(),
        });
    }

    if args.files.is_empty() {
        return Ok(Payload::Json(Value::Object(fields)));
    }

    let mut payload =
        MultipartPayload::from_serialize(&Value::Object(fields)).map_err(CoreError::from)?;
    for (field, path) in &args.files {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| field.clone(), |n| n.to_string_lossy().into_owned());
        payload = payload.file(field.clone(), FilePart::new(name, bytes));
    }
    Ok(Payload::Multipart(payload))
}

/// Build a list controller from `list`/`export` query flags.
pub fn open_list(
    console: &Console,
    query: &QueryArgs,
    global: &GlobalOpts,
) -> Result<HttpList, CliError> {
    let columns: Vec<ColumnDef> = query
        .columns
        .iter()
        .map(|c| ColumnDef::new(c.clone(), c.clone()))
        .collect();

    let notifier = StderrNotifier::new(output::should_color(global.color), global.quiet);
    let mut list = console.list::<Record>(
        &query.resource,
        TableController::new(columns),
        Arc::new(notifier),
    );

    if let Some(search) = &query.search {
        list.set_search(search.clone());
    }
    for (key, value) in &query.filters {
        if !list.set_filter(key, value.clone()) {
            return Err(CliError::Validation {
                field: "filter".into(),
                reason: format!("'{key}' is reserved; use the dedicated flag"),
            });
        }
    }
    if let Some(sort) = &query.sort {
        let order = if query.desc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        list.set_sorting(vec![ColumnSort {
            column: sort.clone(),
            order,
        }]);
    }
    if let Some(size) = query.page_size {
        list.set_page_size(size);
    }
    list.set_page(query.page);
    Ok(list)
}
