//! Generic resource command handlers.

use serde::Serialize;
use tabled::Tabled;

use shopdesk_core::{Console, OptionItem, Record, Resource};

use crate::cli::{
    CreateArgs, DeleteArgs, GetArgs, GlobalOpts, ListArgs, OptionsArgs, OutputFormat, StatusArgs,
    UpdateArgs,
};
use crate::error::CliError;
use crate::output;

use super::util::{self, Payload};

#[derive(Tabled)]
struct OptionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
}

fn option_row(o: &OptionItem) -> OptionRow {
    OptionRow {
        id: o.id.to_string(),
        label: o.label.clone(),
    }
}

#[derive(Serialize)]
struct Affected<'a> {
    resource: &'a str,
    ids: &'a [String],
}

fn print_record(record: &Record, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_record(global.output, record)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Reads ────────────────────────────────────────────────────────────

pub async fn list(console: &Console, args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut list = util::open_list(console, &args.query, global)?;

    let spinner = output::spinner(&format!("Loading {}", args.query.resource), global.quiet);
    let result = list.refresh().await;
    spinner.finish_and_clear();
    result?;

    let view = list.view();
    let out = output::render_records(global.output, view.rows(), &args.query.columns)?;
    output::print_output(&out, global.quiet);

    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        if let Some(meta) = view.meta() {
            eprintln!(
                "Page {}/{} ({} total)",
                meta.page,
                meta.total_pages.max(1),
                meta.total
            );
        }
    }
    Ok(())
}

pub async fn get(console: &Console, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let hooks = console.hooks::<Record>(&args.resource);
    let record = hooks
        .queries
        .get(Some(args.id.as_str()))
        .await?
        .ok_or_else(|| CliError::Validation {
            field: "id".into(),
            reason: "must not be empty".into(),
        })?;
    print_record(&record, global)
}

pub async fn options(
    console: &Console,
    args: OptionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let hooks = console.hooks::<Record>(&args.resource);
    let items = hooks.queries.options(args.parent.as_deref()).await?;
    let out = output::render_rows(global.output, items.as_slice(), option_row, |o| o.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Writes ───────────────────────────────────────────────────────────

pub async fn create(
    console: &Console,
    args: CreateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let hooks = console.hooks::<Record>(&args.resource);
    let record = match util::build_payload(&args.payload)? {
        Payload::Json(body) => hooks.mutations.create(&body).await?,
        Payload::Multipart(form) => hooks.mutations.create_multipart(form).await?,
    };
    if !global.quiet {
        eprintln!("Created {} {}", args.resource, record.id().unwrap_or("(no id)"));
    }
    print_record(&record, global)
}

pub async fn update(
    console: &Console,
    args: UpdateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let hooks = console.hooks::<Record>(&args.resource);
    let record = match util::build_payload(&args.payload)? {
        Payload::Json(body) => hooks.mutations.update(&args.id, &body).await?,
        Payload::Multipart(form) => hooks.mutations.update_multipart(&args.id, form).await?,
    };
    if !global.quiet {
        eprintln!("Updated {} {}", args.resource, args.id);
    }
    print_record(&record, global)
}

pub async fn delete(
    console: &Console,
    args: DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let prompt = match args.ids.as_slice() {
        [one] => format!("Delete {} {one}?", args.resource),
        many => format!("Delete {} {}?", many.len(), args.resource),
    };
    if !util::confirm(&prompt, global)? {
        return Ok(());
    }

    let hooks = console.hooks::<Record>(&args.resource);
    let spinner = output::spinner("Deleting", global.quiet);
    let result = match args.ids.as_slice() {
        [one] => hooks.mutations.delete(one).await,
        many => hooks.mutations.bulk_delete(many).await,
    };
    spinner.finish_and_clear();
    result?;

    if !global.quiet {
        eprintln!("Deleted {} {}", args.ids.len(), args.resource);
    }
    emit_affected(&args.resource, &args.ids, global)
}

pub async fn set_active(
    console: &Console,
    args: StatusArgs,
    active: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let hooks = console.hooks::<Record>(&args.resource);
    hooks.mutations.set_active(&args.ids, active).await?;
    if !global.quiet {
        let verb = if active { "Activated" } else { "Deactivated" };
        eprintln!("{verb} {} {}", args.ids.len(), args.resource);
    }
    emit_affected(&args.resource, &args.ids, global)
}

/// Structured formats echo the affected ids so scripts can chain.
fn emit_affected(resource: &str, ids: &[String], global: &GlobalOpts) -> Result<(), CliError> {
    let out = match global.output {
        OutputFormat::Table => return Ok(()),
        OutputFormat::Plain => ids.join("\n"),
        other => output::render_structured(other, &Affected { resource, ids })?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
