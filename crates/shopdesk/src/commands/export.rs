//! CSV export of one loaded page.

use std::fs::File;
use std::path::Path;

use crate::cli::{ExportArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use shopdesk_core::Console;

use super::util;

pub async fn handle(
    console: &Console,
    args: ExportArgs,
    export_dir: &Path,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut list = util::open_list(console, &args.query, global)?;

    let spinner = output::spinner(&format!("Loading {}", args.query.resource), global.quiet);
    let result = list.refresh().await;
    spinner.finish_and_clear();
    result?;

    if args.ids.is_empty() {
        list.select_all();
    } else {
        for id in &args.ids {
            if !list.select_row(id, true) {
                return Err(CliError::NotFound {
                    resource: args.query.resource.clone(),
                    identifier: id.clone(),
                });
            }
        }
    }

    match args.out.as_deref() {
        Some(path) if path == Path::new("-") => {
            list.export_selected(std::io::stdout().lock())?;
        }
        Some(path) => {
            let file = File::create(path)?;
            if list.export_selected(file)? > 0 && !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
        None => {
            if let Some(path) = list.export_selected_to_dir(export_dir)? {
                output::print_output(&path.display().to_string(), global.quiet);
            }
        }
    }
    Ok(())
}
