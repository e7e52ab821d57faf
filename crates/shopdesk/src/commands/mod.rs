//! Command dispatch: bridges CLI args -> core hooks -> output formatting.

pub mod config_cmd;
pub mod export;
pub mod records;
pub mod util;

use shopdesk_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    console: &Console,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => records::list(console, args, global).await,
        Command::Get(args) => records::get(console, args, global).await,
        Command::Options(args) => records::options(console, args, global).await,
        Command::Create(args) => records::create(console, args, global).await,
        Command::Update(args) => records::update(console, args, global).await,
        Command::Delete(args) => records::delete(console, args, global).await,
        Command::Activate(args) => records::set_active(console, args, true, global).await,
        Command::Deactivate(args) => records::set_active(console, args, false, global).await,
        Command::Export(args) => export::handle(console, args, &resolved.export_dir, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
