//! Clap derive structures for the `shopdesk` CLI.
//!
//! Every resource command takes the resource name as its first
//! argument (`shopdesk list customers`), so one command tree covers any
//! backend resource.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// shopdesk -- admin console for REST resource backends
#[derive(Debug, Parser)]
#[command(
    name = "shopdesk",
    version,
    about = "Browse and edit shop resources from the command line",
    long_about = "Admin console for a shop backend.\n\n\
        Every resource (customers, inventory, brands, ...) supports the same\n\
        list/get/create/update/delete operations over its REST endpoint.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "SHOPDESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, short = 'u', env = "SHOPDESK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token
    #[arg(long, env = "SHOPDESK_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SHOPDESK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SHOPDESK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SHOPDESK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List one page of a resource
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record
    Get(GetArgs),

    /// List id/label pairs for select inputs
    Options(OptionsArgs),

    /// Create a record
    Create(CreateArgs),

    /// Update a record
    Update(UpdateArgs),

    /// Delete one or more records
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Set isActive=true on records
    Activate(StatusArgs),

    /// Set isActive=false on records
    Deactivate(StatusArgs),

    /// Export one page of a resource to CSV
    Export(ExportArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Search, filter and sort arguments shared by `list` and `export`.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Resource name (e.g. customers, inventory)
    pub resource: String,

    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Field filter, repeatable (key=value)
    #[arg(long = "filter", short = 'f', value_parser = parse_key_val)]
    pub filters: Vec<(String, String)>,

    /// Sort field
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending (with --sort)
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Rows per page (defaults to the profile's page size)
    #[arg(long, short = 'l')]
    pub page_size: Option<u32>,

    /// Columns to show, comma-separated dotted paths (e.g. name,brand.name)
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub resource: String,
    pub id: String,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    pub resource: String,

    /// Only options belonging to this parent id
    #[arg(long)]
    pub parent: Option<String>,
}

/// Body sources for create/update. Files switch the request to multipart.
#[derive(Debug, Args)]
pub struct PayloadArgs {
    /// Inline JSON object
    #[arg(long, short = 'd', conflicts_with = "from_file")]
    pub data: Option<String>,

    /// Read the JSON object from a file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,

    /// Set a single string field, repeatable (key=value)
    #[arg(long = "set", value_parser = parse_key_val)]
    pub fields: Vec<(String, String)>,

    /// Attach a file field, repeatable (field=path); sends multipart
    #[arg(long = "attach", value_parser = parse_key_path)]
    pub files: Vec<(String, PathBuf)>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub resource: String,

    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub resource: String,
    pub id: String,

    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub resource: String,

    /// Record ids; more than one uses the bulk endpoint
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    pub resource: String,

    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Only export these ids from the page (default: every row)
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// Output file; `-` for stdout. Defaults to a timestamped file in
    /// the configured export directory
    #[arg(long = "out")]
    pub out: Option<PathBuf>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the current configuration
    Show,

    /// Set a profile field (api_url, token_env, ca_cert, insecure, timeout, page_size)
    Set {
        key: String,
        value: String,
    },

    /// Store a bearer token in the system keyring for the active profile
    SetToken,

    /// List configured profiles (* marks the default)
    Profiles,

    /// Make a profile the default
    Use { name: String },

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

fn parse_key_path(s: &str) -> Result<(String, PathBuf), String> {
    parse_key_val(s).map(|(k, v)| (k, PathBuf::from(v)))
}
