//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use shopdesk_config::ConfigError;
use shopdesk_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const SERVER: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend: {reason}")]
    #[diagnostic(
        code(shopdesk::connection_failed),
        help(
            "Check that the backend is running and the API URL is correct.\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out: {reason}")]
    #[diagnostic(
        code(shopdesk::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(shopdesk::auth_failed),
        help(
            "Verify your token.\n\
             Run: shopdesk config set-token --profile {profile}"
        )
    )]
    AuthFailed { message: String, profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource} '{identifier}' not found")]
    #[diagnostic(
        code(shopdesk::not_found),
        help("Run: shopdesk list {resource} to see available records")
    )]
    NotFound {
        resource: String,
        identifier: String,
    },

    #[error("Server error (HTTP {status}): {message}")]
    #[diagnostic(code(shopdesk::server_error))]
    Server { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(shopdesk::decode))]
    Decode { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(shopdesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(shopdesk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: shopdesk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(shopdesk::no_config),
        help(
            "Create a profile with: shopdesk config init\n\
             Or pass --api-url / set SHOPDESK_API_URL.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(shopdesk::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(shopdesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("Export failed: {message}")]
    #[diagnostic(code(shopdesk::export))]
    Export { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(shopdesk::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    #[diagnostic(code(shopdesk::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Server { .. } | Self::Decode { .. } => exit_code::SERVER,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { resource, id } => CliError::NotFound {
                resource,
                identifier: id,
            },
            CoreError::Validation { message, .. } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Network {
                reason,
                timed_out: true,
            } => CliError::Timeout { reason },
            CoreError::Network { reason, .. } => CliError::ConnectionFailed { reason },
            CoreError::Server { status, message } => CliError::Server { status, message },
            CoreError::Unauthorized { message } => CliError::AuthFailed {
                message,
                profile: "default".into(),
            },
            CoreError::Decode { message } => CliError::Decode { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Export { message } => CliError::Export { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
