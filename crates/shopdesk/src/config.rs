//! Profile resolution with CLI flag overrides on top of `shopdesk-config`.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use shopdesk_config::{self as sdcfg, Config};
use shopdesk_core::{ConsoleConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use sdcfg::{config_path, load_config_or_default, save_config};

/// Everything a resource command needs from configuration.
#[derive(Debug)]
pub struct Resolved {
    pub console: ConsoleConfig,
    pub export_dir: PathBuf,
}

/// Profile name from `--profile`, else the config default, else `default`.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build a `ConsoleConfig` from the config file, profile, and CLI flags.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut console = if let Some(profile) = cfg.profiles.get(&profile_name) {
        sdcfg::profile_to_console_config(profile, &profile_name, &cfg.defaults)?
    } else {
        // No profile: --api-url alone is enough, unless a profile was
        // asked for by name.
        if let Some(name) = &global.profile {
            return Err(CliError::ProfileNotFound {
                name: name.clone(),
                available: available_profiles(&cfg),
            });
        }
        let url_str = global.api_url.as_deref().ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;
        let mut console = ConsoleConfig::new(parse_url(url_str)?);
        console.timeout = Duration::from_secs(cfg.defaults.timeout);
        console.stale_time = Duration::from_secs(cfg.defaults.stale_time_secs);
        console.page_size = cfg.defaults.page_size.max(1);
        console
    };

    if let Some(url) = &global.api_url {
        console.api_url = parse_url(url)?;
    }
    if let Some(token) = &global.token {
        console.token = Some(SecretString::from(token.clone()));
    }
    if global.insecure {
        console.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        console.timeout = Duration::from_secs(secs);
    }

    let export_dir = cfg
        .defaults
        .export_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(Resolved {
        console,
        export_dir,
    })
}

fn parse_url(raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}
