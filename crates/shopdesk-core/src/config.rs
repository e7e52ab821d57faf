// ── Runtime console configuration ──
//
// Describes *how* to reach a shopdesk backend and how long reads stay
// fresh. Carries secrets but never touches disk: the CLI builds a
// `ConsoleConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use shopdesk_api::{DEFAULT_PAGE_SIZE, TlsMode, TransportConfig};
use url::Url;

use crate::cache::DEFAULT_STALE_TIME;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// API root, e.g. `https://shop.example.com/api`.
    pub api_url: Url,
    /// Bearer token, if the backend requires one.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// How long a cached read is served without a request.
    pub stale_time: Duration,
    pub page_size: u32,
}

impl ConsoleConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            stale_time: DEFAULT_STALE_TIME,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            token: self.token.clone(),
        }
    }
}
