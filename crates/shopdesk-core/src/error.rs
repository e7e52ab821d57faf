// ── Core error types ──
//
// User-facing errors from shopdesk-core. Callers see four request
// outcomes (not found, validation, network, server) instead of raw
// HTTP status codes. `CoreError::from_api` does the translation and
// attaches the resource name so messages read "customers 42 not found".

use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` so a failed read can be kept in list state and rendered
/// repeatedly without re-running the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Request outcomes ─────────────────────────────────────────────
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Rejected input: any 4xx other than 401/403/404, including 409.
    #[error("Validation failed: {message}")]
    Validation {
        status: Option<u16>,
        message: String,
    },

    /// No HTTP response arrived (connection refused, DNS, TLS, timeout).
    #[error("Network error: {reason}")]
    Network { reason: String, timed_out: bool },

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The backend answered 2xx with a body we could not decode.
    #[error("Unexpected response: {message}")]
    Decode { message: String },

    // ── Local failures ───────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Translate a transport-layer error for `resource` (and `id`, when
    /// the request targeted one record).
    pub fn from_api(err: shopdesk_api::Error, resource: &str, id: Option<&str>) -> Self {
        use shopdesk_api::Error as Api;

        match err {
            Api::NotFound { path } => CoreError::NotFound {
                resource: resource.to_owned(),
                id: id.map_or(path, str::to_owned),
            },
            Api::Unauthorized { message } => CoreError::Unauthorized { message },
            Api::Api {
                status, message, ..
            } => Self::from_status(status, message, resource, id),
            Api::Transport(ref e) => {
                if let Some(status) = e.status() {
                    Self::from_status(status.as_u16(), e.to_string(), resource, id)
                } else {
                    CoreError::Network {
                        reason: e.to_string(),
                        timed_out: e.is_timeout(),
                    }
                }
            }
            Api::Tls(reason) => CoreError::Network {
                reason: format!("TLS error: {reason}"),
                timed_out: false,
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("Base URL cannot carry resource paths: {url}"),
            },
            Api::Deserialization { message, .. } => CoreError::Decode { message },
            Api::Multipart(message) => CoreError::Validation {
                status: None,
                message,
            },
        }
    }

    fn from_status(status: u16, message: String, resource: &str, id: Option<&str>) -> Self {
        match status {
            404 => CoreError::NotFound {
                resource: resource.to_owned(),
                id: id.unwrap_or_default().to_owned(),
            },
            401 | 403 => CoreError::Unauthorized { message },
            500..=599 => CoreError::Server { status, message },
            _ => CoreError::Validation {
                status: Some(status),
                message,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server { .. })
    }
}

impl From<shopdesk_api::Error> for CoreError {
    fn from(err: shopdesk_api::Error) -> Self {
        Self::from_api(err, "resource", None)
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Validation {
            status: None,
            message: format!("payload is not valid JSON: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopdesk_api::Error as Api;

    fn api(status: u16, message: &str) -> Api {
        Api::Api {
            status,
            message: message.into(),
            code: None,
        }
    }

    #[test]
    fn not_found_keeps_resource_and_id() {
        let err = CoreError::from_api(
            Api::NotFound {
                path: "/customers/9".into(),
            },
            "customers",
            Some("9"),
        );
        assert_eq!(err.to_string(), "customers 9 not found");
    }

    #[test]
    fn not_found_without_id_falls_back_to_path() {
        let err = CoreError::from_api(
            Api::NotFound {
                path: "/customers".into(),
            },
            "customers",
            None,
        );
        assert!(matches!(err, CoreError::NotFound { id, .. } if id == "/customers"));
    }

    #[test]
    fn conflict_is_a_validation_failure() {
        let err = CoreError::from_api(api(409, "sku already exists"), "inventory", None);
        assert_eq!(
            err,
            CoreError::Validation {
                status: Some(409),
                message: "sku already exists".into()
            }
        );
    }

    #[test]
    fn five_hundreds_are_server_errors() {
        let err = CoreError::from_api(api(503, "maintenance"), "invoices", None);
        assert!(err.is_server());
    }

    #[test]
    fn tls_is_network() {
        assert!(CoreError::from(Api::Tls("bad cert".into())).is_network());
    }
}
