// ── Core error types ──
//
// Caller-facing errors from sdpctl-core. Payloads are plain strings so a
// failed login can be cached and handed to every waiting caller. The
// `From<sdpctl_api::Error>` impl translates wire-level errors into this
// taxonomy.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Configuration errors (raised before any I/O) ─────────────────
    #[error("Invalid controller URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid bearer token: {reason}")]
    InvalidToken { reason: String },

    #[error("Missing credentials: {message}")]
    MissingCredentials { message: String },

    /// `version` is wide enough to report values read from flags or files
    /// that do not fit a client-API version at all.
    #[error("Unsupported client version {version} (supported: {min}..={max})")]
    UnsupportedVersion { version: i64, min: u16, max: u16 },

    #[error("Invalid certificate in {path}: {reason}")]
    InvalidCertificate { path: String, reason: String },

    // ── Login errors ─────────────────────────────────────────────────
    #[error(
        "Controller rejected client version {requested} (supported: {}..={}): {message}",
        fmt_bound(.min),
        fmt_bound(.max)
    )]
    VersionNotAccepted {
        requested: u16,
        min: Option<u16>,
        max: Option<u16>,
        message: String,
    },

    #[error("Controller unavailable: {message}")]
    ControllerUnavailable {
        /// HTTP status of the last failed attempt, if one was received.
        status: Option<u16>,
        message: String,
    },

    #[error("Login failed: {message}")]
    LoginFailed {
        message: String,
        /// HTTP status, when the controller answered at all.
        status: Option<u16>,
        /// The failure came from certificate trust, not from the controller.
        tls: bool,
    },
}

#[allow(clippy::ref_option)]
fn fmt_bound(bound: &Option<u16>) -> String {
    bound.map_or_else(|| "?".into(), |b| b.to_string())
}

impl CoreError {
    /// Returns `true` for the one kind a later login attempt may clear.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ControllerUnavailable { .. })
    }

    /// Returns `true` if the error was raised by validation or trust-store
    /// construction, i.e. before any network activity.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. }
                | Self::InvalidToken { .. }
                | Self::MissingCredentials { .. }
                | Self::UnsupportedVersion { .. }
                | Self::InvalidCertificate { .. }
        )
    }
}

// ── Conversion from wire-level errors ────────────────────────────────

impl From<sdpctl_api::Error> for CoreError {
    fn from(err: sdpctl_api::Error) -> Self {
        let tls = err.is_tls();
        let status = err.status();
        match err {
            sdpctl_api::Error::InvalidUrl(e) => CoreError::InvalidUrl {
                url: String::new(),
                reason: e.to_string(),
            },
            sdpctl_api::Error::UnsupportedVersion { version, min, max } => {
                CoreError::UnsupportedVersion {
                    version: version.into(),
                    min,
                    max,
                }
            }
            sdpctl_api::Error::InvalidCertificate { path, reason } => {
                CoreError::InvalidCertificate { path, reason }
            }
            sdpctl_api::Error::VersionNotAccepted {
                requested,
                min,
                max,
                message,
            } => CoreError::VersionNotAccepted {
                requested,
                min,
                max,
                message,
            },
            sdpctl_api::Error::ControllerUnavailable { status, message } => {
                CoreError::ControllerUnavailable {
                    status: Some(status),
                    message,
                }
            }
            sdpctl_api::Error::Timeout { timeout_secs } => CoreError::ControllerUnavailable {
                status: None,
                message: format!("no answer within {timeout_secs}s"),
            },
            other @ (sdpctl_api::Error::Tls(_)
            | sdpctl_api::Error::Rejected { .. }
            | sdpctl_api::Error::Transport(_)
            | sdpctl_api::Error::Deserialization { .. }) => CoreError::LoginFailed {
                message: error_chain(&other),
                status,
                tls,
            },
        }
    }
}

/// Render an error and its sources as `outer: inner: innermost`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let inner_text = inner.to_string();
        if !text.contains(&inner_text) {
            text.push_str(": ");
            text.push_str(&inner_text);
        }
        source = inner.source();
    }
    text
}
