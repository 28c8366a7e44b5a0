//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use sdpctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const AUTH: i32 = 3;
    pub const VERSION: i32 = 4;
    pub const CONFIG: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("No controller URL configured")]
    #[diagnostic(
        code(sdpctl::no_controller),
        help(
            "Pass --url, set SDPCTL_URL, or add `url = \"...\"` to {path}"
        )
    )]
    NoController { path: String },

    #[error("Could not load settings")]
    #[diagnostic(code(sdpctl::settings))]
    Settings(#[source] Box<figment::Error>),

    #[error("{message}")]
    #[diagnostic(
        code(sdpctl::invalid_config),
        help("Fix the setting above; `sdpctl validate` checks without contacting the controller.")
    )]
    InvalidConfig { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(sdpctl::unsupported_version),
        help("Run `sdpctl versions` to list the client versions this build supports.")
    )]
    UnsupportedVersion { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(sdpctl::certificate),
        help(
            "Point --pem-file at a PEM file with the controller's certificate,\n\
             or use --insecure (-k) for lab controllers."
        )
    )]
    Certificate { message: String },

    // ── Login ────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(sdpctl::version_not_accepted),
        help("Retry with --client-version {range}.")
    )]
    VersionNotAccepted { message: String, range: String },

    #[error("{message}")]
    #[diagnostic(
        code(sdpctl::controller_unavailable),
        help("The controller kept failing for the whole login window; try a larger --login-timeout.")
    )]
    ControllerUnavailable { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(sdpctl::login_failed),
        help("{hint}")
    )]
    LoginFailed { message: String, hint: String },

    // ── Output ───────────────────────────────────────────────────────
    #[error("Failed to render output: {0}")]
    #[diagnostic(code(sdpctl::output))]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Map error variant to process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoController { .. }
            | Self::Settings(_)
            | Self::InvalidConfig { .. }
            | Self::Certificate { .. } => exit_code::CONFIG,
            Self::UnsupportedVersion { .. } | Self::VersionNotAccepted { .. } => {
                exit_code::VERSION
            }
            Self::ControllerUnavailable { .. } => exit_code::CONNECTION,
            Self::LoginFailed { .. } => exit_code::AUTH,
            Self::Output(_) => exit_code::GENERAL,
        }
    }
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Settings(Box::new(err))
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::InvalidUrl { .. }
            | CoreError::InvalidToken { .. }
            | CoreError::MissingCredentials { .. } => Self::InvalidConfig { message },
            CoreError::UnsupportedVersion { .. } => Self::UnsupportedVersion { message },
            CoreError::InvalidCertificate { .. } => Self::Certificate { message },
            CoreError::VersionNotAccepted { min, max, .. } => {
                let range = match (min, max) {
                    (Some(min), Some(max)) => format!("between {min} and {max}"),
                    _ => "the controller supports".into(),
                };
                Self::VersionNotAccepted { message, range }
            }
            CoreError::ControllerUnavailable { .. } => Self::ControllerUnavailable { message },
            CoreError::LoginFailed { tls: true, .. } => Self::LoginFailed {
                message,
                hint: "TLS verification failed. Use --pem-file with the controller's \
                       certificate, or --insecure (-k) for lab controllers."
                    .into(),
            },
            CoreError::LoginFailed { status: Some(401 | 403), .. } => Self::LoginFailed {
                message,
                hint: "Verify --username, --password, and --provider.".into(),
            },
            CoreError::LoginFailed { .. } => Self::LoginFailed {
                message,
                hint: "Check that the controller URL points at the admin API root.".into(),
            },
        }
    }
}
