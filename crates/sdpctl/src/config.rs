//! Settings resolution: defaults, TOML file, `SDPCTL_*` environment, flags.
//!
//! Produces a `sdpctl_core::Config`; the core crate itself never reads files
//! or the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use sdpctl_core::{
    Config, DEFAULT_CLIENT_VERSION, DEFAULT_PROVIDER, VersionCatalog, narrow_client_version,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

const ENV_PREFIX: &str = "SDPCTL_";

/// Flat settings as found in `config.toml` or `SDPCTL_*` variables.
#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Wider than a client-API version so out-of-range values reach
    /// catalog validation instead of failing to deserialize.
    #[serde(default = "default_client_version")]
    pub client_version: i64,
    #[serde(default)]
    pub insecure: bool,
    pub pem_file_path: Option<PathBuf>,
    /// Seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Seconds.
    #[serde(default = "default_login_timeout")]
    pub login_timeout: u64,
    #[serde(default)]
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            bearer_token: None,
            provider: default_provider(),
            client_version: default_client_version(),
            insecure: false,
            pem_file_path: None,
            timeout: default_timeout(),
            login_timeout: default_login_timeout(),
            debug: false,
        }
    }
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.into()
}
fn default_client_version() -> i64 {
    DEFAULT_CLIENT_VERSION.into()
}
fn default_timeout() -> u64 {
    20
}
fn default_login_timeout() -> u64 {
    10
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sdpctl", "sdpctl").map_or_else(
        || PathBuf::from(".sdpctl.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from the config file (missing file is fine) and environment.
pub fn load_settings(path: &Path) -> Result<Settings, CliError> {
    let settings = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    Ok(settings)
}

/// Apply command-line overrides on top of loaded settings.
pub fn apply_flags(mut settings: Settings, global: &GlobalOpts) -> Settings {
    fn set<T: Clone>(slot: &mut Option<T>, flag: Option<&T>) {
        if let Some(value) = flag {
            *slot = Some(value.clone());
        }
    }

    set(&mut settings.url, global.url.as_ref());
    set(&mut settings.username, global.username.as_ref());
    set(&mut settings.password, global.password.as_ref());
    set(&mut settings.bearer_token, global.bearer_token.as_ref());
    set(&mut settings.pem_file_path, global.pem_file.as_ref());
    if let Some(ref provider) = global.provider {
        settings.provider.clone_from(provider);
    }
    if let Some(version) = global.client_version {
        settings.client_version = version;
    }
    if let Some(timeout) = global.timeout {
        settings.timeout = timeout;
    }
    if let Some(login_timeout) = global.login_timeout {
        settings.login_timeout = login_timeout;
    }
    settings.insecure |= global.insecure;
    settings.debug |= global.debug;
    settings
}

/// Translate resolved settings into a core `Config`.
pub fn to_core_config(settings: Settings) -> Result<Config, CliError> {
    let url = settings.url.ok_or_else(|| CliError::NoController {
        path: config_path().display().to_string(),
    })?;
    let version = narrow_client_version(settings.client_version, &VersionCatalog::default())?;

    Ok(Config {
        url,
        username: settings.username,
        password: settings.password.map(SecretString::from),
        bearer_token: settings.bearer_token.map(SecretString::from),
        provider: settings.provider,
        version,
        insecure: settings.insecure,
        pem_file_path: settings.pem_file_path,
        timeout: Duration::from_secs(settings.timeout),
        login_timeout: Duration::from_secs(settings.login_timeout),
        debug: settings.debug,
    })
}

/// Full resolution: file + env + flags → core `Config`.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = global.config.clone().unwrap_or_else(config_path);
    let settings = apply_flags(load_settings(&path)?, global);
    to_core_config(settings)
}
