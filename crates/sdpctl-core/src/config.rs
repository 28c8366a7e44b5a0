// ── Runtime connection configuration ──
//
// Describes *how* to reach and authenticate against one controller.
// Carries credential data and connection tuning, but never touches disk
// or the environment. The CLI (or any other host) builds a `Config` and
// hands it in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use sdpctl_api::transport::{TlsMode, TransportConfig};
use sdpctl_api::{DEFAULT_CLIENT_VERSION, LoginClient, VersionCatalog};

use crate::error::CoreError;
use crate::session::SessionClient;

/// Identity provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "local";

/// Connection parameters for a single controller.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin API root, e.g. `https://controller.example.com:8443/admin`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Pre-issued token (base64). Used as-is instead of a password login.
    pub bearer_token: Option<SecretString>,
    /// Identity provider name.
    pub provider: String,
    /// Client-API version to request.
    pub version: u16,
    /// Skip certificate verification. Ignored when `pem_file_path` is set.
    pub insecure: bool,
    /// PEM file with the certificate(s) to trust.
    pub pem_file_path: Option<PathBuf>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Budget for the whole login negotiation, retries included.
    pub login_timeout: Duration,
    /// Verbose transport logging.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            bearer_token: None,
            provider: DEFAULT_PROVIDER.into(),
            version: DEFAULT_CLIENT_VERSION,
            insecure: false,
            pem_file_path: None,
            timeout: Duration::from_secs(20),
            login_timeout: Duration::from_secs(10),
            debug: false,
        }
    }
}

/// Which credential a validated config will authenticate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Pre-issued bearer token, no login round trip.
    BearerToken,
    /// Username/password login against the identity provider.
    Password,
}

impl Config {
    /// Check the config against `catalog` without touching the network.
    ///
    /// A valid bearer token satisfies the credential requirement on its own
    /// unless `require_credentials` is set, in which case username and
    /// password must be present regardless.
    pub fn validate(
        &self,
        catalog: &VersionCatalog,
        require_credentials: bool,
    ) -> Result<AuthMode, CoreError> {
        self.parse_url()?;
        let mode = self.check_credentials(require_credentials)?;
        if !catalog.contains(self.version) {
            let (min, max) = catalog.range();
            return Err(CoreError::UnsupportedVersion {
                version: self.version.into(),
                min,
                max,
            });
        }
        Ok(mode)
    }

    /// Parse the controller URL. Must be absolute with a host.
    pub fn parse_url(&self) -> Result<Url, CoreError> {
        let invalid = |reason: String| CoreError::InvalidUrl {
            url: self.url.clone(),
            reason,
        };
        let url = Url::parse(self.url.trim()).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("expected an absolute URL with scheme and host".into()));
        }
        Ok(url)
    }

    fn check_credentials(&self, require_credentials: bool) -> Result<AuthMode, CoreError> {
        let token = self
            .bearer_token
            .as_ref()
            .map(|t| t.expose_secret())
            .filter(|t| !t.is_empty());
        if let Some(token) = token {
            STANDARD
                .decode(token.trim())
                .map_err(|e| CoreError::InvalidToken {
                    reason: format!("not valid base64: {e}"),
                })?;
        }

        let has_password_login = self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self
                .password
                .as_ref()
                .is_some_and(|p| !p.expose_secret().is_empty());

        match (token.is_some(), has_password_login) {
            (_, false) if require_credentials => Err(CoreError::MissingCredentials {
                message: "username and password are required".into(),
            }),
            (true, _) => Ok(AuthMode::BearerToken),
            (false, true) => Ok(AuthMode::Password),
            (false, false) => Err(CoreError::MissingCredentials {
                message: "set a bearer token, or both username and password".into(),
            }),
        }
    }

    /// Trust mode derived from `insecure` and `pem_file_path`.
    pub fn tls_mode(&self) -> TlsMode {
        TlsMode::resolve(self.insecure, self.pem_file_path.as_deref())
    }

    /// Build an unauthenticated [`SessionClient`] using the built-in catalog.
    ///
    /// URL, token format, credentials, and the trust store are checked here;
    /// nothing is sent until the first [`SessionClient::get_token`]. The
    /// requested version is left for the controller to accept or reject.
    pub fn client(&self) -> Result<SessionClient, CoreError> {
        self.client_with_catalog(Arc::new(VersionCatalog::default()))
    }

    /// Same as [`client`](Self::client) with an explicit catalog.
    pub fn client_with_catalog(
        &self,
        catalog: Arc<VersionCatalog>,
    ) -> Result<SessionClient, CoreError> {
        let url = self.parse_url()?;
        let mode = self.check_credentials(false)?;

        let transport = TransportConfig {
            tls: self.tls_mode(),
            timeout: self.timeout,
            verbose: self.debug,
        };
        let api = LoginClient::new(url, catalog, &transport)?;
        debug!(url = %api.base_url(), ?mode, tls = ?transport.tls, "controller client ready");

        Ok(SessionClient::new(api, self.clone(), mode, transport.tls))
    }
}

/// Narrow a client version read from a flag, env var, or file.
///
/// Hosts parse the setting as a wide integer so that values outside `u16`
/// (negative, or 70000) are reported against the catalog range instead of
/// failing as a parse error.
pub fn narrow_client_version(raw: i64, catalog: &VersionCatalog) -> Result<u16, CoreError> {
    u16::try_from(raw).map_err(|_| {
        let (min, max) = catalog.range();
        CoreError::UnsupportedVersion {
            version: raw,
            min,
            max,
        }
    })
}
