// ── Session client ──
//
// Lazily authenticated handle to one controller. The first `get_token()`
// runs the login negotiation; everyone else waits on the same mutex and
// sees the same outcome. Failures are cached until `reset()`.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use sdpctl_api::login::{bearer, peer_media_type};
use sdpctl_api::transport::TlsMode;
use sdpctl_api::{ApplianceVersion, LoginClient, LoginCredentials, Session};

use crate::config::{AuthMode, Config};
use crate::error::CoreError;

// ── AuthStatus ───────────────────────────────────────────────────

/// Authentication state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    Authenticating,
    Authenticated,
    /// Last login failed; stays here until [`SessionClient::reset`].
    Failed,
}

enum AuthState {
    Unauthenticated,
    Authenticated(Arc<Session>),
    Failed(CoreError),
}

// ── SessionClient ────────────────────────────────────────────────

/// Authenticated (or about to be) handle to a controller.
///
/// Created by [`Config::client`]. Share it behind an `Arc`; all methods
/// take `&self`.
pub struct SessionClient {
    api: LoginClient,
    config: Config,
    mode: AuthMode,
    tls: TlsMode,
    /// Sent with every password login of this client.
    device_id: String,
    state: Mutex<AuthState>,
    status: watch::Sender<AuthStatus>,
    /// Catalog estimate until a login succeeds, then the negotiated version.
    appliance_version: ArcSwapOption<ApplianceVersion>,
    latest_supported_version: ApplianceVersion,
}

impl SessionClient {
    pub(crate) fn new(api: LoginClient, config: Config, mode: AuthMode, tls: TlsMode) -> Self {
        let catalog = api.catalog();
        let latest_supported_version = catalog.latest_supported_version();
        let estimate = catalog.estimate(config.version).ok().map(Arc::new);
        let (status, _) = watch::channel(AuthStatus::Unauthenticated);

        Self {
            api,
            config,
            mode,
            tls,
            device_id: uuid::Uuid::new_v4().to_string(),
            state: Mutex::new(AuthState::Unauthenticated),
            status,
            appliance_version: ArcSwapOption::new(estimate),
            latest_supported_version,
        }
    }

    /// The low-level client bound to this controller.
    pub fn api(&self) -> &LoginClient {
        &self.api
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Credential this client authenticates with.
    pub fn auth_mode(&self) -> AuthMode {
        self.mode
    }

    /// Trust mode the transport was built with.
    pub fn tls_mode(&self) -> &TlsMode {
        &self.tls
    }

    /// Client-API version requested from the controller.
    pub fn requested_version(&self) -> u16 {
        self.config.version
    }

    /// Current appliance version.
    ///
    /// Before a successful login this is the catalog estimate for the
    /// requested version (`None` if the catalog does not know it). Call
    /// [`get_token`](Self::get_token) first when comparing against a
    /// capability threshold.
    pub fn appliance_version(&self) -> Option<ApplianceVersion> {
        self.appliance_version.load_full().map(|v| (*v).clone())
    }

    /// Appliance version of the newest client-API version this build knows.
    pub fn latest_supported_version(&self) -> &ApplianceVersion {
        &self.latest_supported_version
    }

    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    /// Watch authentication state transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    /// Session details of the last successful login.
    pub async fn session(&self) -> Option<Arc<Session>> {
        match &*self.state.lock().await {
            AuthState::Authenticated(session) => Some(Arc::clone(session)),
            _ => None,
        }
    }

    /// Return the `Bearer <token>` value, logging in first if needed.
    ///
    /// Concurrent callers are serialized: one negotiation runs, the rest
    /// observe its result. A failure is returned to every later caller
    /// until [`reset`](Self::reset).
    pub async fn get_token(&self) -> Result<SecretString, CoreError> {
        let mut state = self.state.lock().await;
        match &*state {
            AuthState::Authenticated(session) => return Ok(session.token.clone()),
            AuthState::Failed(err) => return Err(err.clone()),
            AuthState::Unauthenticated => {}
        }

        let mut guard = StatusGuard::enter(&self.status);
        match self.negotiate().await {
            Ok(session) => {
                let token = session.token.clone();
                self.appliance_version
                    .store(Some(Arc::new(session.appliance_version.clone())));
                *state = AuthState::Authenticated(Arc::new(session));
                guard.finish(AuthStatus::Authenticated);
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                *state = AuthState::Failed(err.clone());
                guard.finish(AuthStatus::Failed);
                Err(err)
            }
        }
    }

    /// Forget the cached token or failure. The next `get_token()` logs in again.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = AuthState::Unauthenticated;
        let estimate = self
            .api
            .catalog()
            .estimate(self.config.version)
            .ok()
            .map(Arc::new);
        self.appliance_version.store(estimate);
        self.status.send_replace(AuthStatus::Unauthenticated);
        debug!("session reset");
    }

    /// Attach the Authorization and version headers to a collaborator request.
    pub async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, CoreError> {
        let token = self.get_token().await?;
        Ok(request
            .header(AUTHORIZATION, token.expose_secret())
            .header(ACCEPT, peer_media_type(self.config.version)))
    }

    async fn negotiate(&self) -> Result<Session, CoreError> {
        match self.mode {
            AuthMode::BearerToken => {
                let raw = self
                    .config
                    .bearer_token
                    .as_ref()
                    .map(|t| t.expose_secret().trim().to_owned())
                    .unwrap_or_default();
                let appliance_version = self.api.catalog().estimate(self.config.version)?;
                info!(%appliance_version, "using pre-issued bearer token");
                Ok(Session {
                    token: bearer(&raw),
                    appliance_version,
                    user: None,
                    expires: None,
                    message_of_the_day: None,
                })
            }
            AuthMode::Password => {
                let credentials = LoginCredentials {
                    provider: self.config.provider.clone(),
                    username: self.config.username.clone().unwrap_or_default(),
                    password: self
                        .config
                        .password
                        .clone()
                        .unwrap_or_else(|| SecretString::from(String::new())),
                    device_id: self.device_id.clone(),
                };
                let session = self
                    .api
                    .login(&credentials, self.config.version, self.config.login_timeout)
                    .await?;
                Ok(session)
            }
        }
    }
}

/// Publishes `Authenticating` and rolls back to `Unauthenticated` if the
/// login future is dropped before finishing.
struct StatusGuard<'a> {
    status: &'a watch::Sender<AuthStatus>,
    done: bool,
}

impl<'a> StatusGuard<'a> {
    fn enter(status: &'a watch::Sender<AuthStatus>) -> Self {
        status.send_replace(AuthStatus::Authenticating);
        Self {
            status,
            done: false,
        }
    }

    fn finish(&mut self, next: AuthStatus) {
        self.status.send_replace(next);
        self.done = true;
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.status.send_replace(AuthStatus::Unauthenticated);
        }
    }
}
