// Controller login and version negotiation
//
// `POST {base}/login` with the requested client-API version carried in the
// `Accept` media type. Each response is first classified into a
// `LoginOutcome`; the retry loop in `LoginClient::login` only looks at the
// outcome tag, never at status codes or bodies.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::catalog::VersionCatalog;
use crate::error::Error;
use crate::models::{ErrorResponse, LoginRequest, LoginResponse};
use crate::transport::TransportConfig;
use crate::version::ApplianceVersion;

/// Media type carrying the requested client-API version, e.g.
/// `application/vnd.appgate.peer-v15+json`.
pub fn peer_media_type(version: u16) -> String {
    format!("application/vnd.appgate.peer-v{version}+json")
}

// ── Credentials / Session ────────────────────────────────────────────

/// Username/password login material.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    /// Identity provider name (`local` for built-in accounts).
    pub provider: String,
    pub username: String,
    pub password: SecretString,
    /// Identifies this client across retries; generated once per session.
    pub device_id: String,
}

/// Result of a successful negotiation.
#[derive(Debug, Clone)]
pub struct Session {
    /// Authorization header value: `Bearer <token>`.
    pub token: SecretString,
    pub appliance_version: ApplianceVersion,
    pub user: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub message_of_the_day: Option<String>,
}

/// Wrap a raw controller token as an Authorization header value.
pub fn bearer(raw: &str) -> SecretString {
    SecretString::from(format!("Bearer {raw}"))
}

// ── LoginOutcome ─────────────────────────────────────────────────────

/// Classified response of a single login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    /// 2xx with a token.
    Success(LoginResponse),
    /// 406: the requested client version is outside the controller's range.
    VersionRejected {
        min: Option<u16>,
        max: Option<u16>,
        message: String,
    },
    /// 5xx: the controller is failing; worth another attempt.
    Transient { status: u16, message: String },
    /// Anything else. Never retried.
    Fatal(Error),
}

impl LoginOutcome {
    /// Classify a controller response by status code and body.
    pub fn classify(status: StatusCode, body: &str) -> Self {
        if status.is_success() {
            return match serde_json::from_str::<LoginResponse>(body) {
                Ok(resp) if !resp.token.is_empty() => Self::Success(resp),
                Ok(_) => Self::Fatal(Error::Deserialization {
                    message: "login response carries no token".into(),
                    body: String::new(),
                }),
                Err(e) => Self::Fatal(Error::Deserialization {
                    message: format!("malformed login response: {e}"),
                    body: body.chars().take(200).collect(),
                }),
            };
        }

        let err = ErrorResponse::from_body(body);
        if status == StatusCode::NOT_ACCEPTABLE {
            Self::VersionRejected {
                min: err.min_supported_version,
                max: err.max_supported_version,
                message: err.message_or("client version not accepted"),
            }
        } else if status.is_server_error() {
            Self::Transient {
                status: status.as_u16(),
                message: err.message_or(status.canonical_reason().unwrap_or("server error")),
            }
        } else {
            Self::Fatal(Error::Rejected {
                status: status.as_u16(),
                message: err.message_or(status.canonical_reason().unwrap_or("login rejected")),
            })
        }
    }
}

// ── RetryPolicy ──────────────────────────────────────────────────────

/// Exponential backoff between transient login failures.
///
/// The overall budget is the login timeout passed to
/// [`LoginClient::login`]; this only shapes the gaps between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the second attempt. Default: 500ms.
    pub initial_delay: Duration,
    /// Upper bound on a single delay. Default: 5s.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// `min(initial * 2^attempt, max)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Pause before retry `attempt` when `remaining` budget is left.
    ///
    /// The backoff delay is shortened to half of what remains so the retry
    /// still has time to run, but never below `initial_delay`, and never past
    /// the deadline.
    pub fn wait(&self, attempt: u32, remaining: Duration) -> Duration {
        self.delay(attempt)
            .min(remaining / 2)
            .max(self.initial_delay)
            .min(remaining)
    }
}

// ── LoginClient ──────────────────────────────────────────────────────

/// HTTP client bound to one controller's admin API root.
///
/// Owns the trust-configured `reqwest::Client`; resource collaborators reuse
/// it through [`http()`](Self::http) once a token is obtained.
#[derive(Debug, Clone)]
pub struct LoginClient {
    http: reqwest::Client,
    base_url: Url,
    catalog: Arc<VersionCatalog>,
    retry: RetryPolicy,
    debug: bool,
}

impl LoginClient {
    /// Create a login client, building the HTTP client from `transport`.
    ///
    /// Certificate problems surface here, before any request is sent.
    pub fn new(
        base_url: Url,
        catalog: Arc<VersionCatalog>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            catalog,
            retry: RetryPolicy::default(),
            debug: transport.verbose,
        })
    }

    /// Create a login client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, catalog: Arc<VersionCatalog>) -> Self {
        Self {
            http,
            base_url,
            catalog,
            retry: RetryPolicy::default(),
            debug: false,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The controller admin API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn catalog(&self) -> &Arc<VersionCatalog> {
        &self.catalog
    }

    /// Build `{base}/{path}` without dropping the base path.
    pub fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Send one login request and classify the response.
    pub async fn attempt(&self, credentials: &LoginCredentials, version: u16) -> LoginOutcome {
        let url = match self.api_url("login") {
            Ok(url) => url,
            Err(e) => return LoginOutcome::Fatal(e),
        };

        debug!(%url, version, provider = %credentials.provider, "logging in");

        let body = LoginRequest {
            provider_name: &credentials.provider,
            username: &credentials.username,
            password: credentials.password.expose_secret(),
            device_id: &credentials.device_id,
        };

        let resp = match self
            .http
            .post(url)
            .header(ACCEPT, peer_media_type(version))
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return LoginOutcome::Fatal(Error::Transport(e)),
        };

        let status = resp.status();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => return LoginOutcome::Fatal(Error::Transport(e)),
        };

        // Success bodies carry the token and are never logged.
        if self.debug && !status.is_success() {
            trace!(status = status.as_u16(), body = %text, "login response");
        }

        LoginOutcome::classify(status, &text)
    }

    /// Log in, retrying transient controller failures until `login_timeout`
    /// has elapsed in total. The last transient error is returned once the
    /// deadline has passed.
    ///
    /// `version` is sent as-is; a 406 ends the negotiation. A zero timeout
    /// allows exactly one unbounded attempt.
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
        version: u16,
        login_timeout: Duration,
    ) -> Result<Session, Error> {
        let deadline = Instant::now() + login_timeout;
        let mut last_error: Option<Error> = None;
        let mut attempt: u32 = 0;

        loop {
            let outcome = if login_timeout.is_zero() {
                self.attempt(credentials, version).await
            } else {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    warn!(attempt, "login budget exhausted");
                    return Err(last_error.unwrap_or(Error::Timeout {
                        timeout_secs: login_timeout.as_secs(),
                    }));
                }
                match tokio::time::timeout(remaining, self.attempt(credentials, version)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(attempt, "login deadline elapsed mid-attempt");
                        return Err(last_error.unwrap_or(Error::Timeout {
                            timeout_secs: login_timeout.as_secs(),
                        }));
                    }
                }
            };

            match outcome {
                LoginOutcome::Success(resp) => return self.establish(resp, version),
                LoginOutcome::VersionRejected { min, max, message } => {
                    return Err(Error::VersionNotAccepted {
                        requested: version,
                        min,
                        max,
                        message,
                    });
                }
                LoginOutcome::Fatal(err) => return Err(err),
                LoginOutcome::Transient { status, message } => {
                    let err = Error::ControllerUnavailable { status, message };
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if login_timeout.is_zero() || remaining.is_zero() {
                        warn!(attempt, status, "login budget exhausted");
                        return Err(err);
                    }
                    let delay = self.retry.wait(attempt, remaining);
                    warn!(attempt, status, ?delay, "controller unavailable, retrying login");
                    last_error = Some(err);
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    /// Turn an accepted login into a session, resolving the appliance version.
    ///
    /// The controller's self-report wins; without one the catalog estimate
    /// for `version` is used.
    fn establish(&self, resp: LoginResponse, version: u16) -> Result<Session, Error> {
        let appliance_version = match resp.version.as_deref() {
            Some(raw) => match raw.parse::<ApplianceVersion>() {
                Ok(reported) => reported,
                Err(e) => {
                    warn!(error = %e, "unparseable controller version, using estimate");
                    self.catalog.estimate(version)?
                }
            },
            None => self.catalog.estimate(version)?,
        };

        info!(
            %appliance_version,
            estimated = appliance_version.is_estimated(),
            "login successful"
        );

        Ok(Session {
            token: bearer(&resp.token),
            appliance_version,
            user: resp.user.map(|u| u.name),
            expires: resp.expires,
            message_of_the_day: resp.message_of_the_day,
        })
    }
}
