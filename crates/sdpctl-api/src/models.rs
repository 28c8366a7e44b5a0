// Login wire models
//
// Request and response bodies of `POST /login`. Only the fields this crate
// acts on are typed; everything else the controller sends is kept in
// `extra` so debug output can show it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub provider_name: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    /// Stable per-session device identifier.
    pub device_id: &'a str,
}

/// Successful login response.
///
/// `version` is only present on controllers that report it; newer
/// appliances omit it and the caller falls back to the catalog estimate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_of_the_day: Option<String>,
}

/// The authenticated administrator, as echoed by the controller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub name: String,
    #[serde(default)]
    pub need_two_factor_auth: bool,
    #[serde(default)]
    pub can_access_audit_logs: bool,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Error body shared by 4xx/5xx responses.
///
/// The supported-version bounds are only present on 406.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub min_supported_version: Option<u16>,
    #[serde(default)]
    pub max_supported_version: Option<u16>,
}

impl ErrorResponse {
    /// Best-effort parse; non-JSON bodies keep their text as the message.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            message: (!body.trim().is_empty()).then(|| body.chars().take(200).collect()),
            ..Self::default()
        })
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_owned())
    }
}
