//! Caller-facing layer between `sdpctl-api` and hosts (CLI, resource providers).
//!
//! - **[`Config`]**: connection parameters plus the pre-flight
//!   [`validate()`](Config::validate) check (URL, bearer token, credentials,
//!   client-API version). Nothing here touches the network.
//!
//! - **[`SessionClient`]**: built by [`Config::client()`], which also
//!   resolves the TLS trust store. Authenticates lazily on the first
//!   [`get_token()`](SessionClient::get_token), serializing concurrent
//!   callers, and exposes the negotiated and latest-known appliance versions.
//!
//! - **[`CoreError`]**: the error taxonomy every operation reports.

pub mod config;
pub mod error;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthMode, Config, DEFAULT_PROVIDER, narrow_client_version};
pub use error::CoreError;
pub use session::{AuthStatus, SessionClient};

pub use sdpctl_api::{ApplianceVersion, DEFAULT_CLIENT_VERSION, TlsMode, VersionCatalog};
