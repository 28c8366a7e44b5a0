// sdpctl-api: login, TLS trust, and client-API version negotiation for SDP controllers

pub mod catalog;
pub mod error;
pub mod login;
pub mod models;
pub mod transport;
pub mod version;

pub use catalog::{DEFAULT_CLIENT_VERSION, VersionCatalog};
pub use error::Error;
pub use login::{LoginClient, LoginCredentials, LoginOutcome, RetryPolicy, Session};
pub use transport::{TlsMode, TransportConfig};
pub use version::ApplianceVersion;
