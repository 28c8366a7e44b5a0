use thiserror::Error;

/// Top-level error type for the `sdpctl-api` crate.
///
/// Covers trust-store construction, version lookup, and every way a login
/// exchange with the controller can end badly. `sdpctl-core` maps these into
/// the caller-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Client-API version is not a key of the catalog.
    #[error("Unsupported client version {version} (supported: {min}..={max})")]
    UnsupportedVersion { version: u16, min: u16, max: u16 },

    // ── TLS ─────────────────────────────────────────────────────────
    /// The configured PEM file could not be read or holds no usable certificate.
    #[error("Invalid certificate in {path}: {reason}")]
    InvalidCertificate { path: String, reason: String },

    /// The HTTP client could not be assembled with the requested TLS settings.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Negotiation ─────────────────────────────────────────────────
    /// HTTP 406: the controller does not speak the requested client version.
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

    /// HTTP 5xx: the controller is up but failing. Retried by the negotiator.
    #[error("Controller unavailable (HTTP {status}): {message}")]
    ControllerUnavailable { status: u16, message: String },

    /// Any other non-success status (bad credentials, forbidden, not found).
    #[error("Login rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, TLS handshake).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The login deadline elapsed before the controller answered.
    #[error("Login timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// Walk a source chain looking for a `rustls::Error`.
///
/// `tokio-rustls` reports handshake failures as an `io::Error` wrapping the
/// rustls error, and `io::Error::source` skips the wrapped value, so the
/// payload is inspected directly.
fn caused_by_tls(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        let wrapped = err
            .downcast_ref::<std::io::Error>()
            .and_then(std::io::Error::get_ref)
            .is_some_and(|inner| inner.is::<rustls::Error>());
        if wrapped || err.is::<rustls::Error>() {
            return true;
        }
        current = err.source();
    }
    false
}

#[allow(clippy::ref_option)]
fn fmt_bound(bound: &Option<u16>) -> String {
    bound.map_or_else(|| "?".into(), |b| b.to_string())
}

impl Error {
    /// Returns `true` if retrying the same login might succeed.
    ///
    /// Only server-side 5xx failures qualify; transport and TLS problems are
    /// surfaced on first occurrence.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ControllerUnavailable { .. })
    }

    /// Returns `true` if the failure stems from certificate trust rather than
    /// from the controller itself.
    pub fn is_tls(&self) -> bool {
        match self {
            Self::InvalidCertificate { .. } | Self::Tls(_) => true,
            Self::Transport(e) => std::error::Error::source(e).is_some_and(caused_by_tls),
            _ => false,
        }
    }

    /// HTTP status reported by the controller, if the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::VersionNotAccepted { .. } => Some(406),
            Self::ControllerUnavailable { status, .. } | Self::Rejected { status, .. } => {
                Some(*status)
            }
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_server_errors_are_transient() {
        let unavailable = Error::ControllerUnavailable {
            status: 503,
            message: "busy".into(),
        };
        let rejected = Error::Rejected {
            status: 401,
            message: "bad password".into(),
        };
        let not_accepted = Error::VersionNotAccepted {
            requested: 99,
            min: Some(7),
            max: Some(15),
            message: "nope".into(),
        };

        assert!(unavailable.is_transient());
        assert!(!rejected.is_transient());
        assert!(!not_accepted.is_transient());
    }

    #[test]
    fn version_not_accepted_names_the_range() {
        let err = Error::VersionNotAccepted {
            requested: 99,
            min: Some(7),
            max: Some(15),
            message: "Unsupported API version".into(),
        };
        let text = err.to_string();
        assert!(text.contains("99"), "{text}");
        assert!(text.contains("7..=15"), "{text}");
        assert_eq!(err.status(), Some(406));
    }

    #[test]
    fn wrapped_rustls_errors_count_as_tls() {
        let handshake = std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        );
        assert!(caused_by_tls(&handshake));

        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert!(!caused_by_tls(&refused));

        let mentions_certificate = std::io::Error::other("certificate store offline");
        assert!(!caused_by_tls(&mentions_certificate));
    }

    #[test]
    fn certificate_errors_count_as_tls() {
        let err = Error::InvalidCertificate {
            path: "ca.pem".into(),
            reason: "no certificates found".into(),
        };
        assert!(err.is_tls());
        assert!(!err.is_transient());
    }
}
