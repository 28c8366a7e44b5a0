// Shared transport configuration for building reqwest::Client instances.
//
// Resolves the trust mode from the caller's `insecure` / PEM settings and
// turns it into a ready HTTP client. Certificate files are read and parsed
// here, before any network activity, so an unusable trust store is a
// construction error rather than a login error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rustls_pki_types::CertificateDer;
use rustls_pki_types::pem::PemObject;
use tracing::{debug, warn};

use crate::error::Error;

const USER_AGENT: &str = concat!("sdpctl/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Trust the certificates in the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (lab and test controllers only).
    DangerAcceptInvalid,
}

impl TlsMode {
    /// Pick the trust mode for a connection.
    ///
    /// A PEM file wins over `insecure`: when both are set the pinned
    /// certificates are used and verification stays on.
    pub fn resolve(insecure: bool, pem_file: Option<&Path>) -> Self {
        match (pem_file, insecure) {
            (Some(path), _) => Self::CustomCa(path.to_path_buf()),
            (None, true) => Self::DangerAcceptInvalid,
            (None, false) => Self::System,
        }
    }

    /// `true` if certificate verification is disabled.
    pub fn is_insecure(&self) -> bool {
        matches!(self, Self::DangerAcceptInvalid)
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Log connection-level reads and writes.
    pub verbose: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(20),
            verbose: false,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .connection_verbose(self.verbose);

        match &self.tls {
            TlsMode::System => {
                debug!("using system trust store");
            }
            TlsMode::CustomCa(path) => {
                for cert in load_pem_certificates(path)? {
                    builder = builder.add_root_certificate(cert);
                }
                debug!(path = %path.display(), "using pinned certificates");
            }
            TlsMode::DangerAcceptInvalid => {
                warn!("TLS certificate verification is disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder.build().map_err(|e| match &self.tls {
            TlsMode::CustomCa(path) => Error::InvalidCertificate {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
            _ => Error::Tls(format!("failed to build HTTP client: {e}")),
        })
    }
}

/// Read and parse every certificate in a PEM file.
///
/// Fails if the file is unreadable, any `CERTIFICATE` block is malformed,
/// or the file holds no certificate at all.
pub fn load_pem_certificates(path: &Path) -> Result<Vec<reqwest::Certificate>, Error> {
    let invalid = |reason: String| Error::InvalidCertificate {
        path: path.display().to_string(),
        reason,
    };

    let pem = std::fs::read(path).map_err(|e| invalid(format!("failed to read file: {e}")))?;

    let certs = CertificateDer::pem_slice_iter(&pem)
        .map(|der| {
            let der = der.map_err(|e| invalid(format!("malformed PEM: {e}")))?;
            reqwest::Certificate::from_der(der.as_ref())
                .map_err(|e| invalid(format!("unusable certificate: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if certs.is_empty() {
        return Err(invalid("no certificates found".into()));
    }
    Ok(certs)
}
