//! `sdpctl validate`: pre-flight checks, no network traffic.

use serde::Serialize;

use sdpctl_core::{AuthMode, Config, TlsMode, VersionCatalog};

use crate::cli::{GlobalOpts, ValidateArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Report {
    url: String,
    auth: &'static str,
    provider: String,
    client_version: u16,
    estimated_appliance_version: Option<String>,
    tls: String,
}

fn auth_label(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::BearerToken => "bearer-token",
        AuthMode::Password => "password",
    }
}

fn tls_label(mode: &TlsMode) -> String {
    match mode {
        TlsMode::System => "system roots".into(),
        TlsMode::CustomCa(path) => format!("pinned ({})", path.display()),
        TlsMode::DangerAcceptInvalid => "insecure".into(),
    }
}

pub fn handle(config: &Config, args: &ValidateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let catalog = VersionCatalog::default();
    let mode = config.validate(&catalog, args.require_credentials)?;
    // Loads the PEM trust store; still nothing is sent.
    let client = config.client()?;

    let report = Report {
        url: client.api().base_url().to_string(),
        auth: auth_label(mode),
        provider: config.provider.clone(),
        client_version: config.version,
        estimated_appliance_version: client.appliance_version().map(|v| v.to_string()),
        tls: tls_label(client.tls_mode()),
    };

    let out = output::render_single(
        global.output,
        &report,
        |r| {
            vec![
                ("URL", r.url.clone()),
                ("Auth", r.auth.to_string()),
                ("Provider", r.provider.clone()),
                ("Client API", r.client_version.to_string()),
                (
                    "Appliance",
                    r.estimated_appliance_version.clone().unwrap_or_default(),
                ),
                ("TLS", r.tls.clone()),
            ]
        },
        |_| "ok".into(),
    )?;
    output::print_output(&out);
    Ok(())
}
