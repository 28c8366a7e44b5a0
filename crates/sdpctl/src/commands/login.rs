//! `sdpctl login`: negotiate a session and report what the controller said.

use chrono::SecondsFormat;
use secrecy::ExposeSecret;
use serde::Serialize;

use sdpctl_core::Config;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct LoginReport {
    client_version: u16,
    appliance_version: String,
    estimated: bool,
    latest_supported_version: String,
    user: Option<String>,
    expires: Option<String>,
    message_of_the_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

pub async fn handle(config: &Config, args: &LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = config.client()?;
    let token = client.get_token().await?;
    let session = client.session().await;

    let (appliance_version, estimated) = client
        .appliance_version()
        .map(|v| (v.to_string(), v.is_estimated()))
        .unwrap_or_default();

    let report = LoginReport {
        client_version: client.requested_version(),
        appliance_version,
        estimated,
        latest_supported_version: client.latest_supported_version().to_string(),
        user: session.as_ref().and_then(|s| s.user.clone()),
        expires: session
            .as_ref()
            .and_then(|s| s.expires)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        message_of_the_day: session.as_ref().and_then(|s| s.message_of_the_day.clone()),
        token: args
            .show_token
            .then(|| token.expose_secret().to_owned()),
    };
    tracing::info!(
        appliance_version = %report.appliance_version,
        estimated = report.estimated,
        "login succeeded"
    );

    let out = output::render_single(
        global.output,
        &report,
        |r| {
            let mut fields = vec![
                ("Client API", r.client_version.to_string()),
                ("Appliance", r.appliance_version.clone()),
                ("Latest known", r.latest_supported_version.clone()),
            ];
            if let Some(ref user) = r.user {
                fields.push(("User", user.clone()));
            }
            if let Some(ref expires) = r.expires {
                fields.push(("Expires", expires.clone()));
            }
            if let Some(ref motd) = r.message_of_the_day {
                fields.push(("Message", motd.clone()));
            }
            if let Some(ref token) = r.token {
                fields.push(("Authorization", token.clone()));
            }
            fields
        },
        |r| r.token.clone().unwrap_or_else(|| r.appliance_version.clone()),
    )?;
    output::print_output(&out);
    Ok(())
}
