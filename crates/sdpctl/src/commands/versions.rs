//! `sdpctl versions`: the client-API version catalog compiled into this build.

use serde::Serialize;
use tabled::Tabled;

use sdpctl_core::VersionCatalog;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct VersionEntry {
    client_version: u16,
    appliance_version: String,
    default: bool,
    latest: bool,
}

#[derive(Tabled)]
struct VersionRow {
    #[tabled(rename = "Client API")]
    client_version: u16,
    #[tabled(rename = "Appliance")]
    appliance_version: String,
    #[tabled(rename = "")]
    marker: &'static str,
}

impl From<&VersionEntry> for VersionRow {
    fn from(e: &VersionEntry) -> Self {
        let marker = match (e.default, e.latest) {
            (true, true) => "default, latest",
            (true, false) => "default",
            (false, true) => "latest",
            (false, false) => "",
        };
        Self {
            client_version: e.client_version,
            appliance_version: e.appliance_version.clone(),
            marker,
        }
    }
}

fn entries(catalog: &VersionCatalog) -> Vec<VersionEntry> {
    let default = catalog.default_client_version();
    let latest = catalog.latest_client_version();
    catalog
        .iter()
        .map(|(client_version, appliance)| VersionEntry {
            client_version,
            appliance_version: appliance.to_string(),
            default: client_version == default,
            latest: client_version == latest,
        })
        .collect()
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let data = entries(&VersionCatalog::default());
    let out = output::render_list(global.output, &data, |e| VersionRow::from(e), |e| {
        format!("{}\t{}", e.client_version, e.appliance_version)
    })?;
    output::print_output(&out);
    Ok(())
}
