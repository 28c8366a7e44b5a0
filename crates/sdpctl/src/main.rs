mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, debug: bool) {
    let level = if debug { verbosity.max(3) } else { verbosity };
    let filter = match level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // The catalog is compiled in; no controller settings needed
        Command::Versions => commands::versions::handle(&cli.global),

        Command::Validate(ref args) => {
            let core_config = config::resolve(&cli.global)?;
            commands::validate::handle(&core_config, args, &cli.global)
        }

        Command::Login(ref args) => {
            let core_config = config::resolve(&cli.global)?;
            tracing::debug!(url = %core_config.url, version = core_config.version, "logging in");
            commands::login::handle(&core_config, args, &cli.global).await
        }
    }
}
