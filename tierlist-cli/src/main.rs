use clap::Parser;
use std::process;
use tierlist::TierlistConfig;

mod cli;
mod commands;
mod display;

use cli::Cli;
use commands::CliContext;

const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    configure_logging(cli.verbose, cli.debug, cli.quiet);

    let mut config = match TierlistConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load configuration: {}", e);
            eprintln!("Warning: Configuration loading failed: {}", e);
            eprintln!("Continuing with default configuration...");
            TierlistConfig::default()
        }
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let context = CliContext::new(config);
    let code = match commands::run(&context, cli.command).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            EXIT_ERROR
        }
    };
    process::exit(code);
}

/// Install a stderr subscriber at the level picked by the global flags
fn configure_logging(verbose: bool, debug: bool, quiet: bool) {
    use tracing::Level;
    use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

    let log_level = if quiet {
        Level::ERROR
    } else if debug {
        Level::DEBUG
    } else if verbose {
        Level::TRACE
    } else {
        Level::WARN
    };

    registry()
        .with(EnvFilter::new(format!("hyper=warn,reqwest=warn,{log_level}")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
