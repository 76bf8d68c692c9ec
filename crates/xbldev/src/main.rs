//! `xbldev` - Xbox Live title development from the command line.
//!
//! Signs in with a developer account and resets player data in test
//! sandboxes.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod config;
mod identity;

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use commands::{Context, Status};
use config::{Config, Paths};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "xbldev=debug,xbldev_auth=debug,xbldev_core=debug"
    } else {
        "xbldev=info,xbldev_auth=warn,xbldev_core=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let paths = Paths::resolve(cli.config_dir);
    let config = match Config::load(&paths).await {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(2);
        }
    };
    debug!(?config, "Configuration loaded");

    let ctx = Context { paths, config };
    match commands::run(cli.command, &ctx).await {
        Ok(Status::Success) => ExitCode::SUCCESS,
        Ok(Status::Incomplete) => ExitCode::from(1),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
