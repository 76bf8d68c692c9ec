//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use xbldev_auth::AccountSource;

#[derive(Debug, Parser)]
#[command(name = "xbldev")]
#[command(version, about = "Xbox Live title development tools")]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration directory (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in with a developer account
    Signin {
        /// Where the account comes from (dev-center, static-token)
        #[arg(long)]
        source: Option<AccountSource>,
        /// Sign-in name hint
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Sign out and forget stored credentials
    Signout,
    /// Show the signed-in account
    Show,
    /// Reset player data in a title and sandbox
    Reset {
        /// Service configuration id of the title
        #[arg(long)]
        scid: String,
        /// Sandbox id (e.g. XDKS.1)
        #[arg(long)]
        sandbox: String,
        /// Player XUIDs; more than one resets them in batches
        #[arg(long = "xuid", value_name = "XUID", required = true, num_args = 1..)]
        xuids: Vec<String>,
    },
}
