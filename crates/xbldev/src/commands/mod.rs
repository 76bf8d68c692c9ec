//! Subcommand implementations.

mod auth;
mod reset;

use anyhow::Result;

use crate::cli::Commands;
use crate::config::{Config, Paths};

/// How a successfully executed command turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Everything succeeded.
    Success,
    /// The command ran, but at least one reset did not succeed.
    Incomplete,
}

/// Shared state for a command run.
pub struct Context {
    pub paths: Paths,
    pub config: Config,
}

pub async fn run(command: Commands, ctx: &Context) -> Result<Status> {
    match command {
        Commands::Signin { source, user } => auth::sign_in(ctx, source, user.as_deref()).await,
        Commands::Signout => auth::sign_out(ctx).await,
        Commands::Show => auth::show(ctx).await,
        Commands::Reset {
            scid,
            sandbox,
            xuids,
        } => reset::reset(ctx, &scid, &sandbox, &xuids).await,
    }
}
