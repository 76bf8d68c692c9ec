//! `signin`, `signout` and `show`.

use anyhow::{Context as _, Result, bail};
use xbldev_auth::{AccountSource, AuthSession, AuthenticatedAccount};

use super::{Context, Status};
use crate::config::{clear_account, load_account, save_account};
use crate::identity::provider_for;

pub async fn sign_in(
    ctx: &Context,
    source: Option<AccountSource>,
    user: Option<&str>,
) -> Result<Status> {
    let source = source.unwrap_or(ctx.config.account_source);
    let session = AuthSession::new(provider_for(source, &ctx.config)?);

    let account = session.sign_in(user).await.context("sign-in failed")?;
    save_account(&ctx.paths, &account).await?;

    println!(
        "Signed in as {} ({}), {} account",
        account.display_name, account.account_moniker, account.account_type
    );
    Ok(Status::Success)
}

pub async fn sign_out(ctx: &Context) -> Result<Status> {
    let Some(account) = load_account(&ctx.paths).await? else {
        bail!("not signed in");
    };

    let session = AuthSession::new(provider_for(account.account_source, &ctx.config)?);
    session.resume(account).await;
    let account = session.sign_out().await?;
    clear_account(&ctx.paths).await?;

    println!("Signed out {}", account.account_moniker);
    Ok(Status::Success)
}

pub async fn show(ctx: &Context) -> Result<Status> {
    match load_account(&ctx.paths).await? {
        Some(account) => print!("{}", describe(&account)),
        None => println!("Not signed in"),
    }
    Ok(Status::Success)
}

fn describe(account: &AuthenticatedAccount) -> String {
    format!(
        "Display name: {}\nAccount id:   {}\nAccount type: {}\nSign-in name: {}\nSource:       {}\n",
        account.display_name,
        account.account_id,
        account.account_type,
        account.account_moniker,
        account.account_source,
    )
}
