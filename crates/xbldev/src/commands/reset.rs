//! `reset`.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tracing::info;
use xbldev_auth::AuthSession;
use xbldev_core::{
    BatchMode, BatchReport, ReqwestTransport, ResetConfig, ResetOrchestrator, ResetOutcome,
};

use super::{Context, Status};
use crate::config::load_account;
use crate::identity::provider_for;

pub async fn reset(ctx: &Context, scid: &str, sandbox: &str, xuids: &[String]) -> Result<Status> {
    let Some(account) = load_account(&ctx.paths).await? else {
        bail!("not signed in; run `xbldev signin` first");
    };

    let mode = BatchMode::for_account(account.account_type, ctx.config.batch_concurrency);
    let session = AuthSession::new(provider_for(account.account_source, &ctx.config)?);
    session.resume(account).await;

    let config = ResetConfig::builder()
        .job_service_url(ctx.config.job_service_url.clone())
        .poll_interval(ctx.config.poll_interval())
        .batch_mode(mode)
        .build();
    let orchestrator = ResetOrchestrator::new(Arc::new(ReqwestTransport::default()), config);

    if let [xuid] = xuids {
        info!(scid, sandbox, "Resetting one player");
        let outcome = orchestrator
            .reset_player_data(&session, scid, sandbox, xuid)
            .await
            .map_err(session_error)?;
        print!("{}", render_outcome(&outcome));
        return Ok(status_of(outcome.is_success()));
    }

    let report = orchestrator
        .reset_batch(&session, scid, sandbox, xuids)
        .await
        .map_err(session_error)?;
    print!("{}", render_batch(&report));
    Ok(status_of(report.is_success()))
}

const fn status_of(success: bool) -> Status {
    if success {
        Status::Success
    } else {
        Status::Incomplete
    }
}

fn session_error(error: xbldev_core::Error) -> anyhow::Error {
    anyhow!("{error} ({})", error.kind().advice())
}

fn render_outcome(outcome: &ResetOutcome) -> String {
    let mut out = format!("Result: {}\n", outcome.result);
    for provider in &outcome.provider_statuses {
        let _ = write!(out, "  {:<24} {}", provider.provider, provider.status);
        if let Some(message) = &provider.error_message {
            let _ = write!(out, " ({message})");
        }
        out.push('\n');
    }
    if let Some(message) = &outcome.error_message {
        let _ = writeln!(out, "Error: {message}");
        if let Some(kind) = outcome.error_kind {
            let _ = writeln!(out, "Hint: {}", kind.advice());
        }
    }
    out
}

fn render_batch(report: &BatchReport) -> String {
    let mut out = String::new();
    let total = report.chunks.len();
    for (i, chunk) in report.chunks.iter().enumerate() {
        let _ = writeln!(
            out,
            "Batch {}/{} ({} players)",
            i + 1,
            total,
            chunk.user_ids.len()
        );
        out.push_str(&render_outcome(&chunk.outcome));
    }
    let _ = writeln!(out, "Overall: {}", report.overall());
    out
}
