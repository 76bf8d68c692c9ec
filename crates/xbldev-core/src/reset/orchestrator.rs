//! Drives submit and poll cycles for single users and batches.

use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{info, instrument, warn};
use url::Url;
use xbldev_auth::AccountType;

use crate::authorizer::Authorizer;
use crate::contract::DEFAULT_JOB_SERVICE_URL;
use crate::error::{Error, Result};
use crate::http::HttpTransport;

use super::client::JobClient;
use super::model::{BatchReport, ChunkReport, JobHandle, ResetOutcome};
use super::poller::{DEFAULT_POLL_INTERVAL, JobPoller};

/// Users per batch job.
pub const BATCH_CHUNK_SIZE: usize = 10;

/// Splits user ids into batch chunks, preserving order.
#[must_use]
pub fn plan_chunks(user_ids: &[String]) -> Vec<&[String]> {
    user_ids.chunks(BATCH_CHUNK_SIZE).collect()
}

/// How batch chunks are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// One chunk's submit and poll completes before the next starts.
    #[default]
    Sequential,
    /// Up to this many chunks are in flight at once.
    Overlapped(usize),
}

impl BatchMode {
    /// Chooses the mode for an account: only publisher accounts overlap.
    #[must_use]
    pub const fn for_account(account_type: AccountType, concurrency: usize) -> Self {
        if account_type.is_privileged() && concurrency > 1 {
            Self::Overlapped(concurrency)
        } else {
            Self::Sequential
        }
    }
}

/// Reset settings.
#[derive(Debug, Clone)]
pub struct ResetConfig {
    /// Job service base URL.
    pub job_service_url: Url,
    /// Delay between status requests.
    pub poll_interval: Duration,
    /// Batch scheduling.
    pub batch_mode: BatchMode,
}

impl ResetConfig {
    /// Creates a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> ResetConfigBuilder {
        ResetConfigBuilder::default()
    }
}

impl Default for ResetConfig {
    fn default() -> Self {
        ResetConfigBuilder::default().build()
    }
}

/// Builder for [`ResetConfig`].
#[derive(Debug, Clone, Default)]
pub struct ResetConfigBuilder {
    job_service_url: Option<Url>,
    poll_interval: Option<Duration>,
    batch_mode: BatchMode,
}

impl ResetConfigBuilder {
    /// Sets the job service base URL.
    #[must_use]
    pub fn job_service_url(mut self, url: Url) -> Self {
        self.job_service_url = Some(url);
        self
    }

    /// Sets the delay between status requests.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets batch scheduling.
    #[must_use]
    pub const fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ResetConfig {
        let job_service_url = self
            .job_service_url
            .or_else(|| Url::parse(DEFAULT_JOB_SERVICE_URL).ok())
            .unwrap_or_else(|| unreachable!("built-in job service URL is valid"));
        ResetConfig {
            job_service_url,
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            batch_mode: self.batch_mode,
        }
    }
}

/// Runs player data resets.
#[derive(Debug, Clone)]
pub struct ResetOrchestrator {
    client: JobClient,
    poller: JobPoller,
    mode: BatchMode,
}

impl ResetOrchestrator {
    /// Creates an orchestrator sending requests through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, config: ResetConfig) -> Self {
        let client = JobClient::new(transport, config.job_service_url);
        let poller = JobPoller::new(client.clone()).with_interval(config.poll_interval);
        Self {
            client,
            poller,
            mode: config.batch_mode,
        }
    }

    /// Resets the data of one player in a title and sandbox.
    ///
    /// A failed submission yields `CompletedWithError` without polling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the session cannot authorize a request.
    #[instrument(skip(self, authorizer), fields(scid = %scid, sandbox = %sandbox))]
    pub async fn reset_player_data(
        &self,
        authorizer: &dyn Authorizer,
        scid: &str,
        sandbox: &str,
        xuid: &str,
    ) -> Result<ResetOutcome> {
        let submitted = self.client.submit(authorizer, scid, sandbox, xuid).await;
        self.finish(authorizer, submitted).await
    }

    /// Resets the data of many players, one job per chunk of
    /// [`BATCH_CHUNK_SIZE`] users. Reports come back in chunk order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the session cannot authorize a request,
    /// and [`Error::InvalidRequest`] for an empty user list.
    #[instrument(skip(self, authorizer, user_ids), fields(scid = %scid, sandbox = %sandbox, users = user_ids.len()))]
    pub async fn reset_batch(
        &self,
        authorizer: &dyn Authorizer,
        scid: &str,
        sandbox: &str,
        user_ids: &[String],
    ) -> Result<BatchReport> {
        if user_ids.is_empty() {
            return Err(Error::InvalidRequest("no users to reset".to_string()));
        }

        let planned = plan_chunks(user_ids);
        info!(chunks = planned.len(), mode = ?self.mode, "Starting batch reset");

        let in_flight = match self.mode {
            BatchMode::Sequential => 1,
            BatchMode::Overlapped(limit) => limit.max(1),
        };
        // `buffered` yields in input order even when later chunks finish first.
        let chunks: Vec<ChunkReport> = stream::iter(planned)
            .map(|chunk| self.reset_chunk(authorizer, scid, sandbox, chunk))
            .buffered(in_flight)
            .try_collect()
            .await?;

        Ok(BatchReport { chunks })
    }

    async fn reset_chunk(
        &self,
        authorizer: &dyn Authorizer,
        scid: &str,
        sandbox: &str,
        user_ids: &[String],
    ) -> Result<ChunkReport> {
        let submitted = self
            .client
            .submit_batch(authorizer, scid, sandbox, user_ids)
            .await;
        let outcome = self.finish(authorizer, submitted).await?;
        Ok(ChunkReport {
            user_ids: user_ids.to_vec(),
            outcome,
        })
    }

    async fn finish(
        &self,
        authorizer: &dyn Authorizer,
        submitted: Result<JobHandle>,
    ) -> Result<ResetOutcome> {
        let job = match submitted {
            Ok(job) => job,
            Err(e) if e.is_session() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Job submission failed");
                return Ok(ResetOutcome::failed(&e));
            }
        };

        let outcome = self.poller.poll(authorizer, &job).await?;
        info!(job_id = %job.job_id, result = %outcome.result, "Reset finished");
        Ok(outcome)
    }
}
