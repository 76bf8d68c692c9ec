//! Bounded job status polling.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::authorizer::Authorizer;
use crate::error::{Error, Result};

use super::client::JobClient;
use super::model::{JobHandle, JobStatus, ProviderStatus, ResetOutcome};

/// Status requests issued before giving up.
pub const MAX_POLL_ATTEMPTS: u32 = 4;

/// Delay between status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Result of one status request.
#[derive(Debug)]
pub enum PollOutcome {
    /// The job finished.
    Terminal(JobStatus),
    /// The job is still running.
    Pending(JobStatus),
    /// The service answered 400, which it does while a job is queued.
    Queued,
    /// The request failed in a way that may go away on retry.
    TransientError(Error),
    /// The request failed for good.
    FatalError(Error),
}

/// Polls a submitted job until it finishes or the budget runs out.
#[derive(Debug, Clone)]
pub struct JobPoller {
    client: JobClient,
    interval: Duration,
    max_attempts: u32,
}

impl JobPoller {
    /// Creates a poller with the default interval and budget.
    #[must_use]
    pub const fn new(client: JobClient) -> Self {
        Self {
            client,
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }

    /// Sets the delay between status requests.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sends one status request and classifies the answer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the session cannot authorize the request.
    pub async fn poll_once(
        &self,
        authorizer: &dyn Authorizer,
        job: &JobHandle,
    ) -> Result<PollOutcome> {
        let response = match self.client.fetch_status(authorizer, job).await {
            Ok(response) => response,
            Err(e) if e.is_session() => return Err(e),
            Err(e) if e.kind().is_transient() => return Ok(PollOutcome::TransientError(e)),
            Err(e) => return Ok(PollOutcome::FatalError(e)),
        };

        if response.status == StatusCode::BAD_REQUEST {
            return Ok(PollOutcome::Queued);
        }

        let status: JobStatus = match response.error_for_status().and_then(|r| r.json()) {
            Ok(status) => status,
            Err(e) if e.kind().is_transient() => return Ok(PollOutcome::TransientError(e)),
            Err(e) => return Ok(PollOutcome::FatalError(e)),
        };

        if status.overall_status.is_terminal() {
            Ok(PollOutcome::Terminal(status))
        } else {
            Ok(PollOutcome::Pending(status))
        }
    }

    /// Polls until the job reaches a terminal status.
    ///
    /// Waits one interval before every request, including the first. Any
    /// failed request other than a 400 ends polling with
    /// `CompletedWithError` and no provider statuses. If the budget runs
    /// out the outcome is `Timeout` with the statuses last observed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the session cannot authorize a request.
    pub async fn poll(
        &self,
        authorizer: &dyn Authorizer,
        job: &JobHandle,
    ) -> Result<ResetOutcome> {
        let mut last_observed: Vec<ProviderStatus> = Vec::new();

        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;

            match self.poll_once(authorizer, job).await? {
                PollOutcome::Terminal(status) => {
                    debug!(job_id = %job.job_id, attempt, status = ?status.overall_status, "Job finished");
                    return Ok(ResetOutcome::from_terminal(status));
                }
                PollOutcome::Pending(status) => {
                    debug!(job_id = %job.job_id, attempt, status = ?status.overall_status, "Job still running");
                    last_observed = status.provider_statuses;
                }
                PollOutcome::Queued => {
                    debug!(job_id = %job.job_id, attempt, "Job queued");
                }
                PollOutcome::TransientError(e) | PollOutcome::FatalError(e) => {
                    warn!(job_id = %job.job_id, attempt, error = %e, "Status request failed");
                    return Ok(ResetOutcome::failed(&e));
                }
            }
        }

        warn!(job_id = %job.job_id, attempts = self.max_attempts, "Gave up waiting for job");
        Ok(ResetOutcome::timeout(last_observed))
    }
}
