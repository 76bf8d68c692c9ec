//! Player data reset types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// A submitted reset job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Job identifier returned by the service.
    pub job_id: String,
    /// Correlation id to echo on status requests, if the service sent one.
    pub correlation_id: Option<String>,
    /// Target service configuration id.
    pub scid: String,
    /// Target sandbox.
    pub sandbox: String,
}

/// Overall job status reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    /// Running.
    InProgress,
    /// Waiting to run.
    Queued,
    /// Finished; every provider succeeded.
    CompletedSuccess,
    /// Finished with at least one provider failure.
    CompletedError,
    /// Any value this client does not know.
    #[serde(other)]
    Unknown,
}

impl OverallStatus {
    /// Returns true once the job will not change any more.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::CompletedSuccess | Self::CompletedError)
    }
}

/// Per-provider status reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderState {
    /// Waiting to run.
    Queued,
    /// Not started.
    NotStarted,
    /// Running.
    InProgress,
    /// Succeeded.
    CompletedSuccess,
    /// Some data could not be reset.
    CompletedPartialSuccess,
    /// Failed.
    CompletedError,
    /// Given up.
    Abandoned,
    /// Any value this client does not know.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome for one data provider inside a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    /// Provider name (e.g. `TitleStorage`).
    pub provider: String,
    /// Status.
    pub status: ProviderState,
    /// Error message, if the provider reported one.
    #[serde(default, alias = "ErrorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Job status response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// Job identifier.
    #[serde(default)]
    pub job_id: String,
    /// Overall status.
    pub overall_status: OverallStatus,
    /// Provider statuses in service order.
    #[serde(default, rename = "providerStatus")]
    pub provider_statuses: Vec<ProviderStatus>,
}

/// Final result of a reset unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetResult {
    /// Every provider finished successfully.
    Succeeded,
    /// The job, its submission, or a status request failed.
    CompletedWithError,
    /// The poll budget ran out before a terminal status.
    Timeout,
    /// Nothing is known yet.
    #[default]
    Unknown,
}

impl fmt::Display for ResetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Succeeded => "Succeeded",
            Self::CompletedWithError => "CompletedWithError",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Result of resetting one user or one batch chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResetOutcome {
    /// Overall result.
    pub result: ResetResult,
    /// Provider statuses in service order.
    pub provider_statuses: Vec<ProviderStatus>,
    /// Failure description, if a request failed.
    pub error_message: Option<String>,
    /// Failure classification, if a request failed.
    pub error_kind: Option<ErrorKind>,
}

impl ResetOutcome {
    /// Outcome of a terminal job status.
    #[must_use]
    pub fn from_terminal(status: JobStatus) -> Self {
        let result = match status.overall_status {
            OverallStatus::CompletedSuccess => ResetResult::Succeeded,
            OverallStatus::CompletedError => ResetResult::CompletedWithError,
            OverallStatus::InProgress | OverallStatus::Queued | OverallStatus::Unknown => {
                ResetResult::Unknown
            }
        };

        Self {
            result,
            provider_statuses: status.provider_statuses,
            error_message: None,
            error_kind: None,
        }
    }

    /// Outcome of a failed request: no provider statuses.
    #[must_use]
    pub fn failed(error: &Error) -> Self {
        Self {
            result: ResetResult::CompletedWithError,
            provider_statuses: Vec::new(),
            error_message: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    /// Outcome when the poll budget ran out.
    #[must_use]
    pub const fn timeout(last_observed: Vec<ProviderStatus>) -> Self {
        Self {
            result: ResetResult::Timeout,
            provider_statuses: last_observed,
            error_message: None,
            error_kind: None,
        }
    }

    /// Returns true if the reset succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result == ResetResult::Succeeded
    }
}

/// Outcome of one chunk of a batch reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    /// Users in the chunk.
    pub user_ids: Vec<String>,
    /// Chunk outcome.
    pub outcome: ResetOutcome,
}

/// Outcomes of a batch reset, in chunk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Per-chunk reports.
    pub chunks: Vec<ChunkReport>,
}

impl BatchReport {
    /// Returns true if there was at least one chunk and every chunk
    /// succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.overall() == ResetResult::Succeeded
    }

    /// Aggregated result: the first non-success chunk result, else
    /// `Succeeded`. A later success never masks an earlier failure.
    #[must_use]
    pub fn overall(&self) -> ResetResult {
        self.chunks
            .iter()
            .map(|c| c.outcome.result)
            .find(|r| *r != ResetResult::Succeeded)
            .unwrap_or(if self.chunks.is_empty() {
                ResetResult::Unknown
            } else {
                ResetResult::Succeeded
            })
    }

    /// First error message reported by any chunk.
    #[must_use]
    pub fn first_error(&self) -> Option<&str> {
        self.chunks
            .iter()
            .find_map(|c| c.outcome.error_message.as_deref())
    }
}

/// Extracts a job id from a submission response body.
///
/// The service returns the id as a JSON string, sometimes escaped twice
/// (`"\"abc123\""`). Quotes and backslashes never occur in ids.
///
/// # Errors
///
/// Returns [`Error::InvalidResponse`] if nothing is left after stripping.
pub fn parse_job_id(body: &str) -> Result<String, Error> {
    let id: String = body
        .trim()
        .chars()
        .filter(|c| *c != '"' && *c != '\\')
        .collect();
    let id = id.trim();

    if id.is_empty() {
        return Err(Error::InvalidResponse(format!(
            "submission returned no job id: {body:?}"
        )));
    }
    Ok(id.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_id() {
        assert_eq!(parse_job_id("\"\\\"abc123\\\"\"").unwrap(), "abc123");
        assert_eq!(parse_job_id("\"J1\"").unwrap(), "J1");
        assert_eq!(parse_job_id("J1\n").unwrap(), "J1");
        assert!(parse_job_id("\"\"").is_err());
        assert!(parse_job_id("  ").is_err());
    }

    #[test]
    fn test_status_body_parses() {
        let body = r#"{
            "jobId": "J1",
            "overallStatus": "CompletedError",
            "providerStatus": [
                {"provider": "TitleStorage", "status": "CompletedSuccess"},
                {"provider": "Leaderboards", "status": "CompletedError", "errorMessage": "boom"},
                {"provider": "Achievements", "status": "SomethingNew"}
            ]
        }"#;

        let status: JobStatus = serde_json::from_str(body).unwrap();
        assert_eq!(status.job_id, "J1");
        assert_eq!(status.overall_status, OverallStatus::CompletedError);
        assert_eq!(status.provider_statuses.len(), 3);
        assert_eq!(status.provider_statuses[0].error_message, None);
        assert_eq!(status.provider_statuses[1].error_message.as_deref(), Some("boom"));
        assert_eq!(status.provider_statuses[2].status, ProviderState::Unknown);
    }

    #[test]
    fn test_status_without_providers() {
        let status: JobStatus =
            serde_json::from_str(r#"{"jobId":"J1","overallStatus":"InProgress"}"#).unwrap();
        assert!(!status.overall_status.is_terminal());
        assert!(status.provider_statuses.is_empty());
    }

    #[test]
    fn test_terminal_outcomes() {
        let status = JobStatus {
            job_id: "J1".into(),
            overall_status: OverallStatus::CompletedSuccess,
            provider_statuses: vec![ProviderStatus {
                provider: "TitleStorage".into(),
                status: ProviderState::CompletedSuccess,
                error_message: None,
            }],
        };
        let outcome = ResetOutcome::from_terminal(status);
        assert!(outcome.is_success());
        assert_eq!(outcome.provider_statuses.len(), 1);

        let failed = ResetOutcome::failed(&Error::InvalidResponse("bad".into()));
        assert_eq!(failed.result, ResetResult::CompletedWithError);
        assert_eq!(failed.error_kind, Some(ErrorKind::ServerError));
        assert!(failed.provider_statuses.is_empty());
    }

    fn chunk(result: ResetResult, message: Option<&str>) -> ChunkReport {
        ChunkReport {
            user_ids: vec!["1".into()],
            outcome: ResetOutcome {
                result,
                error_message: message.map(str::to_string),
                ..ResetOutcome::default()
            },
        }
    }

    #[test]
    fn test_batch_overall_keeps_first_failure() {
        let report = BatchReport {
            chunks: vec![
                chunk(ResetResult::Succeeded, None),
                chunk(ResetResult::Timeout, None),
                chunk(ResetResult::CompletedWithError, Some("second")),
                chunk(ResetResult::Succeeded, None),
            ],
        };
        assert_eq!(report.overall(), ResetResult::Timeout);
        assert_eq!(report.first_error(), Some("second"));
        assert!(!report.is_success());
    }

    #[test]
    fn test_batch_all_succeeded() {
        let report = BatchReport {
            chunks: vec![chunk(ResetResult::Succeeded, None); 3],
        };
        assert_eq!(report.overall(), ResetResult::Succeeded);
        assert!(report.is_success());
        assert_eq!(BatchReport::default().overall(), ResetResult::Unknown);
    }
}
