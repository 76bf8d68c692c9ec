//! Player data reset job endpoints.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::authorizer::Authorizer;
use crate::contract::{
    AUTHORIZATION_HEADER, CONTRACT_VERSION_HEADER, CORRELATION_ID_HEADER, JOB_CONTRACT_VERSION,
};
use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};

use super::model::{JobHandle, parse_job_id};

#[derive(Serialize)]
struct SubmitJob<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    #[serde(rename = "Scid")]
    scid: &'a str,
}

#[derive(Serialize)]
struct SubmitBatchJob<'a> {
    #[serde(rename = "userIds")]
    user_ids: &'a [String],
    #[serde(rename = "Scid")]
    scid: &'a str,
}

/// Client for the reset job service.
#[derive(Clone)]
pub struct JobClient {
    transport: Arc<dyn HttpTransport>,
    base: Url,
}

impl JobClient {
    /// Creates a client against `base`.
    ///
    /// A trailing slash is added to `base` so relative endpoints resolve
    /// beneath it.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { transport, base }
    }

    /// Base URL of the job service.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Submits a reset job for one user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if no authorization could be produced, and a
    /// service or transport error if the submission failed.
    #[instrument(skip(self, authorizer), fields(scid = %scid, sandbox = %sandbox))]
    pub async fn submit(
        &self,
        authorizer: &dyn Authorizer,
        scid: &str,
        sandbox: &str,
        user_id: &str,
    ) -> Result<JobHandle> {
        let body = SubmitJob { user_id, scid };
        self.submit_body(authorizer, scid, sandbox, &body).await
    }

    /// Submits one reset job covering several users.
    ///
    /// # Errors
    ///
    /// Same as [`JobClient::submit`]; also fails if `user_ids` is empty.
    #[instrument(skip(self, authorizer, user_ids), fields(scid = %scid, sandbox = %sandbox, users = user_ids.len()))]
    pub async fn submit_batch(
        &self,
        authorizer: &dyn Authorizer,
        scid: &str,
        sandbox: &str,
        user_ids: &[String],
    ) -> Result<JobHandle> {
        if user_ids.is_empty() {
            return Err(Error::InvalidRequest("batch has no users".to_string()));
        }
        let body = SubmitBatchJob { user_ids, scid };
        self.submit_body(authorizer, scid, sandbox, &body).await
    }

    async fn submit_body<T: Serialize + Sync>(
        &self,
        authorizer: &dyn Authorizer,
        scid: &str,
        sandbox: &str,
        body: &T,
    ) -> Result<JobHandle> {
        let auth = authorizer.authorization_header(scid, sandbox).await?;
        let request = HttpRequest::post(self.base.join("submitJob")?)
            .header(AUTHORIZATION_HEADER, &auth)?
            .header(CONTRACT_VERSION_HEADER, JOB_CONTRACT_VERSION)?
            .json(body)?;

        let response = self.transport.send(request).await?.error_for_status()?;
        let job_id = parse_job_id(&response.text())?;
        let correlation_id = response.header(CORRELATION_ID_HEADER).map(str::to_string);

        debug!(job_id = %job_id, correlation_id = ?correlation_id, "Submitted reset job");

        Ok(JobHandle {
            job_id,
            correlation_id,
            scid: scid.to_string(),
            sandbox: sandbox.to_string(),
        })
    }

    /// Sends one status request and returns the raw response.
    ///
    /// Non-success statuses are returned, not raised. The status endpoint
    /// answers 400 while a job is queued, so only [`JobPoller`] decides
    /// which of them are fatal.
    ///
    /// [`JobPoller`]: super::poller::JobPoller
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if no authorization could be produced, and a
    /// transport error if no response arrived.
    pub async fn fetch_status(
        &self,
        authorizer: &dyn Authorizer,
        job: &JobHandle,
    ) -> Result<HttpResponse> {
        let auth = authorizer
            .authorization_header(&job.scid, &job.sandbox)
            .await?;
        let url = self.base.join(&format!("jobs/{}", job.job_id))?;
        let mut request = HttpRequest::get(url)
            .header(AUTHORIZATION_HEADER, &auth)?
            .header(CONTRACT_VERSION_HEADER, JOB_CONTRACT_VERSION)?;
        if let Some(correlation_id) = &job.correlation_id {
            request = request.header(CORRELATION_ID_HEADER, correlation_id)?;
        }

        self.transport.send(request).await
    }
}

impl std::fmt::Debug for JobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::http::ReqwestTransport;

    #[test]
    fn test_base_gets_trailing_slash() {
        let client = JobClient::new(
            Arc::new(ReqwestTransport::default()),
            Url::parse("https://example.com/eraser").unwrap(),
        );
        assert_eq!(
            client.base_url().join("submitJob").unwrap().as_str(),
            "https://example.com/eraser/submitJob"
        );
    }

    #[test]
    fn test_submit_bodies() {
        let single = serde_json::to_value(SubmitJob {
            user_id: "2814",
            scid: "00000000-0000-0000-0000-000000000001",
        })
        .unwrap();
        assert_eq!(
            single,
            serde_json::json!({"userId": "2814", "Scid": "00000000-0000-0000-0000-000000000001"})
        );

        let users = vec!["1".to_string(), "2".to_string()];
        let batch = serde_json::to_value(SubmitBatchJob {
            user_ids: &users,
            scid: "s",
        })
        .unwrap();
        assert_eq!(batch, serde_json::json!({"userIds": ["1", "2"], "Scid": "s"}));
    }
}
