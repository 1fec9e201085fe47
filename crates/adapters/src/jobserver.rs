// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client adapter for the Sync Loop's bridge to the external job-server:
//! pulls active JobRequests, posts Job status.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobServerError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("job-server returned {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
}

/// Wire shape of an inbound JobRequest, before it is turned into a
/// `rap_core::JobRequest` by the Sync Loop (which assigns the id and
/// timestamp).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequestPayload {
    pub workspace_name: String,
    pub repo_url: String,
    pub branch: String,
    pub requested_action: Option<String>,
    pub commit_sha: Option<String>,
    pub database_name: Option<String>,
    pub force_run: bool,
    pub cancelled_actions: Vec<String>,
    pub original_payload: serde_json::Value,
}

/// Wire shape of an outbound Job status report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusPayload {
    pub job_id: String,
    pub action_name: String,
    pub state: String,
    pub status_code: String,
    pub status_message: Option<String>,
    pub created_at_ms: i64,
    pub started_at_ms: Option<i64>,
    pub completed_at_ms: Option<i64>,
    pub high_privacy_output_count: u32,
    pub medium_privacy_output_count: u32,
    pub output_patterns: Vec<String>,
}

/// HTTP client adapter to the upstream job-server, one instance per backend
/// (each backend has its own job-server token).
#[derive(Clone)]
pub struct JobServerClient {
    http: Client,
    base_url: String,
    token: String,
}

impl JobServerClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, JobServerError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    /// Fetches the job-server's list of currently-active JobRequests for
    /// `backend_id`.
    pub async fn fetch_active_requests(
        &self,
        backend_id: &str,
    ) -> Result<Vec<JobRequestPayload>, JobServerError> {
        let url = format!("{}/api/v2/job-requests/active/", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("backend", backend_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JobServerError::UnexpectedStatus { status, body });
        }

        Ok(response.json().await?)
    }

    /// Pushes status for the Jobs belonging to active requests. The Sync
    /// Loop is responsible for redacting `status_message` before this call.
    pub async fn post_job_statuses(
        &self,
        backend_id: &str,
        statuses: &[JobStatusPayload],
    ) -> Result<(), JobServerError> {
        let url = format!("{}/api/v2/job-statuses/", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .query(&[("backend", backend_id)])
            .json(statuses)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JobServerError::UnexpectedStatus { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "jobserver_tests.rs"]
mod tests;
