// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent's view of the Controller's Task API: list active Tasks for
//! this backend, report a stage update for one. Modeled as a trait, like
//! the `ExecutorAdapter`, so the task-runner loop can be driven by a fake
//! in tests instead of a live HTTP round-trip.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use rap_core::{BackendId, Task, TaskId, TaskStage, TaskStageReport};

use crate::error::AgentError;

#[async_trait]
pub trait TaskApi: Send + Sync + 'static {
    async fn list_tasks(&self) -> Result<Vec<Task>, AgentError>;

    async fn update_task(
        &self,
        task_id: &TaskId,
        stage: TaskStage,
        report: Option<TaskStageReport>,
        agent_complete: bool,
    ) -> Result<(), AgentError>;
}

#[derive(Debug, Serialize)]
struct TaskUpdateBody<'a> {
    task_id: &'a TaskId,
    stage: TaskStage,
    report: Option<TaskStageReport>,
    agent_complete: bool,
}

/// HTTP-backed `TaskApi`, scoped to one backend's bearer token.
#[derive(Clone)]
pub struct HttpTaskApiClient {
    http: Client,
    base_url: String,
    backend_id: BackendId,
    token: String,
}

impl HttpTaskApiClient {
    pub fn new(
        base_url: impl Into<String>,
        backend_id: BackendId,
        token: impl Into<String>,
    ) -> Result<Self, AgentError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            backend_id,
            token: token.into(),
        })
    }
}

#[async_trait]
impl TaskApi for HttpTaskApiClient {
    async fn list_tasks(&self) -> Result<Vec<Task>, AgentError> {
        let url = format!("{}/{}/tasks/", self.base_url, self.backend_id);
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::UnexpectedStatus { status, body });
        }

        Ok(response.json().await?)
    }

    async fn update_task(
        &self,
        task_id: &TaskId,
        stage: TaskStage,
        report: Option<TaskStageReport>,
        agent_complete: bool,
    ) -> Result<(), AgentError> {
        let url = format!("{}/{}/task/update/", self.base_url, self.backend_id);
        let body = TaskUpdateBody {
            task_id,
            stage,
            report,
            agent_complete,
        };
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::UnexpectedStatus { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
