// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridges the Controller's database to the external job-server: pulls
//! newly active JobRequests and expands them via the scheduler's intake
//! pass, then pushes back redacted Job status for every Job belonging to
//! an active request.

use std::path::{Path, PathBuf};

use rap_adapters::{parse_pipeline, GitRepoFetcher, JobServerClient, JobStatusPayload, Redactor};
use rap_core::{
    BackendId, Clock, IdGen, JobRequest, JobRequestId, RequestedAction, UuidIdGen, WorkspaceRef,
};
use rap_storage::{JobRepository, JobRequestRepository};

use crate::error::ControllerError;
use crate::scheduler::Scheduler;

pub struct SyncLoop<C: Clock> {
    backend_id: BackendId,
    job_server: JobServerClient,
    repo_fetcher: GitRepoFetcher,
    request_repo: JobRequestRepository,
    job_repo: JobRepository,
    redactor: Redactor,
    id_gen: UuidIdGen,
    clock: C,
}

impl<C: Clock> SyncLoop<C> {
    pub fn new(
        backend_id: impl Into<BackendId>,
        job_server: JobServerClient,
        repo_fetcher: GitRepoFetcher,
        pool: sqlx::SqlitePool,
        clock: C,
    ) -> Self {
        Self {
            backend_id: backend_id.into(),
            job_server,
            repo_fetcher,
            request_repo: JobRequestRepository::new(pool.clone()),
            job_repo: JobRepository::new(pool),
            redactor: Redactor::default_rules(),
            id_gen: UuidIdGen,
            clock,
        }
    }

    /// One Sync Loop iteration: pull, expand, push. A transport failure is
    /// logged and otherwise changes no Job/Task state — the next tick
    /// retries from scratch.
    pub async fn run_once(&self, scheduler: &Scheduler<C>) -> Result<(), ControllerError> {
        self.pull_and_intake(scheduler).await?;
        self.push_statuses().await?;
        Ok(())
    }

    async fn pull_and_intake(&self, scheduler: &Scheduler<C>) -> Result<(), ControllerError> {
        let payloads = match self.job_server.fetch_active_requests(self.backend_id.as_str()).await {
            Ok(payloads) => payloads,
            Err(err) => {
                tracing::warn!(backend = %self.backend_id, error = %err, "job-server fetch failed");
                return Ok(());
            }
        };

        for payload in payloads {
            let requested_action = match payload.requested_action {
                Some(name) => RequestedAction::Named(name),
                None => RequestedAction::RunAll,
            };
            let workspace = WorkspaceRef::new(payload.workspace_name, payload.repo_url, payload.branch);

            let mut request = JobRequest::new(
                JobRequestId::new(self.id_gen.next()),
                self.backend_id.clone(),
                workspace,
                requested_action,
                payload.database_name,
                payload.force_run,
                payload.original_payload,
                self.clock.epoch_ms(),
            );
            for action in &payload.cancelled_actions {
                request.cancelled_actions.push(action.clone());
            }

            let commit_sha = match payload.commit_sha {
                Some(sha) => sha,
                None => self.resolve_commit(&request.workspace).await?,
            };
            request.commit_sha = Some(commit_sha.clone());

            self.request_repo.insert(&request).await?;

            let pipeline_yaml = self.load_pipeline_yaml(&request.workspace, &commit_sha).await?;
            let pipeline = parse_pipeline(&pipeline_yaml)?;

            scheduler.intake(&pipeline, &request, &commit_sha).await?;
        }
        Ok(())
    }

    async fn resolve_commit(&self, workspace: &WorkspaceRef) -> Result<String, ControllerError> {
        let fetcher = self.repo_fetcher.clone();
        let repo_name = workspace.name.clone();
        let repo_url = workspace.repo_url.clone();
        let branch = workspace.branch.clone();
        let commit_sha =
            tokio::task::spawn_blocking(move || fetcher.resolve_commit(&repo_name, &repo_url, &branch)).await??;
        Ok(commit_sha)
    }

    async fn load_pipeline_yaml(&self, workspace: &WorkspaceRef, commit_sha: &str) -> Result<String, ControllerError> {
        let fetcher = self.repo_fetcher.clone();
        let repo_name = workspace.name.clone();
        let commit_sha = commit_sha.to_string();
        let target_dir: PathBuf = std::env::temp_dir().join("rap-pipeline-checkout").join(&repo_name).join(&commit_sha);
        let checkout_dir = target_dir.clone();

        tokio::task::spawn_blocking(move || -> Result<String, ControllerError> {
            fetcher.checkout_commit(&repo_name, &commit_sha, &checkout_dir)?;
            read_project_yaml(&checkout_dir)
        })
        .await?
    }

    async fn push_statuses(&self) -> Result<(), ControllerError> {
        let requests = self.request_repo.list_for_backend(self.backend_id.as_str()).await?;
        let mut statuses = Vec::new();
        for request in requests {
            for job in self.job_repo.list_for_request(&request.id).await? {
                statuses.push(JobStatusPayload {
                    job_id: job.id.as_str().to_string(),
                    action_name: job.action_name.clone(),
                    state: job.state.to_string(),
                    status_code: job.status_code.to_string(),
                    status_message: job.status_message.as_deref().map(|m| self.redactor.redact(m)),
                    created_at_ms: job.created_at_ms,
                    started_at_ms: job.started_at_ms,
                    completed_at_ms: job.completed_at_ms,
                    high_privacy_output_count: count_privacy(&job.outputs, rap_core::PrivacyLevel::High),
                    medium_privacy_output_count: count_privacy(&job.outputs, rap_core::PrivacyLevel::Medium),
                    output_patterns: job.outputs.keys().cloned().collect(),
                });
            }
        }

        if statuses.is_empty() {
            return Ok(());
        }

        if let Err(err) = self.job_server.post_job_statuses(self.backend_id.as_str(), &statuses).await {
            tracing::warn!(backend = %self.backend_id, error = %err, "job-server status push failed");
        }
        Ok(())
    }
}

fn count_privacy(
    outputs: &std::collections::HashMap<String, rap_core::PrivacyLevel>,
    level: rap_core::PrivacyLevel,
) -> u32 {
    outputs.values().filter(|v| **v == level).count() as u32
}

fn read_project_yaml(checkout_dir: &Path) -> Result<String, ControllerError> {
    Ok(std::fs::read_to_string(checkout_dir.join("project.yaml"))?)
}

#[cfg(test)]
#[path = "sync_loop_tests.rs"]
mod tests;
