// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The external RAP API: job-server/admin clients create and cancel
//! JobRequests and poll Job/backend status directly, bypassing the Sync
//! Loop's own pull cadence. Authenticated against a separate client-token
//! namespace from the Task API's per-backend Agent tokens.

use std::collections::HashMap;
use std::path::PathBuf;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use rap_adapters::{parse_pipeline, JobRequestPayload};
use rap_core::{
    BackendFlag, Clock, FlagKey, IdGen, Job, JobRequest, JobRequestId, RequestedAction,
    UuidIdGen, WorkspaceRef,
};
use serde::{Deserialize, Serialize};

use crate::auth::authenticate_client;
use crate::error::ControllerError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequestBody {
    pub backend: String,
    #[serde(flatten)]
    pub payload: JobRequestPayload,
}

#[derive(Debug, Serialize)]
pub struct CreateJobRequestResponse {
    pub job_request_id: String,
    pub resolved_job_ids: HashMap<String, String>,
    pub jobs_created: usize,
}

/// `POST /rap/create/`: turns a job-server-shaped request payload into a
/// JobRequest row and runs the scheduler's intake pass against it
/// immediately, rather than waiting for the next Sync Loop tick.
pub async fn create_job_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateJobRequestBody>,
) -> Result<Json<CreateJobRequestResponse>, ControllerError> {
    authenticate_client(&state.config, &headers)?;
    let CreateJobRequestBody { backend, payload } = body;

    let requested_action = match payload.requested_action {
        Some(name) => RequestedAction::Named(name),
        None => RequestedAction::RunAll,
    };
    let workspace = WorkspaceRef::new(payload.workspace_name, payload.repo_url, payload.branch);

    let mut request = JobRequest::new(
        JobRequestId::new(UuidIdGen.next()),
        backend,
        workspace,
        requested_action,
        payload.database_name,
        payload.force_run,
        payload.original_payload,
        state.clock.epoch_ms(),
    );
    for action in &payload.cancelled_actions {
        request.cancelled_actions.push(action.clone());
    }

    let commit_sha = match payload.commit_sha {
        Some(sha) => sha,
        None => resolve_commit(&state, &request.workspace).await?,
    };
    request.commit_sha = Some(commit_sha.clone());

    state.request_repo.insert(&request).await?;

    let pipeline_yaml = load_pipeline_yaml(&state, &request.workspace, &commit_sha).await?;
    let pipeline = parse_pipeline(&pipeline_yaml)?;

    let outcome = state.scheduler.intake(&pipeline, &request, &commit_sha).await?;

    Ok(Json(CreateJobRequestResponse {
        job_request_id: request.id.as_str().to_string(),
        resolved_job_ids: outcome
            .resolved_job_ids
            .iter()
            .map(|(action, id)| (action.clone(), id.as_str().to_string()))
            .collect(),
        jobs_created: outcome.new_jobs.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub job_request_id: String,
    pub action_name: String,
}

/// `POST /rap/cancel/`: records an action as cancelled on its JobRequest.
/// The scheduler's next tick (or the synchronous Task API update path)
/// picks the cancellation up; cancelling an already-SUCCEEDED Job is a
/// recorded no-op, per the Builder/Controller only consulting this list
/// for non-terminal Jobs.
pub async fn cancel_job_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CancelRequest>,
) -> Result<(), ControllerError> {
    authenticate_client(&state.config, &headers)?;
    let id = JobRequestId::new(body.job_request_id);
    state
        .request_repo
        .add_cancelled_action(&id, &body.action_name)
        .await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub job_request_id: String,
}

/// `GET /rap/status/`: every Job belonging to a JobRequest.
pub async fn job_request_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Job>>, ControllerError> {
    authenticate_client(&state.config, &headers)?;
    let id = JobRequestId::new(query.job_request_id);
    let jobs = state.job_repo.list_for_request(&id).await?;
    Ok(Json(jobs))
}

#[derive(Debug, Deserialize)]
pub struct BackendStatusQuery {
    pub backend: String,
}

#[derive(Debug, Serialize)]
pub struct BackendStatusResponse {
    pub flags: Vec<BackendFlag>,
    pub executing: u32,
    pub executing_db_workers: u32,
}

/// `GET /backend/status/`: a backend's active flags plus current executing
/// counts, for operator dashboards and the admin CLI.
pub async fn backend_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BackendStatusQuery>,
) -> Result<Json<BackendStatusResponse>, ControllerError> {
    authenticate_client(&state.config, &headers)?;
    let flags = state.flag_repo.list_for_backend(&query.backend).await?;
    let counts = state.job_repo.count_executing(&query.backend).await?;
    Ok(Json(BackendStatusResponse {
        flags,
        executing: counts.total,
        executing_db_workers: counts.db_workers,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SetFlagRequest {
    pub backend: String,
    pub key: FlagKey,
    pub value: String,
}

/// `POST /backend/flag/`: the admin CLI's flag-setting endpoint, same
/// per-backend Agent token as the Task API per spec.md treating the admin
/// CLI's own auth as out of scope.
pub async fn set_backend_flag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SetFlagRequest>,
) -> Result<(), ControllerError> {
    crate::auth::authenticate_backend(&state.config, &headers, &body.backend)?;
    let flag = BackendFlag::new(body.backend, body.key, body.value, state.clock.epoch_ms());
    state.flag_repo.set(&flag).await?;
    Ok(())
}

async fn resolve_commit(state: &AppState, workspace: &WorkspaceRef) -> Result<String, ControllerError> {
    let fetcher = state.repo_fetcher.clone();
    let repo_name = workspace.name.clone();
    let repo_url = workspace.repo_url.clone();
    let branch = workspace.branch.clone();
    let commit_sha =
        tokio::task::spawn_blocking(move || fetcher.resolve_commit(&repo_name, &repo_url, &branch)).await??;
    Ok(commit_sha)
}

async fn load_pipeline_yaml(
    state: &AppState,
    workspace: &WorkspaceRef,
    commit_sha: &str,
) -> Result<String, ControllerError> {
    let fetcher = state.repo_fetcher.clone();
    let repo_name = workspace.name.clone();
    let commit_sha = commit_sha.to_string();
    let target_dir: PathBuf = std::env::temp_dir()
        .join("rap-pipeline-checkout")
        .join(&repo_name)
        .join(&commit_sha);
    let checkout_dir = target_dir.clone();

    tokio::task::spawn_blocking(move || -> Result<String, ControllerError> {
        fetcher.checkout_commit(&repo_name, &commit_sha, &checkout_dir)?;
        Ok(std::fs::read_to_string(checkout_dir.join("project.yaml"))?)
    })
    .await?
}

#[cfg(test)]
#[path = "rap_api_tests.rs"]
mod tests;
