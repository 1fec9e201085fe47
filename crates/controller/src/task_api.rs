// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Task API: the only interface Agents speak to. `GET /{backend}/tasks/`
//! hands back every active Task (full definitions, so the Agent never has
//! to call back); `POST /{backend}/task/update/` applies one stage report.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Deserialize;

use rap_core::{Task, TaskId, TaskStage, TaskStageReport};

use crate::auth::authenticate_backend;
use crate::error::ControllerError;
use crate::AppState;

pub async fn list_tasks(
    State(state): State<AppState>,
    Path(backend_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, ControllerError> {
    authenticate_backend(&state.config, &headers, &backend_id)?;
    let tasks = state.task_repo.list_active_for_backend(&backend_id).await?;
    Ok(Json(tasks))
}

#[derive(Debug, Deserialize)]
pub struct TaskUpdateRequest {
    pub task_id: TaskId,
    pub stage: TaskStage,
    pub report: Option<TaskStageReport>,
    pub agent_complete: bool,
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(backend_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<TaskUpdateRequest>,
) -> Result<(), ControllerError> {
    authenticate_backend(&state.config, &headers, &backend_id)?;

    let now_ms = state.clock.epoch_ms();
    state
        .task_repo
        .apply_update(&body.task_id, body.stage, body.report, body.agent_complete, now_ms)
        .await?;
    let task = state.task_repo.get(&body.task_id).await?;
    state.scheduler.apply_task_update(&task, body.stage).await?;
    Ok(())
}

#[cfg(test)]
#[path = "task_api_tests.rs"]
mod tests;
