// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence for `JobRequest` rows. Immutable apart from `cancelled_actions`.

use sqlx::{Row, SqlitePool};

use rap_core::{JobRequest, JobRequestId, RequestedAction, WorkspaceRef};

use crate::error::{Result, StorageError};

#[derive(Clone)]
pub struct JobRequestRepository {
    pool: SqlitePool,
}

impl JobRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, request: &JobRequest) -> Result<()> {
        let requested_action = encode_requested_action(&request.requested_action);
        let cancelled_actions = serde_json::to_string(&request.cancelled_actions)
            .map_err(|source| StorageError::Decode {
                column: "cancelled_actions",
                expected: "json array",
                source,
            })?;
        let original_payload = request.original_payload.to_string();

        sqlx::query(
            r#"
            INSERT INTO job_requests (
                id, backend_id, workspace_name, workspace_repo_url, workspace_branch,
                requested_action, commit_sha, database_name, force_run,
                cancelled_actions, original_payload, created_at_ms
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.id.as_str())
        .bind(request.backend_id.as_str())
        .bind(&request.workspace.name)
        .bind(&request.workspace.repo_url)
        .bind(&request.workspace.branch)
        .bind(requested_action)
        .bind(&request.commit_sha)
        .bind(&request.database_name)
        .bind(request.force_run)
        .bind(cancelled_actions)
        .bind(original_payload)
        .bind(request.created_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_commit_sha(&self, id: &JobRequestId, commit_sha: &str) -> Result<()> {
        sqlx::query("UPDATE job_requests SET commit_sha = ? WHERE id = ?")
            .bind(commit_sha)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn add_cancelled_action(&self, id: &JobRequestId, action_name: &str) -> Result<()> {
        let mut request = self.get(id).await?;
        if !request.is_cancelled(action_name) {
            request.cancelled_actions.push(action_name.to_string());
            let cancelled_actions =
                serde_json::to_string(&request.cancelled_actions).map_err(|source| {
                    StorageError::Decode {
                        column: "cancelled_actions",
                        expected: "json array",
                        source,
                    }
                })?;
            sqlx::query("UPDATE job_requests SET cancelled_actions = ? WHERE id = ?")
                .bind(cancelled_actions)
                .bind(id.as_str())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    pub async fn get(&self, id: &JobRequestId) -> Result<JobRequest> {
        let row = sqlx::query("SELECT * FROM job_requests WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                what: "job_request",
                id: id.as_str().to_string(),
            })?;
        row_to_job_request(&row)
    }

    pub async fn list_for_backend(&self, backend_id: &str) -> Result<Vec<JobRequest>> {
        let rows = sqlx::query("SELECT * FROM job_requests WHERE backend_id = ? ORDER BY created_at_ms ASC")
            .bind(backend_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_job_request).collect()
    }
}

fn encode_requested_action(action: &RequestedAction) -> String {
    match action {
        RequestedAction::Named(name) => name.clone(),
        RequestedAction::RunAll => "__run_all__".to_string(),
    }
}

fn decode_requested_action(raw: &str) -> RequestedAction {
    if raw == "__run_all__" {
        RequestedAction::RunAll
    } else {
        RequestedAction::Named(raw.to_string())
    }
}

fn row_to_job_request(row: &sqlx::sqlite::SqliteRow) -> Result<JobRequest> {
    let cancelled_actions_raw: String = row.get("cancelled_actions");
    let cancelled_actions: Vec<String> =
        serde_json::from_str(&cancelled_actions_raw).map_err(|source| StorageError::Decode {
            column: "cancelled_actions",
            expected: "json array",
            source,
        })?;
    let original_payload_raw: String = row.get("original_payload");
    let original_payload =
        serde_json::from_str(&original_payload_raw).map_err(|source| StorageError::Decode {
            column: "original_payload",
            expected: "json value",
            source,
        })?;

    Ok(JobRequest {
        id: JobRequestId::new(row.get::<String, _>("id")),
        backend_id: row.get::<String, _>("backend_id").into(),
        workspace: WorkspaceRef::new(
            row.get::<String, _>("workspace_name"),
            row.get::<String, _>("workspace_repo_url"),
            row.get::<String, _>("workspace_branch"),
        ),
        requested_action: decode_requested_action(&row.get::<String, _>("requested_action")),
        commit_sha: row.get("commit_sha"),
        database_name: row.get("database_name"),
        force_run: row.get("force_run"),
        cancelled_actions,
        original_payload,
        created_at_ms: row.get("created_at_ms"),
    })
}

#[cfg(test)]
#[path = "job_request_tests.rs"]
mod tests;
