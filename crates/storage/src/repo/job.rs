// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence for `Job` rows: the scheduler's hot path.

use sqlx::{Row, SqlitePool};

use rap_core::{Job, JobId, JobRequestId, JobState, PrivacyLevel, StatusCode};

use crate::error::{Result, StorageError};

#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, job: &Job) -> Result<()> {
        let run_command = json(&job.run_command)?;
        let needs_actions = json(&job.needs_actions)?;
        let wait_for_job_ids = json(&job.wait_for_job_ids.iter().map(|id| id.as_str()).collect::<Vec<_>>())?;
        let output_spec = json(&job.output_spec)?;
        let outputs = json(&job.outputs)?;
        let unmatched_patterns = json(&job.unmatched_patterns)?;

        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, job_request_id, backend_id, workspace_name, commit_sha,
                action_name, run_command, image, needs_actions, wait_for_job_ids,
                output_spec, outputs, unmatched_patterns, is_db_worker,
                state, status_code, status_message,
                created_at_ms, started_at_ms, completed_at_ms, cancelled, retry_count
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.id.as_str())
        .bind(job.job_request_id.as_str())
        .bind(job.backend_id.as_str())
        .bind(&job.workspace_name)
        .bind(&job.commit_sha)
        .bind(&job.action_name)
        .bind(run_command)
        .bind(&job.image)
        .bind(needs_actions)
        .bind(wait_for_job_ids)
        .bind(output_spec)
        .bind(outputs)
        .bind(unmatched_patterns)
        .bind(job.is_db_worker)
        .bind(state_str(job.state))
        .bind(status_code_str(job.status_code))
        .bind(&job.status_message)
        .bind(job.created_at_ms)
        .bind(job.started_at_ms)
        .bind(job.completed_at_ms)
        .bind(job.cancelled)
        .bind(job.retry_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: &JobId) -> Result<Job> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                what: "job",
                id: id.as_str().to_string(),
            })?;
        row_to_job(&row)
    }

    pub async fn list_for_request(&self, job_request_id: &JobRequestId) -> Result<Vec<Job>> {
        let rows = sqlx::query("SELECT * FROM jobs WHERE job_request_id = ? ORDER BY created_at_ms ASC")
            .bind(job_request_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_job).collect()
    }

    /// All non-terminal Jobs for a backend, FIFO by creation time — the
    /// scheduler's per-tick evaluation set.
    pub async fn list_non_terminal_for_backend(&self, backend_id: &str) -> Result<Vec<Job>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM jobs
            WHERE backend_id = ? AND state NOT IN ('failed', 'succeeded')
            ORDER BY created_at_ms ASC
            "#,
        )
        .bind(backend_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_job).collect()
    }

    /// Count of Jobs on a backend currently EXECUTING, split by whether
    /// they are DB-workers, for concurrency admission.
    pub async fn count_executing(&self, backend_id: &str) -> Result<ExecutingCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                SUM(CASE WHEN is_db_worker THEN 1 ELSE 0 END) AS db_workers
            FROM jobs
            WHERE backend_id = ? AND status_code = 'EXECUTING'
            "#,
        )
        .bind(backend_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(ExecutingCounts {
            total: row.get::<i64, _>("total") as u32,
            db_workers: row.get::<Option<i64>, _>("db_workers").unwrap_or(0) as u32,
        })
    }

    /// Latest Job for the same (workspace, action, commit), used by the
    /// Builder's skip/reuse/fail-fast/create decision.
    pub async fn find_latest_for_dedup(
        &self,
        workspace_name: &str,
        action_name: &str,
        commit_sha: &str,
    ) -> Result<Option<Job>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM jobs
            WHERE workspace_name = ? AND action_name = ? AND commit_sha = ?
            ORDER BY created_at_ms DESC
            LIMIT 1
            "#,
        )
        .bind(workspace_name)
        .bind(action_name)
        .bind(commit_sha)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_job).transpose()
    }

    /// Persists a full transition: status_code/state, timestamps, and any
    /// accumulated outputs or status message. Called by the Controller
    /// state machine after every evaluation or task-update.
    pub async fn save(&self, job: &Job) -> Result<()> {
        let outputs = json(&job.outputs)?;
        let unmatched_patterns = json(&job.unmatched_patterns)?;

        sqlx::query(
            r#"
            UPDATE jobs SET
                state = ?, status_code = ?, status_message = ?,
                outputs = ?, unmatched_patterns = ?,
                started_at_ms = ?, completed_at_ms = ?, cancelled = ?, retry_count = ?
            WHERE id = ?
            "#,
        )
        .bind(state_str(job.state))
        .bind(status_code_str(job.status_code))
        .bind(&job.status_message)
        .bind(outputs)
        .bind(unmatched_patterns)
        .bind(job.started_at_ms)
        .bind(job.completed_at_ms)
        .bind(job.cancelled)
        .bind(job.retry_count)
        .bind(job.id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutingCounts {
    pub total: u32,
    pub db_workers: u32,
}

fn json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| StorageError::Decode {
        column: "json",
        expected: "serializable value",
        source,
    })
}

fn state_str(state: JobState) -> &'static str {
    match state {
        JobState::Pending => "pending",
        JobState::Running => "running",
        JobState::Failed => "failed",
        JobState::Succeeded => "succeeded",
    }
}

fn status_code_str(code: StatusCode) -> String {
    code.to_string()
}

fn parse_status_code(raw: &str) -> Result<StatusCode> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|source| {
        StorageError::Decode {
            column: "status_code",
            expected: "StatusCode",
            source,
        }
    })
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job> {
    let run_command: Vec<String> = decode(row.get::<String, _>("run_command"), "run_command")?;
    let needs_actions: Vec<String> = decode(row.get::<String, _>("needs_actions"), "needs_actions")?;
    let wait_for_job_ids: Vec<String> =
        decode(row.get::<String, _>("wait_for_job_ids"), "wait_for_job_ids")?;
    let output_spec: std::collections::HashMap<String, PrivacyLevel> =
        decode(row.get::<String, _>("output_spec"), "output_spec")?;
    let outputs: std::collections::HashMap<String, PrivacyLevel> =
        decode(row.get::<String, _>("outputs"), "outputs")?;
    let unmatched_patterns: Vec<String> =
        decode(row.get::<String, _>("unmatched_patterns"), "unmatched_patterns")?;

    let state_raw: String = row.get("state");
    let state = match state_raw.as_str() {
        "pending" => JobState::Pending,
        "running" => JobState::Running,
        "failed" => JobState::Failed,
        "succeeded" => JobState::Succeeded,
        other => {
            use serde::de::Error as _;
            return Err(StorageError::Decode {
                column: "state",
                expected: "JobState",
                source: serde_json::Error::custom(format!("unrecognized job state {other}")),
            })
        }
    };

    Ok(Job {
        id: JobId::new(row.get::<String, _>("id")),
        job_request_id: JobRequestId::new(row.get::<String, _>("job_request_id")),
        backend_id: row.get::<String, _>("backend_id").into(),
        workspace_name: row.get("workspace_name"),
        commit_sha: row.get::<Option<String>, _>("commit_sha").unwrap_or_default(),
        action_name: row.get("action_name"),
        run_command,
        image: row.get("image"),
        needs_actions,
        wait_for_job_ids: wait_for_job_ids.into_iter().map(JobId::new).collect(),
        output_spec,
        outputs,
        unmatched_patterns,
        is_db_worker: row.get("is_db_worker"),
        state,
        status_code: parse_status_code(&row.get::<String, _>("status_code"))?,
        status_message: row.get("status_message"),
        created_at_ms: row.get("created_at_ms"),
        started_at_ms: row.get("started_at_ms"),
        completed_at_ms: row.get("completed_at_ms"),
        cancelled: row.get("cancelled"),
        retry_count: row.get::<i64, _>("retry_count") as u32,
    })
}

fn decode<T: serde::de::DeserializeOwned>(raw: String, column: &'static str) -> Result<T> {
    serde_json::from_str(&raw).map_err(|source| StorageError::Decode {
        column,
        expected: "json",
        source,
    })
}

#[cfg(test)]
#[path = "job_repo_tests.rs"]
mod tests;
