// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence for `Task` rows.

use sqlx::{Row, SqlitePool};

use rap_core::{JobId, Task, TaskDefinition, TaskId, TaskStage, TaskStageReport};

use crate::error::{Result, StorageError};

#[derive(Clone)]
pub struct TaskRepository {
    pool: SqlitePool,
}

impl TaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, task: &Task) -> Result<()> {
        let definition = json(&task.definition)?;
        let latest_report = task
            .latest_report
            .as_ref()
            .map(json)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, backend_id, job_id, kind, definition, stage, latest_report,
                active, agent_complete, created_at_ms, updated_at_ms
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.as_str())
        .bind(task.backend_id.as_str())
        .bind(task.job_id.as_str())
        .bind(task.kind().to_string())
        .bind(definition)
        .bind(task.stage.to_string())
        .bind(latest_report)
        .bind(task.active)
        .bind(task.agent_complete)
        .bind(task.created_at_ms)
        .bind(task.updated_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: &TaskId) -> Result<Task> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                what: "task",
                id: id.as_str().to_string(),
            })?;
        row_to_task(&row)
    }

    /// The Task API's `GET /{backend}/tasks/` query: every active Task for
    /// a backend, with full definitions so the Agent never has to call back.
    pub async fn list_active_for_backend(&self, backend_id: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE backend_id = ? AND active = 1 ORDER BY created_at_ms ASC",
        )
        .bind(backend_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_task).collect()
    }

    /// The active Task of a given kind for a job, if any — enforces the
    /// at-most-one-active-per-(job,kind) invariant at the call site.
    pub async fn find_active_for_job(
        &self,
        job_id: &JobId,
        kind: &str,
    ) -> Result<Option<Task>> {
        let row = sqlx::query(
            "SELECT * FROM tasks WHERE job_id = ? AND kind = ? AND active = 1",
        )
        .bind(job_id.as_str())
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_task).transpose()
    }

    /// The active Task of a given kind for a backend, irrespective of
    /// job_id — used for DBSTATUS, which isn't scoped to a particular job.
    pub async fn find_active_by_kind_for_backend(
        &self,
        backend_id: &str,
        kind: &str,
    ) -> Result<Option<Task>> {
        let row = sqlx::query(
            "SELECT * FROM tasks WHERE backend_id = ? AND kind = ? AND active = 1",
        )
        .bind(backend_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_task).transpose()
    }

    pub async fn apply_update(
        &self,
        id: &TaskId,
        stage: TaskStage,
        report: Option<TaskStageReport>,
        agent_complete: bool,
        now_ms: i64,
    ) -> Result<()> {
        let mut task = self.get(id).await?;
        task.apply_update(stage, report, agent_complete, now_ms);
        self.save(&task).await
    }

    pub async fn save(&self, task: &Task) -> Result<()> {
        let latest_report = task
            .latest_report
            .as_ref()
            .map(json)
            .transpose()?;

        sqlx::query(
            r#"
            UPDATE tasks SET
                stage = ?, latest_report = ?, active = ?, agent_complete = ?, updated_at_ms = ?
            WHERE id = ?
            "#,
        )
        .bind(task.stage.to_string())
        .bind(latest_report)
        .bind(task.active)
        .bind(task.agent_complete)
        .bind(task.updated_at_ms)
        .bind(task.id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn deactivate(&self, id: &TaskId, now_ms: i64) -> Result<()> {
        sqlx::query("UPDATE tasks SET active = 0, updated_at_ms = ? WHERE id = ?")
            .bind(now_ms)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| StorageError::Decode {
        column: "json",
        expected: "serializable value",
        source,
    })
}

fn decode<T: serde::de::DeserializeOwned>(raw: &str, column: &'static str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| StorageError::Decode {
        column,
        expected: "json",
        source,
    })
}

fn parse_stage(raw: &str) -> Result<TaskStage> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|source| {
        StorageError::Decode {
            column: "stage",
            expected: "TaskStage",
            source,
        }
    })
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task> {
    let definition_raw: String = row.get("definition");
    let definition: TaskDefinition = decode(&definition_raw, "definition")?;
    let latest_report_raw: Option<String> = row.get("latest_report");
    let latest_report = latest_report_raw
        .map(|raw| decode(&raw, "latest_report"))
        .transpose()?;

    Ok(Task {
        id: TaskId::new(row.get::<String, _>("id")),
        backend_id: row.get::<String, _>("backend_id").into(),
        job_id: JobId::new(row.get::<String, _>("job_id")),
        definition,
        stage: parse_stage(&row.get::<String, _>("stage"))?,
        latest_report,
        active: row.get("active"),
        agent_complete: row.get("agent_complete"),
        created_at_ms: row.get("created_at_ms"),
        updated_at_ms: row.get("updated_at_ms"),
    })
}

#[cfg(test)]
#[path = "task_repo_tests.rs"]
mod tests;
