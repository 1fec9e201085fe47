// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task record: the externally-dispatchable unit of work the Controller
//! hands to an Agent.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{BackendId, JobId, TaskId};
use crate::privacy::PrivacyLevel;

/// What kind of work a Task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    RunJob,
    CancelJob,
    DbStatus,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::RunJob => write!(f, "runjob"),
            TaskKind::CancelJob => write!(f, "canceljob"),
            TaskKind::DbStatus => write!(f, "dbstatus"),
        }
    }
}

/// Agent-owned execution stage, reported back to the Controller on every
/// task-update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStage {
    Unknown,
    Prepared,
    Executing,
    Executed,
    Finalized,
    Error,
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        match json {
            serde_json::Value::String(s) => write!(f, "{s}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// The full definition needed to execute a RUNJOB task offline, without
/// further Controller calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunJobDefinition {
    pub job_id: JobId,
    pub commit_sha: String,
    pub command: Vec<String>,
    pub image: String,
    pub cpu_limit: Option<f64>,
    pub memory_limit_mb: Option<u64>,
    /// Action names whose outputs must be staged into the volume.
    pub input_actions: Vec<String>,
    pub output_spec: HashMap<String, PrivacyLevel>,
    pub env: HashMap<String, String>,
    /// Stable label identifying the owning job, attached to the container.
    pub labels: HashMap<String, String>,
}

/// References the RUNJOB task being cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelJobDefinition {
    pub job_id: JobId,
    pub target_task_id: TaskId,
}

/// No payload beyond the backend itself, which the Task already carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbStatusDefinition {}

/// Opaque definition payload, tagged by `TaskKind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskDefinition {
    RunJob(RunJobDefinition),
    CancelJob(CancelJobDefinition),
    DbStatus(DbStatusDefinition),
}

impl TaskDefinition {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskDefinition::RunJob(_) => TaskKind::RunJob,
            TaskDefinition::CancelJob(_) => TaskKind::CancelJob,
            TaskDefinition::DbStatus(_) => TaskKind::DbStatus,
        }
    }
}

/// Results payload accompanying a stage update. Fields are populated
/// incrementally as the Agent progresses through prepare/execute/finalize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStageReport {
    pub exit_code: Option<i32>,
    pub outputs: HashMap<String, PrivacyLevel>,
    pub unmatched_patterns: Vec<String>,
    pub error_message: Option<String>,
    /// Whether an ERROR report reflects a transient, retryable cause.
    pub retryable: bool,
}

/// An externally-dispatchable unit of work for an Agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub backend_id: BackendId,
    pub job_id: JobId,
    pub definition: TaskDefinition,
    pub stage: TaskStage,
    pub latest_report: Option<TaskStageReport>,
    pub active: bool,
    pub agent_complete: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Task {
    pub fn new(
        id: TaskId,
        backend_id: impl Into<BackendId>,
        job_id: JobId,
        definition: TaskDefinition,
        created_at_ms: i64,
    ) -> Self {
        Self {
            id,
            backend_id: backend_id.into(),
            job_id,
            definition,
            stage: TaskStage::Unknown,
            latest_report: None,
            active: true,
            agent_complete: false,
            created_at_ms,
            updated_at_ms: created_at_ms,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.definition.kind()
    }

    /// Apply a stage update reported by an Agent. Setting `agent_complete`
    /// implies `active=false`.
    pub fn apply_update(
        &mut self,
        stage: TaskStage,
        report: Option<TaskStageReport>,
        agent_complete: bool,
        now_ms: i64,
    ) {
        self.stage = stage;
        if let Some(report) = report {
            self.latest_report = Some(report);
        }
        self.agent_complete = agent_complete;
        if agent_complete {
            self.active = false;
        }
        self.updated_at_ms = now_ms;
    }

    pub fn deactivate(&mut self, now_ms: i64) {
        self.active = false;
        self.updated_at_ms = now_ms;
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
