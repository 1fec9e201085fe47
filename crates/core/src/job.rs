// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and the Controller-owned state machine.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::id::{BackendId, JobId, JobRequestId};
use crate::privacy::PrivacyLevel;

/// Coarse Job state. Once `Failed` or `Succeeded`, never changes again —
/// only `status_code` may still be refined within the terminal bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Failed,
    Succeeded,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Running => write!(f, "running"),
            JobState::Failed => write!(f, "failed"),
            JobState::Succeeded => write!(f, "succeeded"),
        }
    }
}

/// Fine-grained status code. Every variant has exactly one `JobState` it
/// belongs to — see [`StatusCode::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    // -- PENDING --
    /// Just inserted; preconditions not yet evaluated.
    Created,
    /// At least one dependency has not reached SUCCEEDED.
    WaitingOnDependencies,
    /// The backend's db-maintenance flag is set.
    WaitingDbMaintenance,
    /// The backend's paused flag is set.
    WaitingPaused,
    /// Operator requested reboot preparation.
    WaitingOnReboot,
    /// Dependencies satisfied but the concurrency cap is reached.
    WaitingOnWorkers,
    /// Previous RUNJOB task errored non-fatally; waiting to re-issue.
    WaitingOnNewTask,

    // -- RUNNING --
    /// RUNJOB task dispatched, not yet claimed by an Agent.
    Initiated,
    /// Mirrors the Agent-reported task stage of the same name.
    Prepared,
    Executing,
    Executed,
    Finalizing,
    Finalized,

    // -- terminal: FAILED --
    /// Codelist content is newer than the resolved repo checkout.
    StaleCodelists,
    /// Container exited with a non-zero code.
    NonzeroExit,
    /// Zero exit, but declared output patterns left unmatched files.
    UnmatchedPatterns,
    /// Executor reported an internal failure during execution.
    JobError,
    CancelledByUser,
    KilledByAdmin,
    /// A dependency reached FAILED, or a dependency's outputs vanished.
    DependencyFailed,
    /// Validation failure: unknown action, bad command prefix, cyclic deps,
    /// invalid output spec.
    InvalidPipeline,
    InternalError,

    // -- terminal: SUCCEEDED --
    /// Finalize reported success and all declared outputs are present.
    Succeeded,
}

impl StatusCode {
    /// The coarse [`JobState`] this status code belongs to.
    pub fn state(&self) -> JobState {
        use StatusCode::*;
        match self {
            Created
            | WaitingOnDependencies
            | WaitingDbMaintenance
            | WaitingPaused
            | WaitingOnReboot
            | WaitingOnWorkers
            | WaitingOnNewTask => JobState::Pending,

            Initiated | Prepared | Executing | Executed | Finalizing | Finalized => {
                JobState::Running
            }

            StaleCodelists
            | NonzeroExit
            | UnmatchedPatterns
            | JobError
            | CancelledByUser
            | KilledByAdmin
            | DependencyFailed
            | InvalidPipeline
            | InternalError => JobState::Failed,

            Succeeded => JobState::Succeeded,
        }
    }

    /// Whether this status code represents a terminal Job state.
    pub fn is_terminal(&self) -> bool {
        matches!(self.state(), JobState::Failed | JobState::Succeeded)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Matches the serde rename so status messages sent to the job-server
        // use the same spelling as the wire format.
        let json = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        match json {
            serde_json::Value::String(s) => write!(f, "{s}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// A single action, scoped to a JobRequest, flowing through the Controller's
/// state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_request_id: JobRequestId,
    pub backend_id: BackendId,
    /// The workspace name, denormalized from the owning JobRequest so the
    /// builder's dedup lookup (same workspace, action, commit) stays a
    /// single-table query.
    pub workspace_name: String,
    /// The commit resolved by the builder at job-creation time. Part of
    /// job identity: a later request at the same commit is deduplicated.
    pub commit_sha: String,
    pub action_name: String,
    /// Run command, as a string array (never shell-interpreted).
    pub run_command: Vec<String>,
    pub image: String,
    /// Action names whose outputs must be staged as inputs.
    pub needs_actions: Vec<String>,
    /// Job ids this Job must await before admission.
    pub wait_for_job_ids: Vec<JobId>,
    /// Glob pattern -> required privacy level.
    pub output_spec: HashMap<String, PrivacyLevel>,
    /// Concrete relative path -> privacy level, populated by finalize.
    pub outputs: HashMap<String, PrivacyLevel>,
    pub unmatched_patterns: Vec<String>,
    /// Whether this action touches the shared database, surfaced explicitly
    /// from the action's declared metadata rather than inferred from the
    /// image name.
    pub is_db_worker: bool,
    pub state: JobState,
    pub status_code: StatusCode,
    pub status_message: Option<String>,
    pub created_at_ms: i64,
    pub started_at_ms: Option<i64>,
    pub completed_at_ms: Option<i64>,
    pub cancelled: bool,
    /// Non-fatal RUNJOB retries consumed so far; capped by
    /// `max_task_retries`.
    pub retry_count: u32,
}

/// Parameters for [`Job::new`], grouped to keep the constructor readable —
/// the Builder assembles one of these per admitted action.
pub struct NewJob {
    pub id: JobId,
    pub job_request_id: JobRequestId,
    pub backend_id: BackendId,
    pub workspace_name: String,
    pub commit_sha: String,
    pub action_name: String,
    pub run_command: Vec<String>,
    pub image: String,
    pub needs_actions: Vec<String>,
    pub wait_for_job_ids: Vec<JobId>,
    pub output_spec: HashMap<String, PrivacyLevel>,
    pub is_db_worker: bool,
}

impl Job {
    pub fn new(params: NewJob, clock: &impl Clock) -> Self {
        Self {
            id: params.id,
            job_request_id: params.job_request_id,
            backend_id: params.backend_id,
            workspace_name: params.workspace_name,
            commit_sha: params.commit_sha,
            action_name: params.action_name,
            run_command: params.run_command,
            image: params.image,
            needs_actions: params.needs_actions,
            wait_for_job_ids: params.wait_for_job_ids,
            output_spec: params.output_spec,
            outputs: HashMap::new(),
            unmatched_patterns: Vec::new(),
            is_db_worker: params.is_db_worker,
            state: JobState::Pending,
            status_code: StatusCode::Created,
            status_message: None,
            created_at_ms: clock.epoch_ms(),
            started_at_ms: None,
            completed_at_ms: None,
            cancelled: false,
            retry_count: 0,
        }
    }

    /// A Job created already-terminal, e.g. by builder-time validation
    /// failure (cyclic deps, unknown action, stale codelists).
    #[allow(clippy::too_many_arguments)]
    pub fn new_terminal(
        id: JobId,
        job_request_id: JobRequestId,
        backend_id: impl Into<BackendId>,
        workspace_name: impl Into<String>,
        action_name: impl Into<String>,
        status_code: StatusCode,
        status_message: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        debug_assert!(status_code.is_terminal());
        let now = clock.epoch_ms();
        Self {
            id,
            job_request_id,
            backend_id: backend_id.into(),
            workspace_name: workspace_name.into(),
            commit_sha: String::new(),
            action_name: action_name.into(),
            run_command: Vec::new(),
            image: String::new(),
            needs_actions: Vec::new(),
            wait_for_job_ids: Vec::new(),
            output_spec: HashMap::new(),
            outputs: HashMap::new(),
            unmatched_patterns: Vec::new(),
            is_db_worker: false,
            state: status_code.state(),
            status_code,
            status_message: Some(status_message.into()),
            created_at_ms: now,
            started_at_ms: None,
            completed_at_ms: Some(now),
            cancelled: status_code == StatusCode::CancelledByUser,
            retry_count: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Failed | JobState::Succeeded)
    }

    /// Transition to a new status code, updating `state` and timestamps.
    /// Monotonic: no-op once the Job is already terminal.
    pub fn transition(&mut self, status_code: StatusCode, clock: &impl Clock) {
        if self.is_terminal() {
            return;
        }
        let was_pending = self.state == JobState::Pending;
        self.state = status_code.state();
        self.status_code = status_code;
        let now = clock.epoch_ms();
        if was_pending && self.state == JobState::Running && self.started_at_ms.is_none() {
            self.started_at_ms = Some(now);
        }
        if status_code.is_terminal() {
            self.completed_at_ms = Some(now);
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
