// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace references and the JobRequest record Sync creates from
//! job-server input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{BackendId, JobRequestId};

/// Identifies the target study workspace: its name and git source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRef {
    pub name: String,
    pub repo_url: String,
    pub branch: String,
}

impl WorkspaceRef {
    pub fn new(
        name: impl Into<String>,
        repo_url: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repo_url: repo_url.into(),
            branch: branch.into(),
        }
    }
}

/// The action a JobRequest asks the Controller to run: a specific named
/// action, or the wildcard meaning "run the whole pipeline".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedAction {
    Named(String),
    RunAll,
}

/// An immutable record of one user-initiated execution intent, created by
/// the Sync Loop from job-server input and never mutated afterward apart
/// from `cancelled_actions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub id: JobRequestId,
    pub backend_id: BackendId,
    pub workspace: WorkspaceRef,
    pub requested_action: RequestedAction,
    /// Resolved later by the Builder once the repo is fetched; `None` until then.
    pub commit_sha: Option<String>,
    pub database_name: Option<String>,
    pub force_run: bool,
    /// Action names the user wishes to cancel within this request.
    pub cancelled_actions: Vec<String>,
    /// Original JSON payload, kept verbatim for forensic logging.
    pub original_payload: Value,
    pub created_at_ms: i64,
}

impl JobRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: JobRequestId,
        backend_id: impl Into<BackendId>,
        workspace: WorkspaceRef,
        requested_action: RequestedAction,
        database_name: Option<String>,
        force_run: bool,
        original_payload: Value,
        created_at_ms: i64,
    ) -> Self {
        Self {
            id,
            backend_id: backend_id.into(),
            workspace,
            requested_action,
            commit_sha: None,
            database_name,
            force_run,
            cancelled_actions: Vec::new(),
            original_payload,
            created_at_ms,
        }
    }

    pub fn is_cancelled(&self, action_name: &str) -> bool {
        self.cancelled_actions.iter().any(|a| a == action_name)
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
