// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Executor Adapter: the Agent's capability interface to a container
//! runtime, with variants for production (docker) and tests.

mod docker;
mod traced;

pub use docker::DockerExecutorAdapter;
pub use traced::TracedExecutor;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecutorCall, FakeExecutorAdapter};

use async_trait::async_trait;
use thiserror::Error;

use rap_core::{JobId, RunJobDefinition};

/// Executor-reported lifecycle state for a job's container, as observed by
/// `get_status`. Distinct from `rap_core::TaskStage`: this is the Agent's
/// local view before it has reported anything upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorStatus {
    Unknown,
    Preparing,
    Prepared,
    Executing,
    Executed,
    Finalizing,
    Finalized,
    Error,
}

/// Metadata accompanying a status query.
#[derive(Debug, Clone, Default)]
pub struct ExecutorStatusReport {
    pub status: Option<ExecutorStatus>,
    pub exit_code: Option<i32>,
    pub started_at_ms: Option<i64>,
    pub finished_at_ms: Option<i64>,
    pub container_id: Option<String>,
}

impl Default for ExecutorStatus {
    fn default() -> Self {
        ExecutorStatus::Unknown
    }
}

/// Result of a `finalize` call: resolved outputs, unmatched patterns, and
/// where the log bundle landed.
#[derive(Debug, Clone, Default)]
pub struct FinalizeResult {
    pub outputs: std::collections::HashMap<String, rap_core::PrivacyLevel>,
    pub unmatched_patterns: Vec<String>,
    pub log_bundle_path: String,
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("prepare failed: {0}")]
    PrepFailed(String),
    #[error("execute failed: {0}")]
    ExecuteFailed(String),
    #[error("finalize failed: {0}")]
    FinalizeFailed(String),
    #[error("terminate failed: {0}")]
    TerminateFailed(String),
    #[error("cleanup failed: {0}")]
    CleanupFailed(String),
    #[error("status query failed: {0}")]
    StatusFailed(String),
}

/// Capability interface an Agent consumes to drive one job's container
/// lifecycle. Implementations must be idempotent where the spec requires it
/// (`get_status`, `cleanup`) since the Agent is stateless and may re-issue a
/// call after a restart.
#[async_trait]
pub trait ExecutorAdapter: Clone + Send + Sync + 'static {
    /// Create a private volume for the job, fetch the study-repo checkout
    /// at the resolved commit, and copy in dependency outputs.
    async fn prepare(&self, task_def: &RunJobDefinition) -> Result<(), ExecutorError>;

    /// Start a container running the supplied command against the prepared
    /// volume. Non-blocking: returns once the container exists.
    async fn execute(&self, task_def: &RunJobDefinition) -> Result<(), ExecutorError>;

    /// Idempotent status query; safe to call repeatedly.
    async fn get_status(&self, job_id: &JobId) -> Result<ExecutorStatusReport, ExecutorError>;

    /// Resolve output patterns to concrete files, copy them to the
    /// appropriate privacy-classified storage base, and write a log bundle.
    async fn finalize(
        &self,
        task_def: &RunJobDefinition,
        cancelled: bool,
    ) -> Result<FinalizeResult, ExecutorError>;

    /// Forcibly stop a running container.
    async fn terminate(&self, job_id: &JobId) -> Result<(), ExecutorError>;

    /// Remove container and volume. Safe to call in any state.
    async fn cleanup(&self, job_id: &JobId) -> Result<(), ExecutorError>;
}
