// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake executor adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use rap_core::{JobId, RunJobDefinition};

use super::{ExecutorAdapter, ExecutorError, ExecutorStatus, ExecutorStatusReport, FinalizeResult};

/// Recorded executor call.
#[derive(Debug, Clone)]
pub enum ExecutorCall {
    Prepare { job_id: JobId },
    Execute { job_id: JobId },
    GetStatus { job_id: JobId },
    Finalize { job_id: JobId, cancelled: bool },
    Terminate { job_id: JobId },
    Cleanup { job_id: JobId },
}

#[derive(Debug, Clone)]
struct FakeJobState {
    status: ExecutorStatus,
    exit_code: Option<i32>,
    outputs: HashMap<String, rap_core::PrivacyLevel>,
    unmatched_patterns: Vec<String>,
    fail_prepare: bool,
    fail_execute: bool,
}

impl Default for FakeJobState {
    fn default() -> Self {
        Self {
            status: ExecutorStatus::Unknown,
            exit_code: None,
            outputs: HashMap::new(),
            unmatched_patterns: Vec::new(),
            fail_prepare: false,
            fail_execute: false,
        }
    }
}

struct FakeExecutorState {
    jobs: HashMap<String, FakeJobState>,
    calls: Vec<ExecutorCall>,
}

/// Fake executor adapter for testing. Call log plus directly-mutable
/// per-job state so tests can drive a job through prepare/execute/finalize
/// without a container runtime.
#[derive(Clone)]
pub struct FakeExecutorAdapter {
    inner: Arc<Mutex<FakeExecutorState>>,
}

impl Default for FakeExecutorAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeExecutorState {
                jobs: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeExecutorAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_exit_code(&self, job_id: &JobId, exit_code: i32) {
        let mut inner = self.inner.lock();
        let state = inner.jobs.entry(job_id.to_string()).or_default();
        state.exit_code = Some(exit_code);
        state.status = ExecutorStatus::Executed;
    }

    pub fn set_outputs(&self, job_id: &JobId, outputs: HashMap<String, rap_core::PrivacyLevel>) {
        let mut inner = self.inner.lock();
        inner.jobs.entry(job_id.to_string()).or_default().outputs = outputs;
    }

    pub fn set_unmatched_patterns(&self, job_id: &JobId, patterns: Vec<String>) {
        let mut inner = self.inner.lock();
        inner
            .jobs
            .entry(job_id.to_string())
            .or_default()
            .unmatched_patterns = patterns;
    }

    pub fn fail_prepare(&self, job_id: &JobId) {
        let mut inner = self.inner.lock();
        inner.jobs.entry(job_id.to_string()).or_default().fail_prepare = true;
    }

    pub fn fail_execute(&self, job_id: &JobId) {
        let mut inner = self.inner.lock();
        inner.jobs.entry(job_id.to_string()).or_default().fail_execute = true;
    }

    pub fn status_of(&self, job_id: &JobId) -> ExecutorStatus {
        self.inner
            .lock()
            .jobs
            .get(job_id.as_str())
            .map(|s| s.status)
            .unwrap_or(ExecutorStatus::Unknown)
    }
}

#[async_trait]
impl ExecutorAdapter for FakeExecutorAdapter {
    async fn prepare(&self, task_def: &RunJobDefinition) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Prepare {
            job_id: task_def.job_id.clone(),
        });
        let state = inner.jobs.entry(task_def.job_id.to_string()).or_default();
        if state.fail_prepare {
            return Err(ExecutorError::PrepFailed("fake prepare failure".into()));
        }
        state.status = ExecutorStatus::Prepared;
        Ok(())
    }

    async fn execute(&self, task_def: &RunJobDefinition) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Execute {
            job_id: task_def.job_id.clone(),
        });
        let state = inner.jobs.entry(task_def.job_id.to_string()).or_default();
        if state.fail_execute {
            return Err(ExecutorError::ExecuteFailed("fake execute failure".into()));
        }
        state.status = ExecutorStatus::Executing;
        Ok(())
    }

    async fn get_status(&self, job_id: &JobId) -> Result<ExecutorStatusReport, ExecutorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::GetStatus {
            job_id: job_id.clone(),
        });
        let state = inner.jobs.entry(job_id.to_string()).or_default();
        Ok(ExecutorStatusReport {
            status: Some(state.status),
            exit_code: state.exit_code,
            started_at_ms: None,
            finished_at_ms: None,
            container_id: Some(format!("fake-{job_id}")),
        })
    }

    async fn finalize(
        &self,
        task_def: &RunJobDefinition,
        cancelled: bool,
    ) -> Result<FinalizeResult, ExecutorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Finalize {
            job_id: task_def.job_id.clone(),
            cancelled,
        });
        let state = inner.jobs.entry(task_def.job_id.to_string()).or_default();
        state.status = ExecutorStatus::Finalized;
        Ok(FinalizeResult {
            outputs: state.outputs.clone(),
            unmatched_patterns: state.unmatched_patterns.clone(),
            log_bundle_path: format!("/fake/logs/{}.log", task_def.job_id),
        })
    }

    async fn terminate(&self, job_id: &JobId) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Terminate {
            job_id: job_id.clone(),
        });
        if let Some(state) = inner.jobs.get_mut(job_id.as_str()) {
            state.status = ExecutorStatus::Error;
        }
        Ok(())
    }

    async fn cleanup(&self, job_id: &JobId) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Cleanup {
            job_id: job_id.clone(),
        });
        inner.jobs.remove(job_id.as_str());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
