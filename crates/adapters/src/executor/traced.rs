// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced executor wrapper for consistent observability

use async_trait::async_trait;
use tracing::Instrument;

use rap_core::{JobId, RunJobDefinition};

use super::{ExecutorAdapter, ExecutorError, ExecutorStatusReport, FinalizeResult};

/// Wrapper that adds tracing to any `ExecutorAdapter`.
#[derive(Clone)]
pub struct TracedExecutor<E> {
    inner: E,
}

impl<E> TracedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: ExecutorAdapter> ExecutorAdapter for TracedExecutor<E> {
    async fn prepare(&self, task_def: &RunJobDefinition) -> Result<(), ExecutorError> {
        let job_id = task_def.job_id.clone();
        async {
            tracing::info!(commit = %task_def.commit_sha, "preparing");
            let start = std::time::Instant::now();
            let result = self.inner.prepare(task_def).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "prepared"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "prepare failed"),
            }
            result
        }
        .instrument(tracing::info_span!("executor.prepare", job_id = %job_id))
        .await
    }

    async fn execute(&self, task_def: &RunJobDefinition) -> Result<(), ExecutorError> {
        let job_id = task_def.job_id.clone();
        async {
            tracing::info!(image = %task_def.image, "starting");
            let start = std::time::Instant::now();
            let result = self.inner.execute(task_def).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "started"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "execute failed"),
            }
            result
        }
        .instrument(tracing::info_span!("executor.execute", job_id = %job_id))
        .await
    }

    async fn get_status(&self, job_id: &JobId) -> Result<ExecutorStatusReport, ExecutorError> {
        let result = self.inner.get_status(job_id).await;
        tracing::trace!(%job_id, status = ?result.as_ref().ok().and_then(|r| r.status), "checked");
        result
    }

    async fn finalize(
        &self,
        task_def: &RunJobDefinition,
        cancelled: bool,
    ) -> Result<FinalizeResult, ExecutorError> {
        let job_id = task_def.job_id.clone();
        async {
            tracing::info!(cancelled, "finalizing");
            let start = std::time::Instant::now();
            let result = self.inner.finalize(task_def, cancelled).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(r) => tracing::info!(
                    elapsed_ms,
                    outputs = r.outputs.len(),
                    unmatched = r.unmatched_patterns.len(),
                    "finalized"
                ),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "finalize failed"),
            }
            result
        }
        .instrument(tracing::info_span!("executor.finalize", job_id = %job_id))
        .await
    }

    async fn terminate(&self, job_id: &JobId) -> Result<(), ExecutorError> {
        let result = self.inner.terminate(job_id).await;
        tracing::info_span!("executor.terminate", %job_id).in_scope(|| match &result {
            Ok(()) => tracing::info!("terminated"),
            Err(e) => tracing::warn!(error = %e, "terminate failed (may be expected)"),
        });
        result
    }

    async fn cleanup(&self, job_id: &JobId) -> Result<(), ExecutorError> {
        let result = self.inner.cleanup(job_id).await;
        tracing::info_span!("executor.cleanup", %job_id).in_scope(|| match &result {
            Ok(()) => tracing::info!("cleaned up"),
            Err(e) => tracing::warn!(error = %e, "cleanup failed"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
