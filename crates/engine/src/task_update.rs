// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps an Agent-reported Task stage update to the Controller-owned
//! status_code it produces, including the FINALIZED terminal-code decision
//! (delegated to the Job Definition Builder's `finalize_status_code`) and
//! the non-fatal-error retry/fail-fast split.

use rap_builder::finalize_status_code;
use rap_core::{StatusCode, TaskStage, TaskStageReport};

use crate::retry::{should_retry, RetryPolicy};

/// The status_code a non-ERROR stage update maps to. `Unknown` and `Error`
/// are not covered here — `Unknown` never arrives as an update, and `Error`
/// needs the retry budget to resolve (see [`resolve_error_outcome`]).
pub fn stage_status_code(stage: TaskStage, report: Option<&TaskStageReport>) -> Option<StatusCode> {
    match stage {
        TaskStage::Unknown | TaskStage::Error => None,
        TaskStage::Prepared => Some(StatusCode::Prepared),
        TaskStage::Executing => Some(StatusCode::Executing),
        TaskStage::Executed => Some(StatusCode::Executed),
        TaskStage::Finalized => {
            let report = report?;
            Some(finalize_status_code(
                report.exit_code,
                report.unmatched_patterns.is_empty(),
            ))
        }
    }
}

/// What to do with a Job whose RUNJOB task reported ERROR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOutcome {
    /// Transient cause, retry budget not exhausted: re-enter
    /// WAITING_ON_NEW_TASK so the next tick issues a fresh RUNJOB.
    RetryJob,
    /// Non-retryable cause, or retry budget exhausted: terminal failure.
    FailJob(StatusCode),
}

pub fn resolve_error_outcome(
    report: Option<&TaskStageReport>,
    retry_count: u32,
    policy: RetryPolicy,
) -> ErrorOutcome {
    let retryable = report.is_some_and(|r| r.retryable);
    if retryable && should_retry(retry_count, policy) {
        ErrorOutcome::RetryJob
    } else {
        ErrorOutcome::FailJob(StatusCode::JobError)
    }
}

#[cfg(test)]
#[path = "task_update_tests.rs"]
mod tests;
