// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency readiness: whether a Job's `wait_for_job_ids` are satisfied.

use rap_core::JobState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    /// Every dependency reached SUCCEEDED.
    Satisfied,
    /// At least one dependency is still non-terminal.
    Waiting,
    /// At least one dependency is FAILED.
    Failed,
}

/// Evaluates a Job's readiness from the current `JobState` of each Job it
/// waits on. A Job with no dependencies is trivially `Satisfied`.
pub fn dependency_status(dep_states: &[JobState]) -> DependencyStatus {
    if dep_states.iter().any(|s| *s == JobState::Failed) {
        return DependencyStatus::Failed;
    }
    if dep_states.iter().all(|s| *s == JobState::Succeeded) {
        return DependencyStatus::Satisfied;
    }
    DependencyStatus::Waiting
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
