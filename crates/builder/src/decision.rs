// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-action admission decision: skip / reuse-in-flight / fail-fast /
//! create, per a prior Job (if any) for the same (workspace, action,
//! commit) triple.

use rap_core::{JobId, JobState};

use crate::prior::PriorJob;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A prior Job for this (workspace, action, commit) succeeded and
    /// `force_run` is false: reuse its id, do not create a new row.
    Skip { job_id: JobId },
    /// A prior Job is still non-terminal: link dependents to it instead of
    /// creating a duplicate.
    ReuseInFlight { job_id: JobId },
    /// A prior Job failed non-retriably: reuse its (failed) id so
    /// dependents observe DEPENDENCY_FAILED without re-running the action.
    FailFast { job_id: JobId },
    /// No usable prior Job: create a new row.
    Create,
}

/// Decides what to do for one action given its most recent prior Job (if
/// any was found via `PriorJobLookup`) and the JobRequest's `force_run` flag.
pub fn decide(prior: Option<&PriorJob>, force_run: bool) -> Decision {
    let Some(prior) = prior else {
        return Decision::Create;
    };

    if force_run {
        return Decision::Create;
    }

    match prior.state {
        JobState::Succeeded => Decision::Skip {
            job_id: prior.job_id.clone(),
        },
        JobState::Pending | JobState::Running => Decision::ReuseInFlight {
            job_id: prior.job_id.clone(),
        },
        JobState::Failed if !prior.retryable_failure => Decision::FailFast {
            job_id: prior.job_id.clone(),
        },
        JobState::Failed => Decision::Create,
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
