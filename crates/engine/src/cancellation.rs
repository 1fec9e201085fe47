// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation semantics: a JobRequest's cancellation list names action
//! names within it the user wishes to stop. What the Controller does next
//! depends on whether the Job has already been dispatched.

use rap_core::JobState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationAction {
    /// Not named in the cancellation list, or already terminal: no-op.
    NoneNeeded,
    /// Still PENDING: go straight to CANCELLED_BY_USER, no Task involved.
    DirectToCancelled,
    /// RUNNING: deactivate the RUNJOB task and issue a CANCELJOB task;
    /// the Job becomes CANCELLED_BY_USER only once that's confirmed.
    IssueCancelJobTask,
}

pub fn decide_cancellation(job_state: JobState, is_requested: bool) -> CancellationAction {
    if !is_requested {
        return CancellationAction::NoneNeeded;
    }
    match job_state {
        JobState::Pending => CancellationAction::DirectToCancelled,
        JobState::Running => CancellationAction::IssueCancelJobTask,
        JobState::Failed | JobState::Succeeded => CancellationAction::NoneNeeded,
    }
}

#[cfg(test)]
#[path = "cancellation_tests.rs"]
mod tests;
