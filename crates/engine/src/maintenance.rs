// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DB maintenance and reboot-preparation transitions, both driven by
//! per-backend flags read fresh every tick (see `rap_core::flag`).

use rap_core::{JobState, StatusCode};

/// Whether a RUNNING DB-worker Job should be paused for maintenance, or a
/// previously-paused Job should resume now that the token has changed back.
pub fn db_maintenance_transition(
    status_code: StatusCode,
    is_db_worker: bool,
    in_maintenance: bool,
) -> Option<StatusCode> {
    if in_maintenance && is_db_worker && status_code.state() == JobState::Running {
        return Some(StatusCode::WaitingDbMaintenance);
    }
    if !in_maintenance && status_code == StatusCode::WaitingDbMaintenance {
        return Some(StatusCode::WaitingOnDependencies);
    }
    None
}

/// What reboot preparation does to a Job, by its current coarse state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootAction {
    None,
    /// PENDING: pause in place, no Task involved.
    PauseToWaitingOnReboot,
    /// RUNNING: deactivate the RUNJOB task and issue a CANCELJOB task; once
    /// confirmed the Job becomes WAITING_ON_REBOOT, not CANCELLED_BY_USER.
    IssueCancelJobTask,
}

pub fn reboot_transition(job_state: JobState, reboot_requested: bool) -> RebootAction {
    if !reboot_requested {
        return RebootAction::None;
    }
    match job_state {
        JobState::Pending => RebootAction::PauseToWaitingOnReboot,
        JobState::Running => RebootAction::IssueCancelJobTask,
        JobState::Failed | JobState::Succeeded => RebootAction::None,
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
