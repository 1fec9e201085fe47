// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pass 2 of the Controller tick: for one PENDING Job (freshly CREATED, or
//! re-entering admission from WAITING_ON_NEW_TASK), decide the next
//! status_code or whether it is ready for task issuance. Checked in the
//! order the status_code table implies: dependency failure, reboot, DB
//! maintenance, pause, dependency wait, concurrency cap.

use rap_core::StatusCode;

use crate::dependency::DependencyStatus;

/// Everything Pass 2 needs to know about one PENDING Job's surroundings,
/// gathered by the caller from storage/flags/admission counts.
#[derive(Debug, Clone, Copy)]
pub struct PendingEvalContext {
    pub dep_status: DependencyStatus,
    pub paused: bool,
    pub in_maintenance: bool,
    pub reboot_requested: bool,
    pub admissible: bool,
    pub is_db_worker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOutcome {
    SetStatusCode(StatusCode),
    IssueRunJobTask,
}

pub fn evaluate_pending_job(ctx: PendingEvalContext) -> PendingOutcome {
    let outcome = evaluate_pending_job_inner(ctx);
    tracing::trace!(?ctx, ?outcome, "evaluated pending job");
    outcome
}

fn evaluate_pending_job_inner(ctx: PendingEvalContext) -> PendingOutcome {
    if ctx.dep_status == DependencyStatus::Failed {
        return PendingOutcome::SetStatusCode(StatusCode::DependencyFailed);
    }
    if ctx.reboot_requested {
        return PendingOutcome::SetStatusCode(StatusCode::WaitingOnReboot);
    }
    if ctx.in_maintenance && ctx.is_db_worker {
        return PendingOutcome::SetStatusCode(StatusCode::WaitingDbMaintenance);
    }
    if ctx.paused {
        return PendingOutcome::SetStatusCode(StatusCode::WaitingPaused);
    }
    if ctx.dep_status == DependencyStatus::Waiting {
        return PendingOutcome::SetStatusCode(StatusCode::WaitingOnDependencies);
    }
    if !ctx.admissible {
        return PendingOutcome::SetStatusCode(StatusCode::WaitingOnWorkers);
    }
    PendingOutcome::IssueRunJobTask
}

#[cfg(test)]
#[path = "evaluate_tests.rs"]
mod tests;
