// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridges `rap_builder::PriorJobLookup` (synchronous, by design — the
//! Builder's decision logic is pure) to `rap_storage::JobRepository`
//! (async). Rather than making the trait async, the Controller pre-fetches
//! every candidate action's most recent prior Job into an in-memory map
//! before invoking the Builder, the same shape as the Builder's own
//! `FakePriorJobLookup` test double.

use std::collections::HashMap;

use rap_builder::{PriorJob, PriorJobLookup};
use rap_core::StatusCode;
use rap_storage::JobRepository;

use crate::error::ControllerError;

pub struct StoragePriorJobLookup {
    jobs: HashMap<(String, String, String), PriorJob>,
}

impl StoragePriorJobLookup {
    /// Looks up the latest prior Job for every action name in `action_names`
    /// against `(workspace_name, action_name, commit_sha)`, in one pass
    /// before the Builder runs.
    pub async fn prefetch(
        job_repo: &JobRepository,
        workspace_name: &str,
        commit_sha: &str,
        action_names: &[String],
    ) -> Result<Self, ControllerError> {
        let mut jobs = HashMap::with_capacity(action_names.len());
        for action_name in action_names {
            if let Some(job) = job_repo
                .find_latest_for_dedup(workspace_name, action_name, commit_sha)
                .await?
            {
                let key = (workspace_name.to_string(), action_name.clone(), commit_sha.to_string());
                jobs.insert(
                    key,
                    PriorJob {
                        job_id: job.id,
                        state: job.state,
                        retryable_failure: is_retryable_failure(job.status_code),
                    },
                );
            }
        }
        Ok(Self { jobs })
    }
}

impl PriorJobLookup for StoragePriorJobLookup {
    fn find_latest(
        &self,
        workspace_name: &str,
        action_name: &str,
        commit_sha: &str,
    ) -> Option<PriorJob> {
        self.jobs
            .get(&(
                workspace_name.to_string(),
                action_name.to_string(),
                commit_sha.to_string(),
            ))
            .cloned()
    }
}

/// A prior Job's failure only blocks re-creation (fail-fast) when the
/// failure reflects the action itself. `CancelledByUser`/`KilledByAdmin`
/// reflect an operator decision on the *previous* request, not a defect in
/// the action, so a fresh request should get a fresh attempt.
fn is_retryable_failure(status_code: StatusCode) -> bool {
    matches!(status_code, StatusCode::CancelledByUser | StatusCode::KilledByAdmin)
}

#[cfg(test)]
#[path = "storage_lookup_tests.rs"]
mod tests;
