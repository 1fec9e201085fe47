// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seam between the Builder's pure DAG logic and the persistence layer: the
//! Builder never talks to storage directly, it asks this trait whether a
//! prior Job already covers an (workspace, action, commit) triple.

use rap_core::{JobId, JobState};

/// The subset of a prior Job's state the Builder's decision logic needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorJob {
    pub job_id: JobId,
    pub state: JobState,
    pub retryable_failure: bool,
}

/// Looks up the most recent Job for a given (workspace, action, commit)
/// triple, implemented against `rap-storage`'s `JobRepository` in
/// production and against an in-memory map in tests.
pub trait PriorJobLookup {
    fn find_latest(
        &self,
        workspace_name: &str,
        action_name: &str,
        commit_sha: &str,
    ) -> Option<PriorJob>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use std::collections::HashMap;

    use super::{PriorJob, PriorJobLookup};

    /// In-memory `PriorJobLookup` for Builder tests, keyed the same way the
    /// real dedup index is: `(workspace, action, commit)`.
    #[derive(Debug, Clone, Default)]
    pub struct FakePriorJobLookup {
        jobs: HashMap<(String, String, String), PriorJob>,
    }

    impl FakePriorJobLookup {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(
            &mut self,
            workspace_name: impl Into<String>,
            action_name: impl Into<String>,
            commit_sha: impl Into<String>,
            job: PriorJob,
        ) {
            self.jobs
                .insert((workspace_name.into(), action_name.into(), commit_sha.into()), job);
        }
    }

    impl PriorJobLookup for FakePriorJobLookup {
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
}
