// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Definition Builder: turns an incoming JobRequest plus the fetched
//! `project.yaml` into a set of Job rows with dependency edges resolved.

use std::collections::HashMap;

use rap_adapters::Pipeline;
use rap_core::{Clock, IdGen, Job, JobId, JobRequest, NewJob, RequestedAction, StatusCode};

use crate::decision::{decide, Decision};
use crate::error::BuildError;
use crate::graph::{topological_order, transitive_needs};
use crate::prior::PriorJobLookup;

/// Everything the Builder produced for one JobRequest: new Job rows to
/// insert, plus the ids (new or reused) dependents should wait on.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Job rows to insert, in dependency order.
    pub new_jobs: Vec<Job>,
    /// For every action in the requested closure, the Job id that now
    /// represents it — a freshly created row, or a reused prior one.
    pub resolved_job_ids: HashMap<String, JobId>,
}

/// Set of codelists actions the caller has determined are stale relative to
/// the resolved commit (computed by the repo-fetcher/codelists adapter, not
/// by the Builder itself).
pub type StaleCodelistActions<'a> = &'a [String];

pub struct JobDefinitionBuilder<'a, L, G, C> {
    pipeline: &'a Pipeline,
    prior_jobs: &'a L,
    id_gen: &'a G,
    clock: &'a C,
}

impl<'a, L, G, C> JobDefinitionBuilder<'a, L, G, C>
where
    L: PriorJobLookup,
    G: IdGen,
    C: Clock,
{
    pub fn new(pipeline: &'a Pipeline, prior_jobs: &'a L, id_gen: &'a G, clock: &'a C) -> Self {
        Self {
            pipeline,
            prior_jobs,
            id_gen,
            clock,
        }
    }

    /// Expands `request` into Job rows. `commit_sha` is the already-resolved
    /// commit (the Builder does not itself talk to git); `stale_codelists`
    /// names actions the caller has flagged as having newer codelist content
    /// than this checkout.
    pub fn build(
        &self,
        request: &JobRequest,
        commit_sha: &str,
        stale_codelists: StaleCodelistActions<'_>,
    ) -> BuildOutcome {
        let roots = match &request.requested_action {
            RequestedAction::Named(name) => vec![name.clone()],
            RequestedAction::RunAll => self.pipeline.action_names(),
        };

        let closure = match transitive_needs(self.pipeline, &roots) {
            Ok(set) => set,
            Err(err) => {
                return self.terminal_outcome(request, commit_sha, err);
            }
        };

        let order = match topological_order(self.pipeline, &closure) {
            Ok(order) => order,
            Err(err) => {
                return self.terminal_outcome(request, commit_sha, err);
            }
        };

        let mut new_jobs = Vec::new();
        let mut resolved_job_ids: HashMap<String, JobId> = HashMap::new();

        for action_name in order {
            if stale_codelists.iter().any(|a| a == &action_name) {
                let job = self.terminal_job(
                    request,
                    commit_sha,
                    &action_name,
                    &BuildError::StaleCodelists {
                        action: action_name.clone(),
                    },
                );
                resolved_job_ids.insert(action_name.clone(), job.id.clone());
                new_jobs.push(job);
                continue;
            }

            let Some(action) = self.pipeline.action(&action_name) else {
                continue;
            };

            let prior = self
                .prior_jobs
                .find_latest(&request.workspace.name, &action_name, commit_sha);

            match decide(prior.as_ref(), request.force_run) {
                Decision::Skip { job_id } | Decision::ReuseInFlight { job_id } | Decision::FailFast { job_id } => {
                    resolved_job_ids.insert(action_name.clone(), job_id);
                }
                Decision::Create => {
                    let wait_for_job_ids: Vec<JobId> = action
                        .needs
                        .iter()
                        .filter_map(|dep| resolved_job_ids.get(dep).cloned())
                        .collect();

                    let job = Job::new(
                        NewJob {
                            id: JobId::new(self.id_gen.next()),
                            job_request_id: request.id.clone(),
                            backend_id: request.backend_id.clone(),
                            workspace_name: request.workspace.name.clone(),
                            commit_sha: commit_sha.to_string(),
                            action_name: action_name.clone(),
                            run_command: action.command.clone(),
                            image: action.image.clone(),
                            needs_actions: action.needs.clone(),
                            wait_for_job_ids,
                            output_spec: action.output_spec.clone(),
                            is_db_worker: action.is_db_worker,
                        },
                        self.clock,
                    );

                    resolved_job_ids.insert(action_name.clone(), job.id.clone());
                    new_jobs.push(job);
                }
            }
        }

        BuildOutcome {
            new_jobs,
            resolved_job_ids,
        }
    }

    fn terminal_job(
        &self,
        request: &JobRequest,
        commit_sha: &str,
        action_name: &str,
        err: &BuildError,
    ) -> Job {
        let mut job = Job::new_terminal(
            JobId::new(self.id_gen.next()),
            request.id.clone(),
            request.backend_id.clone(),
            request.workspace.name.clone(),
            action_name,
            err.status_code(),
            err.message(),
            self.clock,
        );
        job.commit_sha = commit_sha.to_string();
        job
    }

    /// One terminal Job per action `err` implicates — for a cyclic
    /// dependency that is every member of the cycle, not just the
    /// requested root.
    fn terminal_outcome(&self, request: &JobRequest, commit_sha: &str, err: BuildError) -> BuildOutcome {
        let mut new_jobs = Vec::new();
        let mut resolved_job_ids = HashMap::new();
        for action_name in err.actions() {
            let job = self.terminal_job(request, commit_sha, action_name, &err);
            resolved_job_ids.insert(action_name.to_string(), job.id.clone());
            new_jobs.push(job);
        }
        BuildOutcome {
            new_jobs,
            resolved_job_ids,
        }
    }
}

/// Maps a Builder-observed Agent task stage report to the terminal
/// status_code the Controller State Machine assigns on FINALIZED, per the
/// exit-code / unmatched-pattern decision table.
pub fn finalize_status_code(exit_code: Option<i32>, unmatched_patterns_empty: bool) -> StatusCode {
    match exit_code {
        Some(0) if unmatched_patterns_empty => StatusCode::Succeeded,
        Some(0) => StatusCode::UnmatchedPatterns,
        Some(_) => StatusCode::NonzeroExit,
        None => StatusCode::InternalError,
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
