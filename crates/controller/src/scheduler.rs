// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler tick: Pass 1 expands freshly-synced JobRequests into Job
//! rows via the Builder; Pass 2 walks a backend's non-terminal Jobs and
//! applies the Controller State Machine's per-Job decision.

use rap_adapters::Pipeline;
use rap_builder::{BuildOutcome, JobDefinitionBuilder};
use rap_core::{
    BackendFlag, BackendId, Clock, DbStatusDefinition, FlagKey, IdGen, Job, JobId, JobRequest,
    JobState, RequestedAction, StatusCode, Task, TaskDefinition, TaskId, TaskKind, TaskStage,
    UuidIdGen,
};
use rap_engine::{
    db_maintenance_transition, decide_cancellation, dependency_status, evaluate_pending_job,
    is_admissible, reboot_transition, resolve_error_outcome, stage_status_code,
    CancellationAction, ConcurrencyCaps, DependencyStatus, ErrorOutcome, ExecutingCounts,
    PendingEvalContext, PendingOutcome, RebootAction, RetryPolicy,
};
use rap_storage::{FlagRepository, JobRepository, JobRequestRepository, TaskRepository};
use sqlx::SqlitePool;

use crate::error::ControllerError;
use crate::storage_lookup::StoragePriorJobLookup;

pub struct Scheduler<C: Clock> {
    job_repo: JobRepository,
    task_repo: TaskRepository,
    flag_repo: FlagRepository,
    request_repo: JobRequestRepository,
    id_gen: UuidIdGen,
    clock: C,
    retry_policy: RetryPolicy,
    caps: ConcurrencyCaps,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(pool: SqlitePool, clock: C, retry_policy: RetryPolicy, caps: ConcurrencyCaps) -> Self {
        Self {
            job_repo: JobRepository::new(pool.clone()),
            task_repo: TaskRepository::new(pool.clone()),
            flag_repo: FlagRepository::new(pool.clone()),
            request_repo: JobRequestRepository::new(pool),
            id_gen: UuidIdGen,
            clock,
            retry_policy,
            caps,
        }
    }

    /// Pass 1: expands one JobRequest (commit already resolved by the Sync
    /// Loop) against its parsed pipeline into Job rows, deduplicating
    /// against prior Jobs for the same (workspace, action, commit).
    pub async fn intake(
        &self,
        pipeline: &Pipeline,
        request: &JobRequest,
        commit_sha: &str,
    ) -> Result<BuildOutcome, ControllerError> {
        let roots = match &request.requested_action {
            RequestedAction::Named(name) => vec![name.clone()],
            RequestedAction::RunAll => pipeline.action_names(),
        };
        let action_names = rap_builder::transitive_needs(pipeline, &roots)
            .map(|set| set.into_iter().collect::<Vec<_>>())
            .unwrap_or(roots);

        let lookup = StoragePriorJobLookup::prefetch(
            &self.job_repo,
            &request.workspace.name,
            commit_sha,
            &action_names,
        )
        .await?;

        let builder = JobDefinitionBuilder::new(pipeline, &lookup, &self.id_gen, &self.clock);
        let outcome = builder.build(request, commit_sha, &[]);

        for job in &outcome.new_jobs {
            self.job_repo.insert(job).await?;
        }

        Ok(outcome)
    }

    /// Pass 2: evaluates every non-terminal Job on `backend_id` once.
    /// Returns the count of Jobs whose state changed, logged by the caller.
    pub async fn tick(&self, backend_id: &str) -> Result<u32, ControllerError> {
        let jobs = self.job_repo.list_non_terminal_for_backend(backend_id).await?;
        let paused = self.flag_active(backend_id, FlagKey::Paused).await?;
        let in_maintenance = self.flag_active(backend_id, FlagKey::DbMaintenance).await?;
        let reboot_requested = self.flag_active(backend_id, FlagKey::Reboot).await?;
        let counts = self.job_repo.count_executing(backend_id).await?;

        let mut changed = 0u32;
        for mut job in jobs {
            if self
                .evaluate_one(&mut job, paused, in_maintenance, reboot_requested, counts)
                .await?
            {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn flag_active(&self, backend_id: &str, key: FlagKey) -> Result<bool, ControllerError> {
        Ok(self
            .flag_repo
            .get(backend_id, key)
            .await?
            .map(|flag: BackendFlag| flag.is_active())
            .unwrap_or(false))
    }

    async fn evaluate_one(
        &self,
        job: &mut Job,
        paused: bool,
        in_maintenance: bool,
        reboot_requested: bool,
        counts: rap_storage::ExecutingCounts,
    ) -> Result<bool, ControllerError> {
        let request = self.request_repo.get(&job.job_request_id).await?;
        if request.is_cancelled(&job.action_name) {
            return self.apply_cancellation(job).await;
        }

        match job.state {
            JobState::Pending => {
                self.evaluate_pending(job, paused, in_maintenance, reboot_requested, counts)
                    .await
            }
            JobState::Running => self.evaluate_running(job, in_maintenance, reboot_requested).await,
            JobState::Failed | JobState::Succeeded => Ok(false),
        }
    }

    async fn evaluate_pending(
        &self,
        job: &mut Job,
        paused: bool,
        in_maintenance: bool,
        reboot_requested: bool,
        counts: rap_storage::ExecutingCounts,
    ) -> Result<bool, ControllerError> {
        let dep_states = self.dependency_states(job).await?;
        let ctx = PendingEvalContext {
            dep_status: dependency_status(&dep_states),
            paused,
            in_maintenance,
            reboot_requested,
            admissible: is_admissible(
                ExecutingCounts {
                    total: counts.total,
                    db_workers: counts.db_workers,
                },
                self.caps,
                job.is_db_worker,
            ),
            is_db_worker: job.is_db_worker,
        };

        match evaluate_pending_job(ctx) {
            PendingOutcome::SetStatusCode(code) => self.transition(job, code).await,
            PendingOutcome::IssueRunJobTask => self.issue_runjob_task(job).await,
        }
    }

    /// RUNNING Job evaluation: reboot preparation pre-empts DB maintenance,
    /// both drive the Job back to PENDING via a CANCELJOB round-trip rather
    /// than transitioning status_code directly — the RUNJOB task is still
    /// active and must be wound down first.
    async fn evaluate_running(
        &self,
        job: &mut Job,
        in_maintenance: bool,
        reboot_requested: bool,
    ) -> Result<bool, ControllerError> {
        if let RebootAction::IssueCancelJobTask = reboot_transition(job.state, reboot_requested) {
            return self.issue_canceljob_task(job, StatusCode::WaitingOnReboot).await;
        }
        if let Some(code) = db_maintenance_transition(job.status_code, job.is_db_worker, in_maintenance) {
            return self.issue_canceljob_task(job, code).await;
        }
        Ok(false)
    }

    async fn apply_cancellation(&self, job: &mut Job) -> Result<bool, ControllerError> {
        match decide_cancellation(job.state, true) {
            CancellationAction::NoneNeeded => Ok(false),
            CancellationAction::DirectToCancelled => {
                job.cancelled = true;
                self.transition(job, StatusCode::CancelledByUser).await
            }
            CancellationAction::IssueCancelJobTask => {
                job.cancelled = true;
                self.issue_canceljob_task(job, StatusCode::CancelledByUser).await
            }
        }
    }

    /// Applies an Agent-reported stage update to the owning Job, resolving
    /// the non-fatal retry/fail-fast split for ERROR reports.
    ///
    /// DBSTATUS tasks aren't scoped to a Job at all, and CANCELJOB's
    /// FINALIZED report carries no payload (`report=None`) — both are
    /// handled before the generic RUNJOB stage-mapping path below, which
    /// depends on a report being present.
    pub async fn apply_task_update(
        &self,
        task: &Task,
        stage: TaskStage,
    ) -> Result<(), ControllerError> {
        if task.kind() == TaskKind::DbStatus {
            return self.apply_db_status_update(task, stage).await;
        }

        let mut job = self.job_repo.get(&task.job_id).await?;

        if task.kind() == TaskKind::CancelJob {
            if stage == TaskStage::Finalized {
                let code = self.cancel_completion_code(&job, &task.backend_id).await?;
                self.transition(&mut job, code).await?;
            }
            return Ok(());
        }

        if stage == TaskStage::Error {
            match resolve_error_outcome(task.latest_report.as_ref(), job.retry_count, self.retry_policy) {
                ErrorOutcome::RetryJob => {
                    job.retry_count += 1;
                    self.transition(&mut job, StatusCode::WaitingOnNewTask).await?;
                }
                ErrorOutcome::FailJob(code) => {
                    self.transition(&mut job, code).await?;
                }
            }
            return Ok(());
        }

        if let Some(code) = stage_status_code(stage, task.latest_report.as_ref()) {
            if code == StatusCode::Succeeded || code.state() == JobState::Failed {
                job.outputs = task
                    .latest_report
                    .as_ref()
                    .map(|r| r.outputs.clone())
                    .unwrap_or_default();
                job.unmatched_patterns = task
                    .latest_report
                    .as_ref()
                    .map(|r| r.unmatched_patterns.clone())
                    .unwrap_or_default();
            }
            self.transition(&mut job, code).await?;
        }
        Ok(())
    }

    /// A CANCELJOB's completion carries no reason of its own — the Job's
    /// `cancelled` flag and the backend's current reboot flag are what
    /// decide the terminal code, in the same priority order
    /// `evaluate_running`/`apply_cancellation` used to issue it. DB
    /// maintenance is the remaining case once those are ruled out.
    async fn cancel_completion_code(
        &self,
        job: &Job,
        backend_id: &BackendId,
    ) -> Result<StatusCode, ControllerError> {
        if job.cancelled {
            return Ok(StatusCode::CancelledByUser);
        }
        if self.flag_active(backend_id.as_str(), FlagKey::Reboot).await? {
            return Ok(StatusCode::WaitingOnReboot);
        }
        Ok(StatusCode::WaitingDbMaintenance)
    }

    /// Ensures at most one active DBSTATUS task per backend, issuing a
    /// fresh probe once the previous one has completed.
    pub async fn issue_db_status_task(&self, backend_id: &str) -> Result<bool, ControllerError> {
        if self
            .task_repo
            .find_active_by_kind_for_backend(backend_id, TaskKind::DbStatus.to_string().as_str())
            .await?
            .is_some()
        {
            return Ok(false);
        }
        let task = Task::new(
            TaskId::new(self.id_gen.next()),
            backend_id,
            JobId::new(format!("dbstatus-{backend_id}")),
            TaskDefinition::DbStatus(DbStatusDefinition {}),
            self.clock.epoch_ms(),
        );
        self.task_repo.insert(&task).await?;
        Ok(true)
    }

    /// A DBSTATUS probe's FINALIZED report drives the `db-maintenance` flag
    /// automatically (spec: "a periodic DBSTATUS Task is issued per
    /// backend... the result indicates 'in maintenance'"). The probe
    /// reuses the RUNJOB exit-code convention: zero means healthy, nonzero
    /// means the backend is in maintenance.
    async fn apply_db_status_update(&self, task: &Task, stage: TaskStage) -> Result<(), ControllerError> {
        if stage != TaskStage::Finalized {
            return Ok(());
        }
        let in_maintenance = task
            .latest_report
            .as_ref()
            .and_then(|r| r.exit_code)
            .is_some_and(|code| code != 0);
        let value = if in_maintenance { "true" } else { "false" };
        self.flag_repo
            .set(&BackendFlag::new(
                task.backend_id.clone(),
                FlagKey::DbMaintenance,
                value,
                self.clock.epoch_ms(),
            ))
            .await?;
        Ok(())
    }

    async fn dependency_states(&self, job: &Job) -> Result<Vec<JobState>, ControllerError> {
        let mut states = Vec::with_capacity(job.wait_for_job_ids.len());
        for dep_id in &job.wait_for_job_ids {
            states.push(self.job_repo.get(dep_id).await?.state);
        }
        Ok(states)
    }

    async fn transition(&self, job: &mut Job, code: StatusCode) -> Result<bool, ControllerError> {
        job.transition(code, &self.clock);
        self.job_repo.save(job).await?;
        Ok(true)
    }

    async fn issue_runjob_task(&self, job: &mut Job) -> Result<bool, ControllerError> {
        let definition = TaskDefinition::RunJob(rap_core::RunJobDefinition {
            job_id: job.id.clone(),
            commit_sha: job.commit_sha.clone(),
            command: job.run_command.clone(),
            image: job.image.clone(),
            cpu_limit: None,
            memory_limit_mb: None,
            input_actions: job.needs_actions.clone(),
            output_spec: job.output_spec.clone(),
            env: Default::default(),
            labels: Default::default(),
        });
        let task = Task::new(
            TaskId::new(self.id_gen.next()),
            job.backend_id.clone(),
            job.id.clone(),
            definition,
            self.clock.epoch_ms(),
        );
        self.task_repo.insert(&task).await?;
        self.transition(job, StatusCode::Initiated).await
    }

    /// Deactivates the Job's active RUNJOB task and issues a CANCELJOB
    /// referencing it. `fallback` is applied directly when there is no
    /// active RUNJOB to cancel — it must match whatever
    /// `cancel_completion_code` would otherwise resolve to once the
    /// CANCELJOB this call issues eventually reports FINALIZED.
    async fn issue_canceljob_task(&self, job: &mut Job, fallback: StatusCode) -> Result<bool, ControllerError> {
        let Some(active) = self
            .task_repo
            .find_active_for_job(&job.id, TaskKind::RunJob.to_string().as_str())
            .await?
        else {
            return self.transition(job, fallback).await;
        };
        self.task_repo.deactivate(&active.id, self.clock.epoch_ms()).await?;

        let definition = TaskDefinition::CancelJob(rap_core::CancelJobDefinition {
            job_id: job.id.clone(),
            target_task_id: active.id,
        });
        let task = Task::new(
            TaskId::new(self.id_gen.next()),
            job.backend_id.clone(),
            job.id.clone(),
            definition,
            self.clock.epoch_ms(),
        );
        self.task_repo.insert(&task).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
