// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Task Runner: the same cooperative single-loop structure as the
//! Controller's scheduler tick, but per-backend and talking to the
//! Controller's Task API instead of the database. Every tick lists active
//! Tasks and advances each one exactly one step along its
//! prepare/execute/finalize lifecycle, reporting the new stage back.

use rap_adapters::{ExecutorAdapter, ExecutorStatus};
use rap_core::{
    CancelJobDefinition, RunJobDefinition, Task, TaskDefinition, TaskStage, TaskStageReport,
};

use crate::client::TaskApi;
use crate::error::AgentError;

pub struct TaskRunner<C: TaskApi, E: ExecutorAdapter> {
    client: C,
    executor: E,
}

impl<C: TaskApi, E: ExecutorAdapter> TaskRunner<C, E> {
    pub fn new(client: C, executor: E) -> Self {
        Self { client, executor }
    }

    /// One loop iteration: list active tasks, advance each one step. A
    /// failure driving one task is logged and does not stop the others.
    pub async fn run_once(&self) -> Result<(), AgentError> {
        let tasks = self.client.list_tasks().await?;
        for task in &tasks {
            if let Err(err) = self.drive(task).await {
                tracing::error!(task_id = %task.id, error = %err, "task step failed");
            }
        }
        Ok(())
    }

    async fn drive(&self, task: &Task) -> Result<(), AgentError> {
        match &task.definition {
            TaskDefinition::RunJob(def) => self.drive_run_job(task, def).await,
            TaskDefinition::CancelJob(def) => self.drive_cancel_job(task, def).await,
            TaskDefinition::DbStatus(_) => self.drive_db_status(task).await,
        }
    }

    async fn drive_run_job(&self, task: &Task, def: &RunJobDefinition) -> Result<(), AgentError> {
        match task.stage {
            TaskStage::Unknown => match self.executor.prepare(def).await {
                Ok(()) => self.report(task, TaskStage::Prepared, None, false).await,
                Err(err) => self.report_error(task, &err, true).await,
            },
            TaskStage::Prepared => match self.executor.execute(def).await {
                Ok(()) => self.report(task, TaskStage::Executing, None, false).await,
                Err(err) => self.report_error(task, &err, true).await,
            },
            TaskStage::Executing => {
                let status = self.executor.get_status(&def.job_id).await?;
                match status.status {
                    Some(ExecutorStatus::Executed) => {
                        let report = TaskStageReport {
                            exit_code: status.exit_code,
                            ..Default::default()
                        };
                        self.report(task, TaskStage::Executed, Some(report), false).await
                    }
                    Some(ExecutorStatus::Error) => {
                        let report = TaskStageReport {
                            exit_code: status.exit_code,
                            error_message: Some("container exited in an error state".to_string()),
                            retryable: false,
                            ..Default::default()
                        };
                        self.report(task, TaskStage::Error, Some(report), true).await
                    }
                    _ => Ok(()),
                }
            }
            TaskStage::Executed => {
                let result = self.executor.finalize(def, false).await?;
                let report = TaskStageReport {
                    exit_code: task.latest_report.as_ref().and_then(|r| r.exit_code),
                    outputs: result.outputs,
                    unmatched_patterns: result.unmatched_patterns,
                    ..Default::default()
                };
                self.report(task, TaskStage::Finalized, Some(report), true).await?;
                if let Err(err) = self.executor.cleanup(&def.job_id).await {
                    tracing::warn!(job_id = %def.job_id, error = %err, "cleanup after finalize failed");
                }
                Ok(())
            }
            TaskStage::Finalized | TaskStage::Error => Ok(()),
        }
    }

    async fn drive_cancel_job(&self, task: &Task, def: &CancelJobDefinition) -> Result<(), AgentError> {
        if task.agent_complete {
            return Ok(());
        }
        if let Err(err) = self.executor.terminate(&def.job_id).await {
            tracing::warn!(job_id = %def.job_id, error = %err, "terminate during cancel failed");
        }
        self.report(task, TaskStage::Finalized, None, true).await
    }

    async fn drive_db_status(&self, task: &Task) -> Result<(), AgentError> {
        if task.agent_complete {
            return Ok(());
        }
        let report = TaskStageReport {
            exit_code: Some(0),
            ..Default::default()
        };
        self.report(task, TaskStage::Finalized, Some(report), true).await
    }

    async fn report(
        &self,
        task: &Task,
        stage: TaskStage,
        report: Option<TaskStageReport>,
        agent_complete: bool,
    ) -> Result<(), AgentError> {
        self.client
            .update_task(&task.id, stage, report, agent_complete)
            .await
    }

    async fn report_error(
        &self,
        task: &Task,
        err: &rap_adapters::ExecutorError,
        retryable: bool,
    ) -> Result<(), AgentError> {
        let report = TaskStageReport {
            error_message: Some(err.to_string()),
            retryable,
            ..Default::default()
        };
        self.report(task, TaskStage::Error, Some(report), true).await
    }
}

#[cfg(test)]
#[path = "task_runner_tests.rs"]
mod tests;
