// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rap_adapters::FakeExecutorAdapter;
use rap_core::{
    BackendId, CancelJobDefinition, JobId, RunJobDefinition, Task, TaskDefinition, TaskId,
    TaskStage,
};

use super::*;

#[derive(Default)]
struct FakeTaskApiState {
    task: Option<Task>,
    updates: Vec<(TaskId, TaskStage, Option<TaskStageReport>, bool)>,
}

#[derive(Clone, Default)]
struct FakeTaskApi {
    inner: Arc<Mutex<FakeTaskApiState>>,
}

impl FakeTaskApi {
    fn with_task(task: Task) -> Self {
        let api = Self::default();
        api.inner.lock().unwrap().task = Some(task);
        api
    }

    fn updates(&self) -> Vec<(TaskId, TaskStage, Option<TaskStageReport>, bool)> {
        self.inner.lock().unwrap().updates.clone()
    }
}

#[async_trait]
impl TaskApi for FakeTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, AgentError> {
        Ok(self.inner.lock().unwrap().task.clone().into_iter().collect())
    }

    async fn update_task(
        &self,
        task_id: &TaskId,
        stage: TaskStage,
        report: Option<TaskStageReport>,
        agent_complete: bool,
    ) -> Result<(), AgentError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .updates
            .push((task_id.clone(), stage, report.clone(), agent_complete));
        if let Some(task) = inner.task.as_mut() {
            if &task.id == task_id {
                task.apply_update(stage, report, agent_complete, 0);
            }
        }
        Ok(())
    }
}

fn run_job_task(stage: TaskStage) -> Task {
    let mut task = Task::new(
        TaskId::new("task-1"),
        BackendId::new("tpp"),
        JobId::new("job-1"),
        TaskDefinition::RunJob(RunJobDefinition {
            job_id: JobId::new("job-1"),
            commit_sha: "commit-1".to_string(),
            command: vec!["python".to_string(), "main.py".to_string()],
            image: "study:1".to_string(),
            cpu_limit: None,
            memory_limit_mb: None,
            input_actions: Vec::new(),
            output_spec: HashMap::new(),
            env: HashMap::new(),
            labels: HashMap::new(),
        }),
        0,
    );
    task.stage = stage;
    task
}

#[tokio::test]
async fn run_job_advances_one_stage_per_tick_through_to_finalized() {
    let client = FakeTaskApi::with_task(run_job_task(TaskStage::Unknown));
    let executor = FakeExecutorAdapter::new();
    let runner = TaskRunner::new(client.clone(), executor.clone());

    runner.run_once().await.unwrap(); // Unknown -> prepare -> Prepared
    assert_eq!(client.updates().last().unwrap().1, TaskStage::Prepared);

    runner.run_once().await.unwrap(); // Prepared -> execute -> Executing
    assert_eq!(client.updates().last().unwrap().1, TaskStage::Executing);

    executor.set_exit_code(&JobId::new("job-1"), 0);
    runner.run_once().await.unwrap(); // Executing -> get_status -> Executed
    assert_eq!(client.updates().last().unwrap().1, TaskStage::Executed);

    runner.run_once().await.unwrap(); // Executed -> finalize -> Finalized
    let (_, stage, report, agent_complete) = client.updates().last().unwrap().clone();
    assert_eq!(stage, TaskStage::Finalized);
    assert!(agent_complete);
    assert!(report.is_some());

    let calls = executor.calls();
    assert!(matches!(calls.last().unwrap(), rap_adapters::ExecutorCall::Cleanup { .. }));
}

#[tokio::test]
async fn run_job_reports_error_when_prepare_fails() {
    let client = FakeTaskApi::with_task(run_job_task(TaskStage::Unknown));
    let executor = FakeExecutorAdapter::new();
    executor.fail_prepare(&JobId::new("job-1"));
    let runner = TaskRunner::new(client.clone(), executor);

    runner.run_once().await.unwrap();

    let (_, stage, report, agent_complete) = client.updates().last().unwrap().clone();
    assert_eq!(stage, TaskStage::Error);
    assert!(agent_complete);
    assert!(report.unwrap().retryable);
}

#[tokio::test]
async fn run_job_does_nothing_while_still_executing() {
    let client = FakeTaskApi::with_task(run_job_task(TaskStage::Executing));
    let executor = FakeExecutorAdapter::new();
    let runner = TaskRunner::new(client.clone(), executor);

    runner.run_once().await.unwrap();

    assert!(client.updates().is_empty());
}

#[tokio::test]
async fn cancel_job_terminates_the_target_job_and_reports_finalized() {
    let mut task = Task::new(
        TaskId::new("task-2"),
        BackendId::new("tpp"),
        JobId::new("job-1"),
        TaskDefinition::CancelJob(CancelJobDefinition {
            job_id: JobId::new("job-1"),
            target_task_id: TaskId::new("task-1"),
        }),
        0,
    );
    task.stage = TaskStage::Unknown;
    let client = FakeTaskApi::with_task(task);
    let executor = FakeExecutorAdapter::new();
    let runner = TaskRunner::new(client.clone(), executor.clone());

    runner.run_once().await.unwrap();

    let (_, stage, _, agent_complete) = client.updates().last().unwrap().clone();
    assert_eq!(stage, TaskStage::Finalized);
    assert!(agent_complete);
    assert!(executor
        .calls()
        .iter()
        .any(|c| matches!(c, rap_adapters::ExecutorCall::Terminate { .. })));
}

#[tokio::test]
async fn db_status_completes_immediately_with_no_executor_calls() {
    let task = Task::new(
        TaskId::new("task-3"),
        BackendId::new("tpp"),
        JobId::new("job-2"),
        TaskDefinition::DbStatus(rap_core::DbStatusDefinition {}),
        0,
    );
    let client = FakeTaskApi::with_task(task);
    let executor = FakeExecutorAdapter::new();
    let runner = TaskRunner::new(client.clone(), executor.clone());

    runner.run_once().await.unwrap();

    let (_, stage, _, agent_complete) = client.updates().last().unwrap().clone();
    assert_eq!(stage, TaskStage::Finalized);
    assert!(agent_complete);
    assert!(executor.calls().is_empty());
}
