// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use super::*;
use rap_adapters::PipelineAction;
use rap_core::{
    BackendFlag, FakeClock, JobRequestId, RequestedAction, TaskStageReport, WorkspaceRef,
};
use rap_storage::connect_in_memory;

fn single_action_pipeline() -> Pipeline {
    let mut actions = HashMap::new();
    actions.insert(
        "extract".to_string(),
        PipelineAction {
            name: "extract".to_string(),
            image: "study:1".to_string(),
            command: vec!["python".to_string(), "extract.py".to_string()],
            needs: Vec::new(),
            output_spec: HashMap::new(),
            is_db_worker: false,
        },
    );
    Pipeline { actions }
}

fn db_worker_pipeline() -> Pipeline {
    let mut actions = HashMap::new();
    actions.insert(
        "migrate".to_string(),
        PipelineAction {
            name: "migrate".to_string(),
            image: "study:1".to_string(),
            command: vec!["python".to_string(), "migrate.py".to_string()],
            needs: Vec::new(),
            output_spec: HashMap::new(),
            is_db_worker: true,
        },
    );
    Pipeline { actions }
}

fn request(backend: &str) -> JobRequest {
    request_for(backend, "extract")
}

fn request_for(backend: &str, action_name: &str) -> JobRequest {
    JobRequest::new(
        JobRequestId::new("req-1"),
        backend,
        WorkspaceRef::new("workspace-a", "https://example.test/a.git", "main"),
        RequestedAction::Named(action_name.to_string()),
        None,
        false,
        serde_json::json!({}),
        0,
    )
}

async fn scheduler() -> Scheduler<FakeClock> {
    let pool = connect_in_memory().await.unwrap();
    Scheduler::new(
        pool,
        FakeClock::new(),
        RetryPolicy::default(),
        ConcurrencyCaps {
            workers: 4,
            db_workers: 1,
        },
    )
}

#[tokio::test]
async fn intake_creates_a_job_for_a_single_action_request() {
    let scheduler = scheduler().await;
    let req = request("tpp");
    scheduler.request_repo.insert(&req).await.unwrap();

    let outcome = scheduler
        .intake(&single_action_pipeline(), &req, "commit-1")
        .await
        .unwrap();

    assert_eq!(outcome.new_jobs.len(), 1);
    assert_eq!(outcome.new_jobs[0].action_name, "extract");
    assert_eq!(outcome.new_jobs[0].status_code, StatusCode::Created);
}

#[tokio::test]
async fn tick_issues_a_runjob_task_for_an_admissible_pending_job() {
    let scheduler = scheduler().await;
    let req = request("tpp");
    scheduler.request_repo.insert(&req).await.unwrap();
    scheduler
        .intake(&single_action_pipeline(), &req, "commit-1")
        .await
        .unwrap();

    let changed = scheduler.tick("tpp").await.unwrap();
    assert_eq!(changed, 1);

    let jobs = scheduler.job_repo.list_non_terminal_for_backend("tpp").await.unwrap();
    assert_eq!(jobs[0].status_code, StatusCode::Initiated);

    let tasks = scheduler.task_repo.list_active_for_backend("tpp").await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].kind(), TaskKind::RunJob);
}

#[tokio::test]
async fn tick_holds_pending_job_on_waiting_paused_when_backend_is_paused() {
    let scheduler = scheduler().await;
    let req = request("tpp");
    scheduler.request_repo.insert(&req).await.unwrap();
    scheduler
        .intake(&single_action_pipeline(), &req, "commit-1")
        .await
        .unwrap();
    scheduler
        .flag_repo
        .set(&BackendFlag::new("tpp", FlagKey::Paused, "true", 0))
        .await
        .unwrap();

    scheduler.tick("tpp").await.unwrap();

    let jobs = scheduler.job_repo.list_non_terminal_for_backend("tpp").await.unwrap();
    assert_eq!(jobs[0].status_code, StatusCode::WaitingPaused);
}

#[tokio::test]
async fn apply_task_update_retries_a_retryable_error_then_fails_after_budget() {
    let scheduler = scheduler().await;
    let req = request("tpp");
    scheduler.request_repo.insert(&req).await.unwrap();
    let outcome = scheduler
        .intake(&single_action_pipeline(), &req, "commit-1")
        .await
        .unwrap();
    scheduler.tick("tpp").await.unwrap();

    let job_id = outcome.resolved_job_ids.get("extract").unwrap().clone();
    let report = TaskStageReport {
        exit_code: None,
        outputs: HashMap::new(),
        unmatched_patterns: Vec::new(),
        error_message: Some("executor unreachable".to_string()),
        retryable: true,
    };

    for _ in 0..4 {
        let mut task = scheduler
            .task_repo
            .list_active_for_backend("tpp")
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.job_id == job_id)
            .unwrap();
        task.apply_update(TaskStage::Error, Some(report.clone()), true, 0);
        scheduler.task_repo.save(&task).await.unwrap();
        scheduler.apply_task_update(&task, TaskStage::Error).await.unwrap();
        scheduler.tick("tpp").await.unwrap();
    }

    let job = scheduler.job_repo.get(&job_id).await.unwrap();
    assert_eq!(job.status_code, StatusCode::JobError);
    assert_eq!(job.state, JobState::Failed);
}

#[tokio::test]
async fn apply_task_update_marks_job_succeeded_on_clean_finalize() {
    let scheduler = scheduler().await;
    let req = request("tpp");
    scheduler.request_repo.insert(&req).await.unwrap();
    let outcome = scheduler
        .intake(&single_action_pipeline(), &req, "commit-1")
        .await
        .unwrap();
    scheduler.tick("tpp").await.unwrap();

    let job_id = outcome.resolved_job_ids.get("extract").unwrap().clone();
    let mut task = scheduler
        .task_repo
        .list_active_for_backend("tpp")
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.job_id == job_id)
        .unwrap();

    let report = TaskStageReport {
        exit_code: Some(0),
        outputs: HashMap::new(),
        unmatched_patterns: Vec::new(),
        error_message: None,
        retryable: false,
    };
    task.apply_update(TaskStage::Finalized, Some(report), true, 0);
    scheduler.task_repo.save(&task).await.unwrap();
    scheduler.apply_task_update(&task, TaskStage::Finalized).await.unwrap();

    let job = scheduler.job_repo.get(&job_id).await.unwrap();
    assert_eq!(job.status_code, StatusCode::Succeeded);
}

#[tokio::test]
async fn cancelling_a_pending_job_goes_straight_to_cancelled_by_user() {
    let scheduler = scheduler().await;
    let mut req = request("tpp");
    scheduler.request_repo.insert(&req).await.unwrap();
    scheduler
        .intake(&single_action_pipeline(), &req, "commit-1")
        .await
        .unwrap();
    scheduler
        .request_repo
        .add_cancelled_action(&req.id, "extract")
        .await
        .unwrap();
    req.cancelled_actions.push("extract".to_string());

    scheduler.tick("tpp").await.unwrap();

    let jobs = scheduler.job_repo.list_for_request(&req.id).await.unwrap();
    assert_eq!(jobs[0].status_code, StatusCode::CancelledByUser);
    assert!(jobs[0].cancelled);
}

#[tokio::test]
async fn cancelling_a_running_job_completes_on_canceljob_finalized() {
    let scheduler = scheduler().await;
    let mut req = request("tpp");
    scheduler.request_repo.insert(&req).await.unwrap();
    let outcome = scheduler
        .intake(&single_action_pipeline(), &req, "commit-1")
        .await
        .unwrap();
    scheduler.tick("tpp").await.unwrap();

    let job_id = outcome.resolved_job_ids.get("extract").unwrap().clone();
    let mut run_task = scheduler
        .task_repo
        .list_active_for_backend("tpp")
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.job_id == job_id)
        .unwrap();
    run_task.apply_update(TaskStage::Executing, None, false, 0);
    scheduler.task_repo.save(&run_task).await.unwrap();
    scheduler
        .apply_task_update(&run_task, TaskStage::Executing)
        .await
        .unwrap();

    scheduler
        .request_repo
        .add_cancelled_action(&req.id, "extract")
        .await
        .unwrap();
    req.cancelled_actions.push("extract".to_string());
    scheduler.tick("tpp").await.unwrap();

    let job = scheduler.job_repo.get(&job_id).await.unwrap();
    assert_eq!(job.status_code, StatusCode::Executing);
    assert!(job.cancelled);

    let run_task = scheduler.task_repo.get(&run_task.id).await.unwrap();
    assert!(!run_task.active);

    let cancel_task = scheduler
        .task_repo
        .list_active_for_backend("tpp")
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.kind() == TaskKind::CancelJob)
        .unwrap();

    // The Agent's CANCELJOB completion carries no report payload.
    let mut cancel_task = cancel_task;
    cancel_task.apply_update(TaskStage::Finalized, None, true, 0);
    scheduler.task_repo.save(&cancel_task).await.unwrap();
    scheduler
        .apply_task_update(&cancel_task, TaskStage::Finalized)
        .await
        .unwrap();

    let job = scheduler.job_repo.get(&job_id).await.unwrap();
    assert_eq!(job.status_code, StatusCode::CancelledByUser);
    assert_eq!(job.state, JobState::Failed);
}

#[tokio::test]
async fn db_maintenance_deactivates_the_runjob_task_and_resets_the_job() {
    let scheduler = scheduler().await;
    let req = request_for("tpp", "migrate");
    scheduler.request_repo.insert(&req).await.unwrap();
    let outcome = scheduler
        .intake(&db_worker_pipeline(), &req, "commit-1")
        .await
        .unwrap();
    scheduler.tick("tpp").await.unwrap();

    let job_id = outcome.resolved_job_ids.get("migrate").unwrap().clone();
    let mut run_task = scheduler
        .task_repo
        .list_active_for_backend("tpp")
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.job_id == job_id)
        .unwrap();
    run_task.apply_update(TaskStage::Executing, None, false, 0);
    scheduler.task_repo.save(&run_task).await.unwrap();
    scheduler
        .apply_task_update(&run_task, TaskStage::Executing)
        .await
        .unwrap();

    scheduler
        .flag_repo
        .set(&BackendFlag::new("tpp", FlagKey::DbMaintenance, "paused-for-backup", 0))
        .await
        .unwrap();

    scheduler.tick("tpp").await.unwrap();

    let job = scheduler.job_repo.get(&job_id).await.unwrap();
    assert_eq!(job.status_code, StatusCode::WaitingDbMaintenance);
    assert_eq!(job.state, JobState::Pending);

    let run_task = scheduler.task_repo.get(&run_task.id).await.unwrap();
    assert!(!run_task.active);

    let cancel_task = scheduler
        .task_repo
        .list_active_for_backend("tpp")
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.kind() == TaskKind::CancelJob)
        .unwrap();

    let mut cancel_task = cancel_task;
    cancel_task.apply_update(TaskStage::Finalized, None, true, 0);
    scheduler.task_repo.save(&cancel_task).await.unwrap();
    scheduler
        .apply_task_update(&cancel_task, TaskStage::Finalized)
        .await
        .unwrap();

    let job = scheduler.job_repo.get(&job_id).await.unwrap();
    assert_eq!(job.status_code, StatusCode::WaitingDbMaintenance);
}

#[tokio::test]
async fn non_db_worker_is_unaffected_by_maintenance_flag() {
    let scheduler = scheduler().await;
    let req = request("tpp");
    scheduler.request_repo.insert(&req).await.unwrap();
    let outcome = scheduler
        .intake(&single_action_pipeline(), &req, "commit-1")
        .await
        .unwrap();
    scheduler.tick("tpp").await.unwrap();

    let job_id = outcome.resolved_job_ids.get("extract").unwrap().clone();
    let mut run_task = scheduler
        .task_repo
        .list_active_for_backend("tpp")
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.job_id == job_id)
        .unwrap();
    run_task.apply_update(TaskStage::Executing, None, false, 0);
    scheduler.task_repo.save(&run_task).await.unwrap();
    scheduler
        .apply_task_update(&run_task, TaskStage::Executing)
        .await
        .unwrap();

    scheduler
        .flag_repo
        .set(&BackendFlag::new("tpp", FlagKey::DbMaintenance, "paused-for-backup", 0))
        .await
        .unwrap();
    scheduler.tick("tpp").await.unwrap();

    let job = scheduler.job_repo.get(&job_id).await.unwrap();
    assert_eq!(job.status_code, StatusCode::Executing);
    let run_task = scheduler.task_repo.get(&run_task.id).await.unwrap();
    assert!(run_task.active);
}

#[tokio::test]
async fn issue_db_status_task_is_idempotent_while_one_is_active() {
    let scheduler = scheduler().await;

    let issued_first = scheduler.issue_db_status_task("tpp").await.unwrap();
    let issued_second = scheduler.issue_db_status_task("tpp").await.unwrap();

    assert!(issued_first);
    assert!(!issued_second);
    let tasks = scheduler.task_repo.list_active_for_backend("tpp").await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].kind(), TaskKind::DbStatus);
}

#[tokio::test]
async fn db_status_finalized_report_drives_the_maintenance_flag() {
    let scheduler = scheduler().await;
    scheduler.issue_db_status_task("tpp").await.unwrap();
    let mut task = scheduler
        .task_repo
        .list_active_for_backend("tpp")
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.kind() == TaskKind::DbStatus)
        .unwrap();

    let report = TaskStageReport {
        exit_code: Some(1),
        ..Default::default()
    };
    task.apply_update(TaskStage::Finalized, Some(report), true, 0);
    scheduler.task_repo.save(&task).await.unwrap();
    scheduler.apply_task_update(&task, TaskStage::Finalized).await.unwrap();

    let flag = scheduler.flag_repo.get("tpp", FlagKey::DbMaintenance).await.unwrap();
    assert!(flag.unwrap().is_active());

    let reissued = scheduler.issue_db_status_task("tpp").await.unwrap();
    assert!(reissued);
}
