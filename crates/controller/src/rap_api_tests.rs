// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue};
use rap_adapters::GitRepoFetcher;
use rap_core::{
    BackendFlag, BackendId, FlagKey, IdGen, JobRequest, JobRequestId, RequestedAction, SystemClock,
    UuidIdGen, WorkspaceRef,
};
use rap_engine::{ConcurrencyCaps, RetryPolicy};
use rap_storage::{connect_in_memory, FlagRepository, JobRepository, JobRequestRepository, TaskRepository};

use super::*;
use crate::config::Config;
use crate::scheduler::Scheduler;

fn test_config() -> Config {
    Config {
        db_path: PathBuf::from("/tmp/rap-test.sqlite3"),
        http_addr: "0.0.0.0:8080".to_string(),
        log_path: None,
        tick_interval: Duration::from_secs(5),
        sync_interval: Duration::from_secs(30),
        job_server_base_url: "https://jobs.example.test".to_string(),
        job_server_token: String::new(),
        max_task_retries: 3,
        concurrency_caps: ConcurrencyCaps { workers: 4, db_workers: 1 },
        backend_tokens: vec![(BackendId::new("tpp"), "tpp-secret".to_string())],
        rap_api_tokens: vec!["client-secret".to_string()],
    }
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

async fn state() -> AppState {
    let pool = connect_in_memory().await.unwrap();
    let clock = SystemClock;
    let scheduler = Arc::new(Scheduler::new(
        pool.clone(),
        clock.clone(),
        RetryPolicy::default(),
        ConcurrencyCaps { workers: 4, db_workers: 1 },
    ));
    AppState {
        config: Arc::new(test_config()),
        scheduler,
        repo_fetcher: GitRepoFetcher::new(std::env::temp_dir(), None),
        job_repo: JobRepository::new(pool.clone()),
        task_repo: TaskRepository::new(pool.clone()),
        flag_repo: FlagRepository::new(pool.clone()),
        request_repo: JobRequestRepository::new(pool),
        clock,
    }
}

#[tokio::test]
async fn cancel_job_request_records_the_action_on_the_owning_request() {
    let state = state().await;
    let request = JobRequest::new(
        JobRequestId::new(UuidIdGen.next()),
        "tpp",
        WorkspaceRef::new("workspace-a", "https://example.test/a.git", "main"),
        RequestedAction::RunAll,
        None,
        false,
        serde_json::json!({}),
        0,
    );
    state.request_repo.insert(&request).await.unwrap();

    let body = CancelRequest {
        job_request_id: request.id.as_str().to_string(),
        action_name: "extract".to_string(),
    };
    cancel_job_request(State(state.clone()), bearer("client-secret"), axum::Json(body))
        .await
        .unwrap();

    let stored = state.request_repo.get(&request.id).await.unwrap();
    assert!(stored.is_cancelled("extract"));
}

#[tokio::test]
async fn cancel_job_request_rejects_a_backend_token() {
    let state = state().await;
    let body = CancelRequest {
        job_request_id: "req-1".to_string(),
        action_name: "extract".to_string(),
    };
    let err = cancel_job_request(State(state), bearer("tpp-secret"), axum::Json(body))
        .await
        .unwrap_err();
    assert!(matches!(err, ControllerError::Unauthorized));
}

#[tokio::test]
async fn job_request_status_returns_every_job_for_the_request() {
    let state = state().await;
    let request = JobRequest::new(
        JobRequestId::new("req-1"),
        "tpp",
        WorkspaceRef::new("workspace-a", "https://example.test/a.git", "main"),
        RequestedAction::Named("extract".to_string()),
        None,
        false,
        serde_json::json!({}),
        0,
    );
    state.request_repo.insert(&request).await.unwrap();

    let query = Query(StatusQuery {
        job_request_id: "req-1".to_string(),
    });
    let jobs = job_request_status(State(state), bearer("client-secret"), query)
        .await
        .unwrap();
    assert!(jobs.0.is_empty());
}

#[tokio::test]
async fn backend_status_reports_active_flags_and_executing_counts() {
    let state = state().await;
    state
        .flag_repo
        .set(&BackendFlag::new("tpp", FlagKey::Paused, "true", 0))
        .await
        .unwrap();

    let query = Query(BackendStatusQuery { backend: "tpp".to_string() });
    let response = backend_status(State(state), bearer("client-secret"), query)
        .await
        .unwrap();

    assert_eq!(response.0.flags.len(), 1);
    assert_eq!(response.0.executing, 0);
}

#[tokio::test]
async fn set_backend_flag_persists_an_operator_write() {
    let state = state().await;
    let body = SetFlagRequest {
        backend: "tpp".to_string(),
        key: FlagKey::Paused,
        value: "true".to_string(),
    };
    set_backend_flag(State(state.clone()), bearer("tpp-secret"), axum::Json(body))
        .await
        .unwrap();

    let flag = state.flag_repo.get("tpp", FlagKey::Paused).await.unwrap();
    assert!(flag.unwrap().is_active());
}
