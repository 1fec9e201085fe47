// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::pool::connect_in_memory;
use serde_json::json;

fn sample_request() -> JobRequest {
    JobRequest::new(
        JobRequestId::new("req-1"),
        "tpp",
        WorkspaceRef::new("my-study", "https://example.test/study.git", "main"),
        RequestedAction::Named("run_model".into()),
        Some("default".into()),
        false,
        json!({"action": "run_model"}),
        1_000,
    )
}

#[tokio::test]
async fn insert_and_get_round_trips() {
    let pool = connect_in_memory().await.unwrap();
    let repo = JobRequestRepository::new(pool);
    let request = sample_request();
    repo.insert(&request).await.unwrap();

    let loaded = repo.get(&request.id).await.unwrap();
    assert_eq!(loaded, request);
}

#[tokio::test]
async fn add_cancelled_action_is_idempotent() {
    let pool = connect_in_memory().await.unwrap();
    let repo = JobRequestRepository::new(pool);
    let request = sample_request();
    repo.insert(&request).await.unwrap();

    repo.add_cancelled_action(&request.id, "run_model").await.unwrap();
    repo.add_cancelled_action(&request.id, "run_model").await.unwrap();

    let loaded = repo.get(&request.id).await.unwrap();
    assert_eq!(loaded.cancelled_actions, vec!["run_model".to_string()]);
}

#[tokio::test]
async fn list_for_backend_orders_by_creation() {
    let pool = connect_in_memory().await.unwrap();
    let repo = JobRequestRepository::new(pool);
    let mut first = sample_request();
    first.id = JobRequestId::new("req-1");
    first.created_at_ms = 1;
    let mut second = sample_request();
    second.id = JobRequestId::new("req-2");
    second.created_at_ms = 2;

    repo.insert(&second).await.unwrap();
    repo.insert(&first).await.unwrap();

    let listed = repo.list_for_backend("tpp").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
}
