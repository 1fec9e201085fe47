// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn construction_only_builds_an_http_client_and_does_not_validate_the_url() {
    // Mirrors the job-server client: building a `HttpTaskApiClient` never
    // touches the network, so an empty base URL is not itself an error.
    let client = HttpTaskApiClient::new("", BackendId::new("tpp"), "token");
    assert!(client.is_ok());
}

#[test]
fn task_update_body_serializes_with_a_null_report_when_absent() {
    let task_id = TaskId::new("task-1");
    let body = TaskUpdateBody {
        task_id: &task_id,
        stage: TaskStage::Prepared,
        report: None,
        agent_complete: false,
    };

    let encoded = serde_json::to_value(&body).unwrap();
    assert_eq!(encoded["stage"], "PREPARED");
    assert!(encoded["report"].is_null());
    assert_eq!(encoded["agent_complete"], false);
}
