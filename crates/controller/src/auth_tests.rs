// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::http::HeaderValue;
use std::path::PathBuf;
use std::time::Duration;

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
        concurrency_caps: rap_engine::ConcurrencyCaps {
            workers: 4,
            db_workers: 1,
        },
        backend_tokens: vec![(rap_core::BackendId::new("tpp"), "tpp-secret".to_string())],
        rap_api_tokens: vec!["client-secret".to_string()],
    }
}

fn headers_with_bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

#[test]
fn authenticate_backend_accepts_the_matching_token() {
    let config = test_config();
    assert!(authenticate_backend(&config, &headers_with_bearer("tpp-secret"), "tpp").is_ok());
}

#[test]
fn authenticate_backend_rejects_a_mismatched_token() {
    let config = test_config();
    let err = authenticate_backend(&config, &headers_with_bearer("wrong"), "tpp").unwrap_err();
    assert!(matches!(err, ControllerError::Forbidden(_)));
}

#[test]
fn authenticate_backend_rejects_an_unknown_backend() {
    let config = test_config();
    let err = authenticate_backend(&config, &headers_with_bearer("tpp-secret"), "emis").unwrap_err();
    assert!(matches!(err, ControllerError::UnknownBackend(_)));
}

#[test]
fn authenticate_backend_rejects_a_missing_header() {
    let config = test_config();
    let err = authenticate_backend(&config, &HeaderMap::new(), "tpp").unwrap_err();
    assert!(matches!(err, ControllerError::Unauthorized));
}

#[test]
fn authenticate_client_accepts_a_configured_client_token() {
    let config = test_config();
    assert!(authenticate_client(&config, &headers_with_bearer("client-secret")).is_ok());
}

#[test]
fn authenticate_client_rejects_a_backend_token() {
    let config = test_config();
    let err = authenticate_client(&config, &headers_with_bearer("tpp-secret")).unwrap_err();
    assert!(matches!(err, ControllerError::Unauthorized));
}
