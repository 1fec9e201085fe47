// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use rap_core::{JobId, RunJobDefinition};

use super::super::fake::FakeExecutorAdapter;
use super::*;

fn sample_def(job_id: &str) -> RunJobDefinition {
    RunJobDefinition {
        job_id: JobId::new(job_id),
        commit_sha: "abc123".to_string(),
        command: vec!["run.py".to_string()],
        image: "study:1".to_string(),
        cpu_limit: None,
        memory_limit_mb: None,
        input_actions: vec![],
        output_spec: HashMap::new(),
        env: HashMap::new(),
        labels: HashMap::new(),
    }
}

#[tokio::test]
async fn traced_wrapper_delegates_prepare_to_inner_adapter() {
    let fake = FakeExecutorAdapter::new();
    let traced = TracedExecutor::new(fake.clone());
    let def = sample_def("job-1");

    traced.prepare(&def).await.unwrap();

    assert_eq!(fake.calls().len(), 1);
}

#[tokio::test]
async fn traced_wrapper_propagates_errors_from_inner_adapter() {
    let fake = FakeExecutorAdapter::new();
    let def = sample_def("job-1");
    fake.fail_execute(&def.job_id);
    let traced = TracedExecutor::new(fake);

    let err = traced.execute(&def).await.unwrap_err();
    assert!(matches!(err, ExecutorError::ExecuteFailed(_)));
}
