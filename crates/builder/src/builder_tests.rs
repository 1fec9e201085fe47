// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use rap_adapters::{Pipeline, PipelineAction};
use rap_core::{
    FakeClock, JobId, JobRequest, JobRequestId, JobState, RequestedAction, SequentialIdGen,
    StatusCode, WorkspaceRef,
};

use super::*;
use crate::prior::fake::FakePriorJobLookup;
use crate::prior::PriorJob;

fn action(name: &str, needs: &[&str]) -> PipelineAction {
    PipelineAction {
        name: name.to_string(),
        image: "image:1".to_string(),
        command: vec!["run.py".to_string()],
        needs: needs.iter().map(|s| s.to_string()).collect(),
        output_spec: HashMap::new(),
        is_db_worker: false,
    }
}

fn pipeline(actions: Vec<PipelineAction>) -> Pipeline {
    Pipeline {
        actions: actions.into_iter().map(|a| (a.name.clone(), a)).collect(),
    }
}

fn request(action_name: &str) -> JobRequest {
    JobRequest::new(
        JobRequestId::new("req-1"),
        "tpp",
        WorkspaceRef {
            name: "my-study".to_string(),
            repo_url: "https://example.test/my-study.git".to_string(),
            branch: "main".to_string(),
        },
        RequestedAction::Named(action_name.to_string()),
        None,
        false,
        serde_json::json!({}),
        0,
    )
}

#[test]
fn simple_success_creates_two_jobs_with_dependency_wired() {
    let p = pipeline(vec![
        action("extract_data", &[]),
        action("run_model", &["extract_data"]),
    ]);
    let prior = FakePriorJobLookup::new();
    let ids = SequentialIdGen::new("job");
    let clock = FakeClock::new();
    let builder = JobDefinitionBuilder::new(&p, &prior, &ids, &clock);

    let outcome = builder.build(&request("run_model"), "abc123", &[]);

    assert_eq!(outcome.new_jobs.len(), 2);
    let model_job = outcome
        .new_jobs
        .iter()
        .find(|j| j.action_name == "run_model")
        .unwrap();
    let extract_id = outcome.resolved_job_ids.get("extract_data").unwrap();
    assert_eq!(model_job.wait_for_job_ids, vec![extract_id.clone()]);
    assert_eq!(model_job.status_code, StatusCode::Created);
}

#[test]
fn succeeded_prior_job_is_skipped_and_not_recreated() {
    let p = pipeline(vec![action("extract_data", &[])]);
    let mut prior = FakePriorJobLookup::new();
    prior.insert(
        "my-study",
        "extract_data",
        "abc123",
        PriorJob {
            job_id: JobId::new("prior-job"),
            state: JobState::Succeeded,
            retryable_failure: false,
        },
    );
    let ids = SequentialIdGen::new("job");
    let clock = FakeClock::new();
    let builder = JobDefinitionBuilder::new(&p, &prior, &ids, &clock);

    let outcome = builder.build(&request("extract_data"), "abc123", &[]);

    assert!(outcome.new_jobs.is_empty());
    assert_eq!(
        outcome.resolved_job_ids.get("extract_data"),
        Some(&JobId::new("prior-job"))
    );
}

#[test]
fn missing_action_produces_a_single_terminal_job() {
    let p = pipeline(vec![action("extract_data", &[])]);
    let prior = FakePriorJobLookup::new();
    let ids = SequentialIdGen::new("job");
    let clock = FakeClock::new();
    let builder = JobDefinitionBuilder::new(&p, &prior, &ids, &clock);

    let outcome = builder.build(&request("does_not_exist"), "abc123", &[]);

    assert_eq!(outcome.new_jobs.len(), 1);
    assert_eq!(outcome.new_jobs[0].status_code, StatusCode::InvalidPipeline);
    assert!(outcome.new_jobs[0].is_terminal());
}

#[test]
fn cyclic_dependency_produces_terminal_jobs_with_invalid_pipeline() {
    let p = pipeline(vec![action("a", &["b"]), action("b", &["a"])]);
    let prior = FakePriorJobLookup::new();
    let ids = SequentialIdGen::new("job");
    let clock = FakeClock::new();
    let builder = JobDefinitionBuilder::new(&p, &prior, &ids, &clock);

    let outcome = builder.build(&request("a"), "abc123", &[]);

    assert_eq!(outcome.new_jobs.len(), 2);
    assert!(outcome.new_jobs.iter().all(|j| j.status_code == StatusCode::InvalidPipeline));
    let names: std::collections::HashSet<_> =
        outcome.new_jobs.iter().map(|j| j.action_name.as_str()).collect();
    assert_eq!(names, std::collections::HashSet::from(["a", "b"]));
    assert_eq!(outcome.resolved_job_ids.len(), 2);
}

#[test]
fn cyclic_dependency_blocks_every_action_stuck_behind_it() {
    let p = pipeline(vec![
        action("a", &["b"]),
        action("b", &["a"]),
        action("c", &["a"]),
    ]);
    let prior = FakePriorJobLookup::new();
    let ids = SequentialIdGen::new("job");
    let clock = FakeClock::new();
    let builder = JobDefinitionBuilder::new(&p, &prior, &ids, &clock);

    let outcome = builder.build(&request("c"), "abc123", &[]);

    // `c` never reaches zero in-degree either, since its sole dependency
    // `a` never resolves — it gets a terminal Job alongside the cycle.
    let names: std::collections::HashSet<_> =
        outcome.new_jobs.iter().map(|j| j.action_name.as_str()).collect();
    assert_eq!(names, std::collections::HashSet::from(["a", "b", "c"]));
}

#[test]
fn stale_codelists_marks_just_that_action_terminal() {
    let p = pipeline(vec![
        action("extract_data", &[]),
        action("run_model", &["extract_data"]),
    ]);
    let prior = FakePriorJobLookup::new();
    let ids = SequentialIdGen::new("job");
    let clock = FakeClock::new();
    let builder = JobDefinitionBuilder::new(&p, &prior, &ids, &clock);

    let outcome = builder.build(
        &request("run_model"),
        "abc123",
        &["extract_data".to_string()],
    );

    let extract_job = outcome
        .new_jobs
        .iter()
        .find(|j| j.action_name == "extract_data")
        .unwrap();
    assert_eq!(extract_job.status_code, StatusCode::StaleCodelists);

    let model_job = outcome
        .new_jobs
        .iter()
        .find(|j| j.action_name == "run_model")
        .unwrap();
    assert_eq!(model_job.wait_for_job_ids, vec![extract_job.id.clone()]);
}

#[test]
fn force_run_recreates_even_a_succeeded_prior_job() {
    let p = pipeline(vec![action("extract_data", &[])]);
    let mut prior = FakePriorJobLookup::new();
    prior.insert(
        "my-study",
        "extract_data",
        "abc123",
        PriorJob {
            job_id: JobId::new("prior-job"),
            state: JobState::Succeeded,
            retryable_failure: false,
        },
    );
    let ids = SequentialIdGen::new("job");
    let clock = FakeClock::new();
    let builder = JobDefinitionBuilder::new(&p, &prior, &ids, &clock);

    let mut req = request("extract_data");
    req.force_run = true;

    let outcome = builder.build(&req, "abc123", &[]);
    assert_eq!(outcome.new_jobs.len(), 1);
    assert_ne!(outcome.new_jobs[0].id, JobId::new("prior-job"));
}
