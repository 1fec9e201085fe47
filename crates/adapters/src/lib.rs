// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters: the narrow, swappable interfaces between the RAP orchestrator's
//! core logic and the outside world — the container engine, the job-server,
//! git, and the `project.yaml` pipeline format.

pub mod executor;
pub mod jobserver;
pub mod output_matcher;
pub mod pipeline_source;
pub mod redaction;
pub mod repo_fetcher;

pub use executor::{
    ExecutorAdapter, ExecutorError, ExecutorStatus, ExecutorStatusReport, FinalizeResult,
};
pub use jobserver::{JobRequestPayload, JobServerClient, JobServerError, JobStatusPayload};
pub use output_matcher::{resolve_outputs, OutputMatchError};
pub use pipeline_source::{parse_pipeline, Pipeline, PipelineAction, PipelineParseError};
pub use redaction::Redactor;
pub use repo_fetcher::{GitRepoFetcher, RepoFetchError};

#[cfg(any(test, feature = "test-support"))]
pub use executor::{ExecutorCall, FakeExecutorAdapter};
