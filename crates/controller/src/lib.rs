// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RAP Controller: the central scheduler, task database, and HTTP API
//! for distributed job orchestration. Ties `rap-engine`'s pure decision
//! functions to `rap-storage`'s persistence and `rap-adapters`' external
//! collaborators (job-server, git, pipeline parsing).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod auth;
pub mod config;
pub mod error;
pub mod rap_api;
pub mod scheduler;
pub mod storage_lookup;
pub mod supervisor;
pub mod sync_loop;
pub mod task_api;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use rap_adapters::GitRepoFetcher;
use rap_core::SystemClock;
use rap_storage::{FlagRepository, JobRepository, JobRequestRepository, TaskRepository};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::scheduler::Scheduler;

/// Shared state for every HTTP handler: cheap to clone (an `Arc` around the
/// scheduler, plain clones of the repository structs around a pooled
/// connection), so it drops in directly as `axum`'s `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub scheduler: Arc<Scheduler<SystemClock>>,
    pub repo_fetcher: GitRepoFetcher,
    pub job_repo: JobRepository,
    pub task_repo: TaskRepository,
    pub flag_repo: FlagRepository,
    pub request_repo: JobRequestRepository,
    pub clock: SystemClock,
}

/// Builds the combined Task API + RAP API router, with request tracing
/// matching the teacher's `tower-http` instrumentation.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/:backend/tasks/", get(task_api::list_tasks))
        .route("/:backend/task/update/", post(task_api::update_task))
        .route("/rap/create/", post(rap_api::create_job_request))
        .route("/rap/cancel/", post(rap_api::cancel_job_request))
        .route("/rap/status/", get(rap_api::job_request_status))
        .route("/backend/status/", get(rap_api::backend_status))
        .route("/backend/flag/", post(rap_api::set_backend_flag))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
