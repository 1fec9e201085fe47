// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level Controller error type: wraps the crates it ties together so
//! the scheduler and HTTP handlers have one `Result` to propagate.

use axum::http::StatusCode as HttpStatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Storage(#[from] rap_storage::StorageError),

    #[error(transparent)]
    Pipeline(#[from] rap_adapters::PipelineParseError),

    #[error(transparent)]
    RepoFetch(#[from] rap_adapters::RepoFetchError),

    #[error("failed to read project.yaml: {0}")]
    PipelineFile(#[from] std::io::Error),

    #[error("background task panicked: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("backend {0:?} not found")]
    UnknownBackend(String),

    #[error("job request {0:?} not found")]
    UnknownJobRequest(String),

    #[error("missing or invalid authentication")]
    Unauthorized,

    #[error("token does not grant access to backend {0:?}")]
    Forbidden(String),
}

/// Maps a `ControllerError` to an HTTP response for the Task/RAP APIs.
/// Internal failures (storage, git, yaml) are logged with detail and
/// returned as opaque 500s; auth failures carry their own status codes.
impl IntoResponse for ControllerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ControllerError::Unauthorized => HttpStatusCode::UNAUTHORIZED,
            ControllerError::Forbidden(_) => HttpStatusCode::FORBIDDEN,
            ControllerError::UnknownBackend(_) | ControllerError::UnknownJobRequest(_) => {
                HttpStatusCode::NOT_FOUND
            }
            ControllerError::Storage(_)
            | ControllerError::Pipeline(_)
            | ControllerError::RepoFetch(_)
            | ControllerError::PipelineFile(_)
            | ControllerError::TaskJoin(_) => HttpStatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(error = %self, "controller request failed");
        (status, self.to_string()).into_response()
    }
}
