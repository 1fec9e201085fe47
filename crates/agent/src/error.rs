// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level Agent error type: wraps the Task API client and executor
//! errors into one `Result` for the task-runner loop to propagate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("task API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("controller returned {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error(transparent)]
    Executor(#[from] rap_adapters::ExecutorError),
}
