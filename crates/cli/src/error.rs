// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-local error type for the HTTP round-trip to the Controller. Command
//! handlers convert this into `anyhow::Error` via `?`, matching the rest of
//! the CLI's error handling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("request to controller failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("controller returned {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}
