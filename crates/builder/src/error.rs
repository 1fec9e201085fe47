// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation errors the Builder can encounter while expanding a JobRequest
//! into Job rows. Every variant here is re-modeled as a terminal FAILED Job
//! rather than thrown, so the scheduler pattern-matches on outcome kinds
//! instead of catching exceptions.

use rap_core::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The requested action (or an action reachable via `needs`) is not
    /// declared in the pipeline.
    MissingAction { action: String },
    /// The `needs` graph rooted at the requested action(s) contains a cycle.
    CyclicDependency { actions: Vec<String> },
    /// An action's output spec contains an unparseable pattern.
    InvalidOutputSpec { action: String, reason: String },
    /// The codelists directory's content is newer than the resolved commit's
    /// checkout, so this action's outputs can't be trusted.
    StaleCodelists { action: String },
}

impl BuildError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BuildError::MissingAction { .. }
            | BuildError::CyclicDependency { .. }
            | BuildError::InvalidOutputSpec { .. } => StatusCode::InvalidPipeline,
            BuildError::StaleCodelists { .. } => StatusCode::StaleCodelists,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            BuildError::MissingAction { action } => action,
            BuildError::CyclicDependency { actions } => actions
                .first()
                .map(String::as_str)
                .unwrap_or("<unknown>"),
            BuildError::InvalidOutputSpec { action, .. } => action,
            BuildError::StaleCodelists { action } => action,
        }
    }

    /// Every action a terminal Job should be created for. A cyclic
    /// dependency implicates every member of the cycle, not just the one
    /// the requested root happened to reach first.
    pub fn actions(&self) -> Vec<&str> {
        match self {
            BuildError::CyclicDependency { actions } => {
                actions.iter().map(String::as_str).collect()
            }
            other => vec![other.action()],
        }
    }

    pub fn message(&self) -> String {
        match self {
            BuildError::MissingAction { action } => {
                format!("action '{action}' is not declared in project.yaml")
            }
            BuildError::CyclicDependency { actions } => {
                format!("cyclic dependency detected among actions: {}", actions.join(", "))
            }
            BuildError::InvalidOutputSpec { action, reason } => {
                format!("action '{action}' has an invalid output spec: {reason}")
            }
            BuildError::StaleCodelists { action } => {
                format!("action '{action}' was skipped: codelists are newer than the repo checkout")
            }
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
