// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token checks for the Task API (per-backend Agent tokens) and the
//! RAP API (a separate client-token namespace), both read straight off the
//! `Authorization` header — no session state.

use axum::http::HeaderMap;

use crate::config::Config;
use crate::error::ControllerError;

fn bearer_token(headers: &HeaderMap) -> Result<&str, ControllerError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(ControllerError::Unauthorized)
}

/// Checks a Task API request's bearer token against the `{backend}` path
/// segment's configured token. 401 on missing/invalid header, 403 on a
/// well-formed token that doesn't match this backend.
pub fn authenticate_backend(
    config: &Config,
    headers: &HeaderMap,
    backend_id: &str,
) -> Result<(), ControllerError> {
    let token = bearer_token(headers)?;
    match config.token_for_backend(backend_id) {
        Some(expected) if expected == token => Ok(()),
        Some(_) => Err(ControllerError::Forbidden(backend_id.to_string())),
        None => Err(ControllerError::UnknownBackend(backend_id.to_string())),
    }
}

/// Checks a RAP API request's bearer token against the configured client
/// token list — a distinct namespace from the per-backend Agent tokens.
pub fn authenticate_client(config: &Config, headers: &HeaderMap) -> Result<(), ControllerError> {
    let token = bearer_token(headers)?;
    if config.rap_api_tokens.iter().any(|t| t == token) {
        Ok(())
    } else {
        Err(ControllerError::Unauthorized)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
