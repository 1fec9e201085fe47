// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI configuration, read from the environment. The admin CLI's own auth
//! is out of scope of the Controller's surface; it just forwards whatever
//! bearer token the operator configured for the endpoint being called.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub controller_base_url: String,
    pub token: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            controller_base_url: std::env::var("RAP_CONTROLLER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            token: std::env::var("RAP_CLI_TOKEN").unwrap_or_default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
