// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration, read from the environment with sensible defaults —
//! mirrors the Controller's `RAP_*` env-var-first convention.

use std::path::PathBuf;
use std::time::Duration;

use rap_core::BackendId;

#[derive(Debug, Clone)]
pub struct Config {
    pub controller_base_url: String,
    pub backend_id: BackendId,
    pub backend_token: String,
    pub workspace_root: PathBuf,
    pub log_path: Option<PathBuf>,
    pub poll_interval: Duration,
    pub metrics_interval: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            controller_base_url: env_string("RAP_CONTROLLER_URL", "http://127.0.0.1:8080"),
            backend_id: BackendId::new(env_string("RAP_BACKEND_ID", "")),
            backend_token: std::env::var("RAP_BACKEND_TOKEN").unwrap_or_default(),
            workspace_root: std::env::var("RAP_AGENT_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| state_dir().join("workspaces")),
            log_path: std::env::var("RAP_LOG_PATH").ok().map(PathBuf::from),
            poll_interval: Duration::from_secs(env_u64("RAP_AGENT_POLL_INTERVAL_SECS", 5)),
            metrics_interval: Duration::from_secs(env_u64("RAP_AGENT_METRICS_INTERVAL_SECS", 60)),
        }
    }

    /// Fatal at startup if unset: every Task API call is scoped to one
    /// backend, and there is no sensible default to fall back to.
    pub fn is_valid(&self) -> bool {
        !self.backend_id.as_str().is_empty()
    }
}

fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RAP_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("rap-agent");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/var/lib".to_string());
    PathBuf::from(home).join(".local/state/rap-agent")
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
