// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller configuration, read from the environment with sensible
//! defaults — mirrors the daemon's `OJ_*` env-var-first convention.

use std::path::PathBuf;
use std::time::Duration;

use rap_core::BackendId;
use rap_engine::ConcurrencyCaps;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub http_addr: String,
    pub log_path: Option<PathBuf>,
    pub tick_interval: Duration,
    pub sync_interval: Duration,
    /// How often a DBSTATUS probe is issued per backend to drive the
    /// `db-maintenance` flag automatically.
    pub db_status_interval: Duration,
    pub job_server_base_url: String,
    pub job_server_token: String,
    pub max_task_retries: u32,
    pub concurrency_caps: ConcurrencyCaps,
    /// Bearer tokens the Task API accepts, one per backend this instance
    /// serves. `GET /{backend}/tasks/` and `POST /{backend}/task/update/`
    /// reject a request whose token doesn't match the `{backend}` path
    /// segment's entry.
    pub backend_tokens: Vec<(BackendId, String)>,
    /// Bearer tokens the external RAP API accepts, a separate namespace
    /// from `backend_tokens` — these authenticate job-server/admin clients,
    /// not Agents.
    pub rap_api_tokens: Vec<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            db_path: state_dir().join("rap.sqlite3"),
            http_addr: env_string("RAP_HTTP_ADDR", "0.0.0.0:8080"),
            log_path: std::env::var("RAP_LOG_PATH").ok().map(PathBuf::from),
            tick_interval: Duration::from_secs(env_u64("RAP_TICK_INTERVAL_SECS", 5)),
            sync_interval: Duration::from_secs(env_u64("RAP_SYNC_INTERVAL_SECS", 30)),
            db_status_interval: Duration::from_secs(env_u64("RAP_DB_STATUS_INTERVAL_SECS", 60)),
            job_server_base_url: env_string(
                "RAP_JOB_SERVER_URL",
                "https://jobs.opensafely.org",
            ),
            job_server_token: std::env::var("RAP_JOB_SERVER_TOKEN").unwrap_or_default(),
            max_task_retries: env_u64("RAP_MAX_TASK_RETRIES", 3) as u32,
            concurrency_caps: ConcurrencyCaps {
                workers: env_u64("RAP_WORKER_CAP", 4) as u32,
                db_workers: env_u64("RAP_DB_WORKER_CAP", 1) as u32,
            },
            backend_tokens: parse_backend_tokens(),
            rap_api_tokens: std::env::var("RAP_API_TOKENS")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn db_path_str(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.db_path.display())
    }

    pub fn token_for_backend(&self, backend_id: &str) -> Option<&str> {
        self.backend_tokens
            .iter()
            .find(|(id, _)| id.as_str() == backend_id)
            .map(|(_, token)| token.as_str())
    }
}

/// Resolves the state directory: `RAP_STATE_DIR` > `XDG_STATE_HOME`/rap >
/// `~/.local/state/rap`.
fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RAP_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("rap");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/var/lib".to_string());
    PathBuf::from(home).join(".local/state/rap")
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

/// `RAP_BACKEND_TOKENS` is a comma-separated `backend=token` list, one
/// entry per backend this controller instance serves.
fn parse_backend_tokens() -> Vec<(BackendId, String)> {
    std::env::var("RAP_BACKEND_TOKENS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|entry| entry.split_once('='))
        .map(|(backend, token)| (BackendId::new(backend), token.to_string()))
        .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
