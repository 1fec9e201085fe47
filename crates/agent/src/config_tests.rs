// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Mutex;

use super::*;

// Environment variables are process-global; serialize tests that touch them.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_rap_env() {
    for key in [
        "RAP_STATE_DIR",
        "XDG_STATE_HOME",
        "RAP_CONTROLLER_URL",
        "RAP_BACKEND_ID",
        "RAP_BACKEND_TOKEN",
        "RAP_AGENT_WORKSPACE_ROOT",
        "RAP_LOG_PATH",
        "RAP_AGENT_POLL_INTERVAL_SECS",
        "RAP_AGENT_METRICS_INTERVAL_SECS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_apply_when_no_env_vars_set() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_rap_env();

    let config = Config::load();

    assert_eq!(config.controller_base_url, "http://127.0.0.1:8080");
    assert_eq!(config.poll_interval, Duration::from_secs(5));
    assert_eq!(config.metrics_interval, Duration::from_secs(60));
    assert!(!config.is_valid());
    clear_rap_env();
}

#[test]
fn backend_id_from_env_marks_config_valid() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_rap_env();
    std::env::set_var("RAP_BACKEND_ID", "tpp");

    let config = Config::load();

    assert_eq!(config.backend_id.as_str(), "tpp");
    assert!(config.is_valid());
    clear_rap_env();
}

#[test]
fn workspace_root_defaults_under_the_state_dir() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_rap_env();
    std::env::set_var("RAP_STATE_DIR", "/tmp/rap-agent-state-test");

    let config = Config::load();

    assert_eq!(
        config.workspace_root,
        PathBuf::from("/tmp/rap-agent-state-test/workspaces")
    );
    clear_rap_env();
}
