// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Mutex;

use super::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_rap_env() {
    std::env::remove_var("RAP_CONTROLLER_URL");
    std::env::remove_var("RAP_CLI_TOKEN");
}

#[test]
fn defaults_apply_when_no_env_vars_set() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_rap_env();

    let config = Config::load();

    assert_eq!(config.controller_base_url, "http://127.0.0.1:8080");
    assert_eq!(config.token, "");
}

#[test]
fn controller_url_and_token_are_read_from_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_rap_env();
    std::env::set_var("RAP_CONTROLLER_URL", "https://controller.example.org");
    std::env::set_var("RAP_CLI_TOKEN", "s3cr3t");

    let config = Config::load();

    assert_eq!(config.controller_base_url, "https://controller.example.org");
    assert_eq!(config.token, "s3cr3t");

    clear_rap_env();
}
