//! CLI error handling specs.
//!
//! Verify clap's argument validation and the client's error reporting when
//! the Controller can't be reached.

use crate::prelude::*;

#[test]
fn job_cancel_missing_action_name_shows_usage_error() {
    cli()
        .args(&["job", "cancel", "jobreq_1"])
        .fails()
        .stderr_has("required");
}

#[test]
fn flag_set_missing_value_shows_usage_error() {
    cli()
        .args(&["flag", "set", "tpp", "paused"])
        .fails()
        .stderr_has("required");
}

#[test]
fn flag_set_unknown_key_shows_usage_error() {
    cli()
        .args(&["flag", "set", "tpp", "not-a-key", "true"])
        .fails()
        .stderr_has("invalid value");
}

#[test]
fn unknown_subcommand_shows_usage_error() {
    cli().args(&["frobnicate"]).fails().stderr_has("Usage:");
}

#[test]
fn status_against_unreachable_controller_reports_connection_error() {
    cli().args(&["status", "tpp"]).fails().stderr_has("Error:");
}

#[test]
fn reboot_prep_against_unreachable_controller_reports_connection_error() {
    cli()
        .args(&["reboot-prep", "tpp"])
        .fails()
        .stderr_has("Error:");
}
