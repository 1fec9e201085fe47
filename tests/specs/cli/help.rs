//! CLI help output specs.
//!
//! Verify help text displays for the admin client's subcommands.

use crate::prelude::*;

#[test]
fn rap_no_args_shows_usage_and_exits_nonzero() {
    cli().fails().stderr_has("Usage:");
}

#[test]
fn rap_help_shows_usage() {
    cli().args(&["--help"]).passes().stdout_has("Usage:");
}

#[test]
fn rap_help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("flag")
        .stdout_has("reboot-prep")
        .stdout_has("status")
        .stdout_has("job");
}

#[test]
fn rap_flag_help_shows_subcommands() {
    cli()
        .args(&["flag", "--help"])
        .passes()
        .stdout_has("set")
        .stdout_has("clear");
}

#[test]
fn rap_job_help_shows_subcommands() {
    cli()
        .args(&["job", "--help"])
        .passes()
        .stdout_has("status")
        .stdout_has("cancel");
}

#[test]
fn rap_version_shows_version() {
    cli().args(&["-v"]).passes().stdout_has("0.1");
}
