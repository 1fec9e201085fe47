// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn redacts_posix_home_paths() {
    let r = Redactor::default_rules();
    let out = r.redact("failed to read /home/researcher/study/data.csv");
    assert_eq!(out, "failed to read <REDACTED_PATH>");
}

#[test]
fn redacts_connection_strings() {
    let r = Redactor::default_rules();
    let out = r.redact("could not connect: postgres://user:pw@db.internal:5432/study");
    assert_eq!(out, "could not connect: <REDACTED_CONNECTION_STRING>");
}

#[test]
fn redacts_credential_like_tokens() {
    let r = Redactor::default_rules();
    let out = r.redact("auth failed, token: abcdef123456");
    assert_eq!(out, "auth failed, <REDACTED_CREDENTIAL>");
}

#[test]
fn leaves_unrelated_messages_untouched() {
    let r = Redactor::default_rules();
    let out = r.redact("exit code 1: command not found");
    assert_eq!(out, "exit code 1: command not found");
}

#[test]
fn custom_patterns_apply_in_addition_to_defaults() {
    let r = Redactor::from_patterns(&[r"STUDY-\d+".to_string()]).unwrap();
    let out = r.redact("error in STUDY-1234 pipeline");
    assert_eq!(out, "error in <REDACTED> pipeline");
}
