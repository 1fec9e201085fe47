// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;

use rap_core::PrivacyLevel;

use super::*;

fn write(path: &std::path::Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn matches_declared_glob_against_produced_files() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("output/spec.csv"), "a,b");
    write(&dir.path().join("output/extra.txt"), "ignored");

    let mut spec = HashMap::new();
    spec.insert("output/*.csv".to_string(), PrivacyLevel::High);

    let (outputs, unmatched) = resolve_outputs(dir.path(), &spec).unwrap();
    assert_eq!(outputs.get("output/spec.csv"), Some(&PrivacyLevel::High));
    assert!(unmatched.is_empty());
}

#[test]
fn pattern_matching_nothing_is_reported_unmatched() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("output/spec.csv"), "a,b");

    let mut spec = HashMap::new();
    spec.insert("output/*.json".to_string(), PrivacyLevel::Medium);

    let (outputs, unmatched) = resolve_outputs(dir.path(), &spec).unwrap();
    assert!(outputs.is_empty());
    assert_eq!(unmatched, vec!["output/*.json".to_string()]);
}

#[test]
fn nonexistent_job_dir_reports_all_patterns_unmatched() {
    let mut spec = HashMap::new();
    spec.insert("output/*.csv".to_string(), PrivacyLevel::High);

    let (outputs, unmatched) =
        resolve_outputs(std::path::Path::new("/no/such/dir"), &spec).unwrap();
    assert!(outputs.is_empty());
    assert_eq!(unmatched.len(), 1);
}

#[test]
fn invalid_glob_pattern_is_an_error() {
    let mut spec = HashMap::new();
    spec.insert("[invalid".to_string(), PrivacyLevel::High);

    let dir = tempfile::tempdir().unwrap();
    let err = resolve_outputs(dir.path(), &spec).unwrap_err();
    assert!(matches!(err, OutputMatchError::InvalidPattern { .. }));
}
