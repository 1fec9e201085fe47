// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn flag_key_kebab_case() {
    assert_eq!(FlagKey::DbMaintenance.as_str(), "db-maintenance");
    assert_eq!(
        serde_json::to_string(&FlagKey::DbMaintenance).unwrap(),
        "\"db-maintenance\""
    );
}

#[test]
fn is_active_treats_false_and_empty_as_inactive() {
    let flag = BackendFlag::new("tpp", FlagKey::Paused, "false", 0);
    assert!(!flag.is_active());

    let flag = BackendFlag::new("tpp", FlagKey::Paused, "", 0);
    assert!(!flag.is_active());

    let flag = BackendFlag::new("tpp", FlagKey::Paused, "true", 0);
    assert!(flag.is_active());
}

#[test]
fn db_maintenance_token_identity_matters() {
    let a = BackendFlag::new("tpp", FlagKey::DbMaintenance, "token-1", 0);
    let b = BackendFlag::new("tpp", FlagKey::DbMaintenance, "token-2", 1);
    assert!(a.is_active());
    assert!(b.is_active());
    assert_ne!(a.value, b.value);
}
