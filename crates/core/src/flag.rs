// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-backend operator-controlled flags: paused, DB-maintenance, reboot.
//!
//! Flags live in the database, read fresh on every scheduler tick. Reads are
//! not transactional with job admission: the scheduler tolerates a flag
//! appearing one tick after a Job was already admitted.

use serde::{Deserialize, Serialize};

use crate::id::BackendId;

/// Recognized flag keys. `Reboot` has no source-spec analog by name but is
/// the same mechanism as `db-maintenance`/`paused`, used to drive reboot
/// preparation (see `JobRequest`/engine docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlagKey {
    Paused,
    DbMaintenance,
    Reboot,
}

impl FlagKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKey::Paused => "paused",
            FlagKey::DbMaintenance => "db-maintenance",
            FlagKey::Reboot => "reboot",
        }
    }
}

impl std::fmt::Display for FlagKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single key/value flag scoped to one backend.
///
/// `value` is an opaque token: for `paused` it is `"true"`/`"false"`, for
/// `db-maintenance` it is whatever the DB-status probe reported (a changed
/// token value, not just truthiness, is what triggers re-admission).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFlag {
    pub backend_id: BackendId,
    pub key: FlagKey,
    pub value: String,
    pub updated_at_ms: i64,
}

impl BackendFlag {
    pub fn new(
        backend_id: impl Into<BackendId>,
        key: FlagKey,
        value: impl Into<String>,
        updated_at_ms: i64,
    ) -> Self {
        Self {
            backend_id: backend_id.into(),
            key,
            value: value.into(),
            updated_at_ms,
        }
    }

    /// Whether this flag's value represents an "active" (truthy) state.
    /// For `db-maintenance`, any non-empty value other than `"false"` counts
    /// as active — the token's identity, not just its presence, matters to
    /// callers comparing against a previously-seen token.
    pub fn is_active(&self) -> bool {
        !self.value.is_empty() && self.value != "false"
    }
}

#[cfg(test)]
#[path = "flag_tests.rs"]
mod tests;
