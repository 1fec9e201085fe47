// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output privacy classification.

use serde::{Deserialize, Serialize};

/// Classification of an output file, determining which storage base it is
/// copied to on `finalize` and which review rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    /// Disclosive output requiring output-checking review before release.
    High,
    /// Output suitable for the moderately-private storage base.
    Medium,
}

impl PrivacyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyLevel::High => "high",
            PrivacyLevel::Medium => "medium",
        }
    }
}

impl std::fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
