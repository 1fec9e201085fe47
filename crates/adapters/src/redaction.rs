// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redacts status messages before they cross the secure-environment boundary
//! to the job-server. A conservative deny-list of regexes that look like
//! absolute filesystem paths, usernames, or connection strings.

use std::sync::LazyLock;

use regex::Regex;

// Allow expect here as each pattern is compile-time verified to be valid.
#[allow(clippy::expect_used)]
static WINDOWS_HOME_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z]:\\Users\\[^\\\s]+").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static POSIX_HOME_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/home/[^/\s]+").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static CONNECTION_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(postgres|mssql|mysql)://[^\s]+").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static CREDENTIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(token|password|secret)\s*[:=]\s*\S+").expect("constant regex pattern is valid")
});

/// A compiled set of redaction rules, applied in order.
pub struct Redactor {
    rules: Vec<(Regex, &'static str)>,
}

impl Redactor {
    /// The default rule set: strips things that tend to leak environment
    /// detail from an otherwise useful error message.
    pub fn default_rules() -> Self {
        let rules = vec![
            (WINDOWS_HOME_PATH.clone(), "<REDACTED_PATH>"),
            (POSIX_HOME_PATH.clone(), "<REDACTED_PATH>"),
            (CONNECTION_STRING.clone(), "<REDACTED_CONNECTION_STRING>"),
            (CREDENTIAL.clone(), "<REDACTED_CREDENTIAL>"),
        ];
        Self { rules }
    }

    /// Builds a redactor from caller-supplied patterns, replacing all
    /// matches with `<REDACTED>`. Used for backend-specific policies layered
    /// on top of the default rules.
    pub fn from_patterns(patterns: &[String]) -> Result<Self, regex::Error> {
        let mut rules = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            rules.push((Regex::new(pattern)?, "<REDACTED>"));
        }
        Ok(Self { rules })
    }

    pub fn redact(&self, message: &str) -> String {
        let mut out = message.to_string();
        for (re, replacement) in &self.rules {
            out = re.replace_all(&out, *replacement).into_owned();
        }
        out
    }
}

#[cfg(test)]
#[path = "redaction_tests.rs"]
mod tests;
