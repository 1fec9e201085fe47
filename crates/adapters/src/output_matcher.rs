// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves a job's declared output-file glob patterns against the files a
//! finished container actually produced.

use std::collections::HashMap;
use std::path::Path;

use glob::Pattern;
use thiserror::Error;
use walkdir_free_impl::list_files;

use rap_core::PrivacyLevel;

#[derive(Debug, Error)]
pub enum OutputMatchError {
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("failed to walk output directory {dir}: {source}")]
    Walk {
        dir: String,
        #[source]
        source: std::io::Error,
    },
}

/// For every declared `(pattern, privacy)` pair, find files under `job_dir`
/// matching the pattern. Returns the concrete matched files (as paths
/// relative to `job_dir`, tagged with the privacy level of the pattern that
/// matched them) plus any declared pattern that matched nothing.
pub fn resolve_outputs(
    job_dir: &Path,
    output_spec: &HashMap<String, PrivacyLevel>,
) -> Result<(HashMap<String, PrivacyLevel>, Vec<String>), OutputMatchError> {
    let files = list_files(job_dir).map_err(|source| OutputMatchError::Walk {
        dir: job_dir.display().to_string(),
        source,
    })?;

    let mut outputs = HashMap::new();
    let mut unmatched = Vec::new();

    for (pattern_str, privacy) in output_spec {
        let pattern = Pattern::new(pattern_str).map_err(|source| OutputMatchError::InvalidPattern {
            pattern: pattern_str.clone(),
            source,
        })?;

        let mut matched_any = false;
        for rel_path in &files {
            if pattern.matches(rel_path) {
                outputs.insert(rel_path.clone(), *privacy);
                matched_any = true;
            }
        }

        if !matched_any {
            unmatched.push(pattern_str.clone());
        }
    }

    Ok((outputs, unmatched))
}

/// Minimal recursive directory walk, kept local so this adapter depends only
/// on `glob` for pattern matching rather than pulling in a separate walker
/// crate for a single call site.
mod walkdir_free_impl {
    use std::path::{Path, PathBuf};

    pub fn list_files(root: &Path) -> std::io::Result<Vec<String>> {
        let mut out = Vec::new();
        if !root.exists() {
            return Ok(out);
        }
        walk(root, root, &mut out)?;
        Ok(out)
    }

    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out)?;
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel_to_slash(rel));
            }
        }
        Ok(())
    }

    fn rel_to_slash(rel: &Path) -> String {
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
#[path = "output_matcher_tests.rs"]
mod tests;
