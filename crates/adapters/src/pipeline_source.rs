// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete (non-authoritative) `project.yaml` parsing adapter: turns the
//! raw pipeline file fetched at a commit into the structured actions the Job
//! Definition Builder resolves into a DAG.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use rap_core::PrivacyLevel;

#[derive(Debug, Error)]
pub enum PipelineParseError {
    #[error("malformed project.yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("action {action} declares output pattern {pattern:?} with unrecognized privacy level {level:?}")]
    InvalidPrivacyLevel {
        action: String,
        pattern: String,
        level: String,
    },
    #[error("action {action} has an empty run command")]
    EmptyCommand { action: String },
}

#[derive(Debug, Deserialize)]
struct RawProject {
    #[serde(default)]
    version: Option<serde_yaml::Value>,
    actions: HashMap<String, RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    run: String,
    #[serde(default)]
    needs: Vec<String>,
    #[serde(default)]
    outputs: RawOutputs,
    /// Declares that this action's command hits the backend's shared
    /// database, so it counts against the DB-worker concurrency cap
    /// rather than just the general worker cap. Surfaced explicitly here
    /// instead of inferred from the command string.
    #[serde(default)]
    uses_database: bool,
}

#[derive(Debug, Deserialize, Default)]
struct RawOutputs {
    #[serde(default)]
    highly_sensitive: HashMap<String, String>,
    #[serde(default)]
    moderately_sensitive: HashMap<String, String>,
}

/// A single declared action, resolved from the raw YAML document's
/// `run:`/`needs:`/`outputs:` shape.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineAction {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub needs: Vec<String>,
    pub output_spec: HashMap<String, PrivacyLevel>,
    pub is_db_worker: bool,
}

/// The full parsed pipeline: every declared action, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub actions: HashMap<String, PipelineAction>,
}

impl Pipeline {
    pub fn action(&self, name: &str) -> Option<&PipelineAction> {
        self.actions.get(name)
    }

    pub fn action_names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }
}

/// Splits `run: "docker.io/study/python:1 analysis/extract.py"` into an
/// image reference and a command array, the shape the Executor Adapter
/// expects.
fn split_run_command(action_name: &str, run: &str) -> Result<(String, Vec<String>), PipelineParseError> {
    let mut parts = run.split_whitespace();
    let image = parts
        .next()
        .ok_or_else(|| PipelineParseError::EmptyCommand {
            action: action_name.to_string(),
        })?
        .to_string();
    let command = parts.map(str::to_string).collect();
    Ok((image, command))
}

fn parse_privacy_level(
    action_name: &str,
    pattern: &str,
    level_key: &str,
) -> Result<PrivacyLevel, PipelineParseError> {
    match level_key {
        "highly_sensitive" => Ok(PrivacyLevel::High),
        "moderately_sensitive" => Ok(PrivacyLevel::Medium),
        other => Err(PipelineParseError::InvalidPrivacyLevel {
            action: action_name.to_string(),
            pattern: pattern.to_string(),
            level: other.to_string(),
        }),
    }
}

/// Parses a `project.yaml` document's bytes into a `Pipeline`. The document
/// format is treated as a convention, not an authority: unrecognized keys
/// are ignored rather than rejected, so pipeline authors can add metadata
/// this orchestrator doesn't need.
pub fn parse_pipeline(yaml_source: &str) -> Result<Pipeline, PipelineParseError> {
    let raw: RawProject = serde_yaml::from_str(yaml_source)?;
    let _ = raw.version;

    let mut actions = HashMap::with_capacity(raw.actions.len());
    for (name, raw_action) in raw.actions {
        let (image, command) = split_run_command(&name, &raw_action.run)?;

        // In project.yaml, the map key is a logical output name chosen by the
        // pipeline author; the map value is the glob pattern we match files
        // against, which is what rap-core's output_spec is keyed by.
        let mut output_spec = HashMap::new();
        for pattern in raw_action.outputs.highly_sensitive.values() {
            output_spec.insert(pattern.clone(), parse_privacy_level(&name, pattern, "highly_sensitive")?);
        }
        for pattern in raw_action.outputs.moderately_sensitive.values() {
            output_spec.insert(
                pattern.clone(),
                parse_privacy_level(&name, pattern, "moderately_sensitive")?,
            );
        }

        actions.insert(
            name.clone(),
            PipelineAction {
                name,
                image,
                command,
                needs: raw_action.needs,
                output_spec,
                is_db_worker: raw_action.uses_database,
            },
        );
    }

    Ok(Pipeline { actions })
}

#[cfg(test)]
#[path = "pipeline_source_tests.rs"]
mod tests;
