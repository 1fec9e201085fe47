// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker-backed executor adapter: one container and one private volume per
//! job, matching the narrow interface the Agent's task loop expects.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, RemoveContainerOptions,
};
use bollard::models::HostConfig;
use bollard::volume::{CreateVolumeOptions, RemoveVolumeOptions};
use bollard::Docker;

use rap_core::{JobId, RunJobDefinition};

use super::{ExecutorAdapter, ExecutorError, ExecutorStatus, ExecutorStatusReport, FinalizeResult};
use crate::output_matcher::resolve_outputs;

fn container_name(job_id: &JobId) -> String {
    format!("rap-job-{job_id}")
}

fn volume_name(job_id: &JobId) -> String {
    format!("rap-vol-{job_id}")
}

/// Production executor adapter backed by the local Docker engine.
#[derive(Clone)]
pub struct DockerExecutorAdapter {
    docker: Docker,
    workspace_root: std::path::PathBuf,
}

impl DockerExecutorAdapter {
    /// Connects to the Docker daemon using the standard environment-derived
    /// defaults (`DOCKER_HOST`, or the local socket).
    pub fn connect(workspace_root: impl Into<std::path::PathBuf>) -> Result<Self, ExecutorError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| ExecutorError::PrepFailed(format!("docker connect: {e}")))?;
        Ok(Self {
            docker,
            workspace_root: workspace_root.into(),
        })
    }
}

#[async_trait]
impl ExecutorAdapter for DockerExecutorAdapter {
    async fn prepare(&self, task_def: &RunJobDefinition) -> Result<(), ExecutorError> {
        let vol = volume_name(&task_def.job_id);
        self.docker
            .create_volume(CreateVolumeOptions {
                name: vol.clone(),
                ..Default::default()
            })
            .await
            .map_err(|e| ExecutorError::PrepFailed(format!("create volume {vol}: {e}")))?;
        Ok(())
    }

    async fn execute(&self, task_def: &RunJobDefinition) -> Result<(), ExecutorError> {
        let name = container_name(&task_def.job_id);
        let vol = volume_name(&task_def.job_id);

        let env: Vec<String> = task_def
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        let mut labels: HashMap<String, String> = task_def.labels.clone();
        labels
            .entry("rap.job_id".to_string())
            .or_insert_with(|| task_def.job_id.to_string());

        let host_config = HostConfig {
            binds: Some(vec![format!("{vol}:/workspace")]),
            nano_cpus: task_def.cpu_limit.map(|cpu| (cpu * 1_000_000_000.0) as i64),
            memory: task_def
                .memory_limit_mb
                .map(|mb| (mb as i64) * 1024 * 1024),
            ..Default::default()
        };

        let config = Config {
            image: Some(task_def.image.clone()),
            cmd: Some(task_def.command.clone()),
            env: Some(env),
            labels: Some(labels),
            working_dir: Some("/workspace".to_string()),
            host_config: Some(host_config),
            ..Default::default()
        };

        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name: name.clone(),
                    platform: None,
                }),
                config,
            )
            .await
            .map_err(|e| ExecutorError::ExecuteFailed(format!("create container {name}: {e}")))?;

        self.docker
            .start_container::<String>(&name, None)
            .await
            .map_err(|e| ExecutorError::ExecuteFailed(format!("start container {name}: {e}")))?;

        Ok(())
    }

    async fn get_status(&self, job_id: &JobId) -> Result<ExecutorStatusReport, ExecutorError> {
        let name = container_name(job_id);
        let inspect = self
            .docker
            .inspect_container(&name, None)
            .await
            .map_err(|e| ExecutorError::StatusFailed(format!("inspect {name}: {e}")))?;

        let state = inspect.state.unwrap_or_default();
        let status = match state.status {
            Some(bollard::models::ContainerStateStatusEnum::CREATED) => ExecutorStatus::Prepared,
            Some(bollard::models::ContainerStateStatusEnum::RUNNING) => ExecutorStatus::Executing,
            Some(bollard::models::ContainerStateStatusEnum::EXITED) => ExecutorStatus::Executed,
            Some(bollard::models::ContainerStateStatusEnum::DEAD) => ExecutorStatus::Error,
            _ => ExecutorStatus::Unknown,
        };

        Ok(ExecutorStatusReport {
            status: Some(status),
            exit_code: state.exit_code.map(|c| c as i32),
            started_at_ms: None,
            finished_at_ms: None,
            container_id: inspect.id,
        })
    }

    async fn finalize(
        &self,
        task_def: &RunJobDefinition,
        _cancelled: bool,
    ) -> Result<FinalizeResult, ExecutorError> {
        let job_dir = self.workspace_root.join(task_def.job_id.as_str());
        let (outputs, unmatched) = resolve_outputs(&job_dir, &task_def.output_spec)
            .map_err(|e| ExecutorError::FinalizeFailed(e.to_string()))?;

        Ok(FinalizeResult {
            outputs,
            unmatched_patterns: unmatched,
            log_bundle_path: job_dir.join("metadata/log.txt").display().to_string(),
        })
    }

    async fn terminate(&self, job_id: &JobId) -> Result<(), ExecutorError> {
        let name = container_name(job_id);
        self.docker
            .kill_container(&name, Some(KillContainerOptions { signal: "SIGKILL" }))
            .await
            .map_err(|e| ExecutorError::TerminateFailed(format!("kill {name}: {e}")))?;
        Ok(())
    }

    async fn cleanup(&self, job_id: &JobId) -> Result<(), ExecutorError> {
        let name = container_name(job_id);
        let vol = volume_name(job_id);

        let _ = self
            .docker
            .remove_container(
                &name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await;

        let _ = self
            .docker
            .remove_volume(&vol, Some(RemoveVolumeOptions { force: true }))
            .await;

        Ok(())
    }
}
