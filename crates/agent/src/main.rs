// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rap-agent`: the per-backend RAP Agent process.
//!
//! A single-threaded cooperative loop polling the Controller's Task API,
//! driving a Docker-backed `ExecutorAdapter` through each active Task's
//! prepare/execute/finalize lifecycle, plus a stub metrics loop.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use rap_adapters::{DockerExecutorAdapter, TracedExecutor};
use rap_agent::client::HttpTaskApiClient;
use rap_agent::config::Config;
use rap_agent::metrics::MetricsLoop;
use rap_agent::supervisor;
use rap_agent::task_runner::TaskRunner;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let _log_guard = setup_logging(&config)?;

    if !config.is_valid() {
        error!("RAP_BACKEND_ID is required, exiting");
        std::process::exit(1);
    }

    info!(
        backend = %config.backend_id,
        controller = %config.controller_base_url,
        "starting rap-agent"
    );

    std::fs::create_dir_all(&config.workspace_root)?;

    let client = HttpTaskApiClient::new(
        config.controller_base_url.clone(),
        config.backend_id.clone(),
        config.backend_token.clone(),
    )?;
    let executor = TracedExecutor::new(DockerExecutorAdapter::connect(config.workspace_root.clone())?);
    let runner = Arc::new(TaskRunner::new(client, executor));
    let metrics = MetricsLoop::new(config.backend_id.as_str());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task_shutdown = shutdown_rx.clone();
    let poll_interval = config.poll_interval;
    let task_loop = tokio::spawn(async move {
        supervisor::run("task-runner", poll_interval, task_shutdown, || {
            let runner = Arc::clone(&runner);
            async move { runner.run_once().await }
        })
        .await;
    });

    let metrics_shutdown = shutdown_rx.clone();
    let metrics_interval = config.metrics_interval;
    let metrics_loop = tokio::spawn(async move {
        supervisor::run("metrics", metrics_interval, metrics_shutdown, || {
            let metrics = metrics.clone();
            async move { metrics.run_once().await }
        })
        .await;
    });

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, stopping loops");
    let _ = shutdown_tx.send(true);

    let _ = task_loop.await;
    let _ = metrics_loop.await;

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn setup_logging(
    config: &Config,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_path) = &config.log_path else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("rap-agent.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}
