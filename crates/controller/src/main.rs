// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rapd`: the RAP Controller daemon.
//!
//! Owns the task database and runs three cooperating loops: the HTTP
//! server (Task API + RAP API), the scheduler tick (admission, dependency
//! and flag evaluation per backend), and the Sync Loop (pulls JobRequests
//! from the job-server and pushes Job status back).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use rap_adapters::{GitRepoFetcher, JobServerClient};
use rap_controller::config::Config;
use rap_controller::scheduler::Scheduler;
use rap_controller::sync_loop::SyncLoop;
use rap_controller::{router, supervisor, AppState};
use rap_core::SystemClock;
use rap_engine::RetryPolicy;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let _log_guard = setup_logging(&config)?;

    info!(http_addr = %config.http_addr, "starting rapd");

    let pool = match rap_storage::connect(&config.db_path_str()).await {
        Ok(pool) => pool,
        Err(err) => {
            error!(error = %err, "failed to open database, exiting");
            std::process::exit(1);
        }
    };

    let clock = SystemClock;
    let retry_policy = RetryPolicy {
        max_task_retries: config.max_task_retries,
    };
    let scheduler = Arc::new(Scheduler::new(
        pool.clone(),
        clock.clone(),
        retry_policy,
        config.concurrency_caps,
    ));

    let repo_cache_root = config.db_path.parent().unwrap_or(&config.db_path).join("repo-cache");
    let repo_fetcher = GitRepoFetcher::new(repo_cache_root, None);

    let state = AppState {
        config: Arc::new(config.clone()),
        scheduler: Arc::clone(&scheduler),
        repo_fetcher: repo_fetcher.clone(),
        job_repo: rap_storage::JobRepository::new(pool.clone()),
        task_repo: rap_storage::TaskRepository::new(pool.clone()),
        flag_repo: rap_storage::FlagRepository::new(pool.clone()),
        request_repo: rap_storage::JobRequestRepository::new(pool.clone()),
        clock: clock.clone(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    let http_shutdown = shutdown_rx.clone();
    let app = router(state);
    let server = tokio::spawn(async move {
        let mut shutdown = http_shutdown;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
    });

    let backend_ids: Vec<String> = config
        .backend_tokens
        .iter()
        .map(|(id, _)| id.as_str().to_string())
        .collect();

    let tick_scheduler = Arc::clone(&scheduler);
    let tick_backends = backend_ids.clone();
    let tick_shutdown = shutdown_rx.clone();
    let tick_interval = config.tick_interval;
    tokio::spawn(async move {
        supervisor::run("scheduler-tick", tick_interval, tick_shutdown, || {
            let scheduler = Arc::clone(&tick_scheduler);
            let backends = tick_backends.clone();
            async move {
                for backend in &backends {
                    let changed = scheduler.tick(backend).await?;
                    if changed > 0 {
                        info!(backend, jobs_evaluated = changed, "scheduler tick");
                    }
                }
                Ok::<(), rap_controller::error::ControllerError>(())
            }
        })
        .await;
    });

    let db_status_scheduler = Arc::clone(&scheduler);
    let db_status_backends = backend_ids.clone();
    let db_status_shutdown = shutdown_rx.clone();
    let db_status_interval = config.db_status_interval;
    tokio::spawn(async move {
        supervisor::run("db-status-probe", db_status_interval, db_status_shutdown, || {
            let scheduler = Arc::clone(&db_status_scheduler);
            let backends = db_status_backends.clone();
            async move {
                for backend in &backends {
                    scheduler.issue_db_status_task(backend).await?;
                }
                Ok::<(), rap_controller::error::ControllerError>(())
            }
        })
        .await;
    });

    for (backend_id, _token) in &config.backend_tokens {
        let job_server = JobServerClient::new(
            config.job_server_base_url.clone(),
            config.job_server_token.clone(),
        )?;
        let sync_loop = Arc::new(SyncLoop::new(
            backend_id.clone(),
            job_server,
            repo_fetcher.clone(),
            pool.clone(),
            clock.clone(),
        ));
        let sync_scheduler = Arc::clone(&scheduler);
        let sync_shutdown = shutdown_rx.clone();
        let sync_interval = config.sync_interval;
        tokio::spawn(async move {
            supervisor::run("sync-loop", sync_interval, sync_shutdown, || {
                let sync_loop = Arc::clone(&sync_loop);
                let scheduler = Arc::clone(&sync_scheduler);
                async move { sync_loop.run_once(&scheduler).await }
            })
            .await;
        });
    }

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, stopping loops");
    let _ = shutdown_tx.send(true);

    if let Ok(Err(err)) = server.await {
        error!(error = %err, "http server exited with error");
    }

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
        log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("rapd.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}
