// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A fixed-interval tick loop with graceful shutdown, for the task-runner
//! and metrics loops. Grounded on the Controller's own supervisor: a single
//! `tokio::select!` racing the timer against a shutdown signal.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

/// Runs `tick` on a fixed interval until `shutdown` fires. Errors from
/// `tick` are logged and do not stop the loop — a single bad tick should
/// not take the whole supervisor down.
pub async fn run<F, Fut, E>(name: &str, interval: Duration, mut shutdown: watch::Receiver<bool>, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    tracing::info!(name, interval_secs = interval.as_secs(), "supervisor starting");
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                if let Err(err) = tick().await {
                    tracing::error!(name, error = %err, "supervisor tick failed");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::info!(name, "supervisor shutting down");
                    break;
                }
            }
        }
    }
}
