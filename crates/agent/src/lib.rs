// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The RAP Agent: a per-backend process that polls the Controller's Task
//! API instead of touching its database directly, and drives an
//! `ExecutorAdapter` through a job's prepare/execute/finalize lifecycle.

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod supervisor;
pub mod task_runner;
