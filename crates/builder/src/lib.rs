// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The Job Definition Builder: expands a JobRequest's requested action into
//! the transitive closure of `needs` dependencies, decides which actions can
//! reuse a prior Job versus need a fresh one, and produces the resulting
//! rows in dependency order.

mod builder;
mod decision;
mod error;
mod graph;
pub mod prior;

pub use builder::{finalize_status_code, BuildOutcome, JobDefinitionBuilder, StaleCodelistActions};
pub use decision::{decide, Decision};
pub use error::BuildError;
pub use graph::{topological_order, transitive_needs};
pub use prior::{PriorJob, PriorJobLookup};

#[cfg(any(test, feature = "test-support"))]
pub use prior::fake::FakePriorJobLookup;
