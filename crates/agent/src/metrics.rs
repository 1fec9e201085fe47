// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container metrics loop. Not a core orchestration concern: this loop only
//! logs so the seam exists for a future stats backend, it does not collect
//! or export anything today.

use crate::error::AgentError;

#[derive(Clone)]
pub struct MetricsLoop {
    backend_id: String,
}

impl MetricsLoop {
    pub fn new(backend_id: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
        }
    }

    pub async fn run_once(&self) -> Result<(), AgentError> {
        tracing::debug!(backend = %self.backend_id, "container stats tick (not collected)");
        Ok(())
    }
}
