// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rap job` — query a JobRequest's Jobs and cancel individual actions,
//! against the Controller's `/rap/status/` and `/rap/cancel/` endpoints.

use anyhow::Result;

use crate::client::ControllerClient;
use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(clap::Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(clap::Subcommand)]
pub enum JobCommand {
    /// Show every Job belonging to a JobRequest
    Status {
        /// JobRequest id
        job_request_id: String,
    },
    /// Cancel one action within a JobRequest
    Cancel {
        /// JobRequest id
        job_request_id: String,
        /// Action name to cancel
        action_name: String,
    },
}

pub async fn handle(command: JobCommand, client: &ControllerClient, format: OutputFormat) -> Result<()> {
    match command {
        JobCommand::Status { job_request_id } => {
            let jobs = client.job_request_status(&job_request_id).await?;
            crate::output::print_or_render(format, &jobs, || render_jobs(&jobs))?;
        }
        JobCommand::Cancel {
            job_request_id,
            action_name,
        } => {
            client.cancel_action(&job_request_id, &action_name).await?;
            println!("cancelled {} on {}", action_name, job_request_id);
        }
    }
    Ok(())
}

fn render_jobs(jobs: &[rap_core::Job]) {
    let mut table = Table::new(vec![
        Column::left("ACTION"),
        Column::left("STATE"),
        Column::status("STATUS"),
        Column::left("ID"),
    ]);
    for job in jobs {
        table.row(vec![
            job.action_name.clone(),
            job.state.to_string(),
            job.status_code.to_string(),
            job.id.short(8).to_string(),
        ]);
    }
    let mut out = std::io::stdout();
    table.render(&mut out);
}
