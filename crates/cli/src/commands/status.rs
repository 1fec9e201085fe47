// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rap status` — a backend's active flags and current executing counts,
//! against the Controller's `/backend/status/` endpoint.

use anyhow::Result;

use crate::client::{BackendStatus, ControllerClient};
use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(clap::Args)]
pub struct StatusArgs {
    /// Backend id to query
    pub backend: String,
}

pub async fn handle(args: StatusArgs, client: &ControllerClient, format: OutputFormat) -> Result<()> {
    let status = client.backend_status(&args.backend).await?;
    crate::output::print_or_render(format, &status, || render_status(&args.backend, &status))?;
    Ok(())
}

fn render_status(backend: &str, status: &BackendStatus) {
    println!("backend: {}", backend);
    println!("executing: {} (db workers: {})", status.executing, status.executing_db_workers);

    if status.flags.is_empty() {
        println!("flags: none set");
        return;
    }

    let mut table = Table::new(vec![Column::left("KEY"), Column::left("VALUE"), Column::left("ACTIVE")]);
    for flag in &status.flags {
        table.row(vec![
            flag.key.to_string(),
            flag.value.clone(),
            flag.is_active().to_string(),
        ]);
    }
    let mut out = std::io::stdout();
    table.render(&mut out);
}
