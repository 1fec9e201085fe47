// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rap reboot-prep` — convenience wrapper around setting the `reboot` flag.
//! The Controller's scheduler does the rest on its own: pausing admission,
//! cancelling running Jobs, and resetting them to WAITING_ON_REBOOT. Once
//! the machine has restarted, `--clear` lets the operator release the flag
//! so affected Jobs resume from scratch.

use anyhow::Result;
use rap_core::FlagKey;

use crate::client::ControllerClient;

#[derive(clap::Args)]
pub struct RebootPrepArgs {
    /// Backend id to prepare for reboot
    pub backend: String,

    /// Clear the reboot flag instead of setting it
    #[arg(long)]
    pub clear: bool,
}

pub async fn handle(args: RebootPrepArgs, client: &ControllerClient) -> Result<()> {
    let value = if args.clear { "false" } else { "true" };
    client.set_flag(&args.backend, FlagKey::Reboot, value).await?;
    if args.clear {
        println!("cleared reboot-prep on {}", args.backend);
    } else {
        println!(
            "reboot-prep triggered on {}: admission paused, running jobs will be cancelled and reset",
            args.backend
        );
    }
    Ok(())
}
