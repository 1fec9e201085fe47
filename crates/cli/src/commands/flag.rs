// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rap flag` — set a per-backend operator flag (paused, db-maintenance,
//! reboot) via the Controller's `/backend/flag/` endpoint.

use anyhow::Result;
use clap::ValueEnum;
use rap_core::FlagKey;

use crate::client::ControllerClient;

#[derive(clap::Args)]
pub struct FlagArgs {
    #[command(subcommand)]
    pub command: FlagCommand,
}

#[derive(clap::Subcommand)]
pub enum FlagCommand {
    /// Set a flag's value for a backend
    Set {
        /// Backend id (e.g. tpp, emis)
        backend: String,
        /// Flag key
        key: FlagKeyArg,
        /// Flag value (an opaque token; "false" or "" is treated as inactive)
        value: String,
    },
    /// Clear a flag (equivalent to `set <backend> <key> false`)
    Clear {
        backend: String,
        key: FlagKeyArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum FlagKeyArg {
    Paused,
    DbMaintenance,
    Reboot,
}

impl From<FlagKeyArg> for FlagKey {
    fn from(key: FlagKeyArg) -> Self {
        match key {
            FlagKeyArg::Paused => FlagKey::Paused,
            FlagKeyArg::DbMaintenance => FlagKey::DbMaintenance,
            FlagKeyArg::Reboot => FlagKey::Reboot,
        }
    }
}

pub async fn handle(command: FlagCommand, client: &ControllerClient) -> Result<()> {
    match command {
        FlagCommand::Set { backend, key, value } => {
            client.set_flag(&backend, key.into(), &value).await?;
            println!("set {} on {} = {}", FlagKey::from(key), backend, value);
        }
        FlagCommand::Clear { backend, key } => {
            client.set_flag(&backend, key.into(), "false").await?;
            println!("cleared {} on {}", FlagKey::from(key), backend);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "flag_tests.rs"]
mod tests;
