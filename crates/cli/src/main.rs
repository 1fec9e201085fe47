// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rap - thin admin client for the RAP Controller: set/clear per-backend
//! flags, trigger reboot-prep, and query JobRequest/backend status.

mod client;
mod color;
mod commands;
mod config;
mod error;
mod output;
mod table;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use client::ControllerClient;
use commands::{flag, job, reboot, status};
use config::Config;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "rap",
    version,
    disable_version_flag = true,
    about = "Admin client for the RAP Controller"
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set or clear a per-backend flag (paused, db-maintenance, reboot)
    Flag(flag::FlagArgs),
    /// Trigger or clear reboot preparation for a backend
    RebootPrep(reboot::RebootPrepArgs),
    /// Show a backend's active flags and executing counts
    Status(status::StatusArgs),
    /// Query or cancel Jobs within a JobRequest
    Job(job::JobArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cli_command() -> clap::Command {
    Cli::command()
        .styles(color::styles())
        .arg(
            clap::Arg::new("version")
                .short('v')
                .long("version")
                .action(clap::ArgAction::Version)
                .help("Print version"),
        )
}

async fn run() -> Result<()> {
    let matches = cli_command().get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    let config = Config::load();
    let client = ControllerClient::new(&config)?;

    match cli.command {
        Commands::Flag(args) => flag::handle(args.command, &client).await,
        Commands::RebootPrep(args) => reboot::handle(args, &client).await,
        Commands::Status(args) => status::handle(args, &client, cli.output).await,
        Commands::Job(args) => job::handle(args.command, &client, cli.output).await,
    }
}
