// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - Rate-limited mass-email campaign engine.
//!
//! This is the binary entry point: the scheduler daemon, one-shot queue
//! commands, and environment diagnostics.

mod app;
mod config_cmd;
mod doctor;
mod queue;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use courier_config::CourierConfig;
use courier_core::types::{MassEmailId, Pagination};

/// Courier - Rate-limited mass-email campaign engine.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Drain every in-process mass email on a fixed interval until stopped.
    Serve,
    /// Build, send, or inspect the queue of one mass email.
    Queue {
        #[command(subcommand)]
        action: QueueCommand,
    },
    /// Run diagnostic checks against the configured environment.
    Doctor {
        /// Also run the slower database checks.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Subcommand, Debug)]
enum QueueCommand {
    /// Build the send queue of a Pending mass email.
    Build {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Send one rate-limited batch.
    Send {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// List queue entries in creation order.
    List {
        id: String,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long, default_value_t = Pagination::DEFAULT_LIMIT)]
        limit: u32,
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&std::path::Path>) -> CourierConfig {
    let loaded = match path {
        Some(path) => courier_config::load_and_validate_path(path),
        None => courier_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("courier: use --help for available commands");
        return;
    };

    let config = load_config(cli.config.as_deref());

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Queue { action } => {
            serve::init_tracing(&config.logging.level);
            match action {
                QueueCommand::Build { id, json } => {
                    queue::run_build(&config, &MassEmailId(id), json).await
                }
                QueueCommand::Send { id, json } => {
                    queue::run_send(&config, &MassEmailId(id), json).await
                }
                QueueCommand::List {
                    id,
                    offset,
                    limit,
                    json,
                } => {
                    queue::run_list(
                        &config,
                        &MassEmailId(id),
                        Pagination::new(offset, limit),
                        json,
                    )
                    .await
                }
            }
        }
        Commands::Doctor { deep, plain } => {
            doctor::run_doctor(&config, cli.config.as_deref(), deep, plain).await
        }
        Commands::Config => config_cmd::show(&config).map(|out| print!("{out}")),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
