// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # accel-bench
//!
//! Times one AlexNet forward pass with its conv and dense layers offloaded
//! to a tile-configured accelerator simulator.
//!
//! ## Usage
//! ```bash
//! # Full benchmark; stdout carries only the elapsed seconds
//! accel-bench -c bench.toml run
//!
//! # Skip the download
//! accel-bench run --image ./dog.jpg --metrics-json metrics.json
//!
//! # Only write stonne_config.cfg
//! accel-bench gen-config
//!
//! # Show layers with their tile assignment
//! accel-bench inspect
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "accel-bench",
    about = "AlexNet inference benchmark on a configured accelerator simulator",
    version,
    author
)]
struct Cli {
    /// Path to a TOML bench configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure, fetch, preprocess, then time one forward pass.
    Run {
        /// Use a local image instead of downloading one.
        #[arg(long)]
        image: Option<PathBuf>,

        /// Write per-layer metrics and offload records as JSON.
        #[arg(long)]
        metrics_json: Option<PathBuf>,
    },

    /// Load the tile files and write the simulator configuration only.
    GenConfig,

    /// Print the network layers with their tile assignment.
    Inspect,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let config = commands::config::BenchConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            image,
            metrics_json,
        } => commands::run::execute(config, image, metrics_json).await,
        Commands::GenConfig => commands::gen_config::execute(&config),
        Commands::Inspect => commands::inspect::execute(&config),
    }
}
