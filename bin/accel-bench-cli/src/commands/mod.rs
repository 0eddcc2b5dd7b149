// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod config;
pub mod gen_config;
pub mod inspect;
pub mod run;

use accel_sim::ConfiguredArchitecture;
use anyhow::Context;
use model_ir::LayerCounts;
use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins over the `-v` count.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Fails only if a subscriber is already set.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Loads the configured tile files for `counts` layers and writes the
/// simulator configuration into the output directory.
pub fn configure_architecture(
    config: &config::BenchConfig,
    counts: LayerCounts,
) -> anyhow::Result<ConfiguredArchitecture> {
    let mut arch = config.architecture.clone();
    let conv = arch.conv_tile_paths.clone();
    let fc = arch.fc_tile_paths.clone();
    arch.load_tile_config(conv, fc, counts)
        .context("loading tile configuration")?;
    arch.create_config_file(&config.output_dir)
        .with_context(|| format!("writing simulator config to '{}'", config.output_dir.display()))
}
