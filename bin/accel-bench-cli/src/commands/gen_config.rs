// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `accel-bench gen-config`: write `stonne_config.cfg` and print its path.

use super::config::BenchConfig;

pub fn execute(config: &BenchConfig) -> anyhow::Result<()> {
    let graph = model_ir::zoo::alexnet(config.runtime.num_classes)?;
    let arch = super::configure_architecture(config, graph.layer_counts())?;
    println!("{}", arch.config_path().display());
    Ok(())
}
