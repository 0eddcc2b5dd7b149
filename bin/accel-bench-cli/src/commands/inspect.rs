// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `accel-bench inspect`: display the network and which tile each
//! offloaded layer will use.
//!
//! Tile files are parsed but nothing is written, so this also works as a
//! dry run for a new tile set.

use super::config::BenchConfig;
use accel_sim::{ConvDims, FcDims, TileConfig};
use model_ir::{LayerDef, LayerType};
use std::path::PathBuf;

pub fn execute(config: &BenchConfig) -> anyhow::Result<()> {
    let graph = model_ir::zoo::alexnet(config.runtime.num_classes)?;
    let arch = &config.architecture;

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             accel-bench · Model Inspector           ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  {}", graph.summary());
    println!(
        "  Mesh: {} multipliers, dn_bw={}, rn_bw={}",
        arch.ms_size, arch.dn_bw, arch.rn_bw
    );
    println!();

    // ── Per-Layer Detail ───────────────────────────────────────
    println!(
        "  {:<4} {:<14} {:<20} {:<18} {:>10} {:<28} {:>10}",
        "Idx", "Name", "Type", "Output", "MMACs", "Tile", "Folds",
    );
    println!("  {}", "-".repeat(110));

    let (mut next_conv, mut next_fc) = (0, 0);
    for layer in graph.iter_layers() {
        let slot = match layer.layer_type {
            LayerType::Conv2d { .. } => {
                next_conv += 1;
                arch.conv_tile_paths.get(next_conv - 1)
            }
            LayerType::Linear { .. } => {
                next_fc += 1;
                arch.fc_tile_paths.get(next_fc - 1)
            }
            _ => None,
        };
        let (tile, folds) = describe_tile(layer, slot, arch.ms_size);
        println!(
            "  {:<4} {:<14} {:<20} {:<18} {:>10.2} {:<28} {:>10}",
            layer.index,
            layer.name,
            layer.layer_type.as_str(),
            layer.output_shape.to_string(),
            layer.macs() as f64 / 1e6,
            tile,
            folds,
        );
    }
    println!();

    let expected = graph.layer_counts();
    if arch.conv_tile_paths.len() != expected.conv || arch.fc_tile_paths.len() != expected.fc {
        println!(
            "  Warning: {} conv / {} fc tile files configured, model needs {} / {}",
            arch.conv_tile_paths.len(),
            arch.fc_tile_paths.len(),
            expected.conv,
            expected.fc,
        );
        println!();
    }
    Ok(())
}

/// Tile label and fold count for one layer's slot.
fn describe_tile(layer: &LayerDef, slot: Option<&PathBuf>, ms_size: usize) -> (String, String) {
    let Some(path) = slot else {
        let label = if layer.layer_type.has_weights() { "(no tile)" } else { "host" };
        return (label.to_string(), "-".to_string());
    };
    let tile = match TileConfig::from_file(path) {
        Ok(tile) => tile,
        Err(e) => {
            tracing::warn!("{e}");
            return ("(unreadable)".to_string(), "-".to_string());
        }
    };
    let mut label = tile.to_string();
    if tile.multipliers() > ms_size {
        label.push_str(" (exceeds mesh)");
    }
    let folds = match (tile, &layer.layer_type) {
        (
            TileConfig::Conv(t),
            &LayerType::Conv2d {
                in_channels,
                out_channels,
                kernel_size,
                ..
            },
        ) => {
            let (n, _, x, y) = layer.output_shape.as_nchw().unwrap_or_default();
            t.folds(&ConvDims {
                r: kernel_size,
                s: kernel_size,
                c: in_channels,
                k: out_channels,
                g: 1,
                n,
                x,
                y,
            })
            .to_string()
        }
        (
            TileConfig::Fc(t),
            &LayerType::Linear {
                in_features,
                out_features,
            },
        ) => t
            .folds(&FcDims {
                m: out_features,
                n: layer.output_shape.dim(0).unwrap_or(1),
                k: in_features,
            })
            .to_string(),
        _ => "kind mismatch".to_string(),
    };
    (label, folds)
}
