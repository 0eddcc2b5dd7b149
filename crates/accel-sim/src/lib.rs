// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # accel-sim
//!
//! Configuration and offload model of a dataflow DNN accelerator with a
//! flexible multiplier mesh.
//!
//! - [`ArchitectureDescriptor`] — mesh size, network bandwidths and tile files.
//! - [`TileConfig`] — per-layer tiling read from the simulator's text format.
//! - [`ConfiguredArchitecture`] — the frozen result, with the generated
//!   `stonne_config.cfg` on disk.
//! - [`Accelerator`] / [`Simulator`] — the offload seam used by the runtime.

mod architecture;
mod error;
mod simulator;
mod tile;

pub use architecture::{
    ArchitectureDescriptor, ConfiguredArchitecture, ControllerType, MsNetworkType,
    ReduceNetworkType, CONFIG_FILE_NAME,
};
pub use error::ArchError;
pub use simulator::{Accelerator, OffloadRecord, Simulator};
pub use tile::{ConvDims, ConvTile, FcDims, FcTile, TileConfig, TileKind};
