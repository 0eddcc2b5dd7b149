// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for architecture configuration and offloaded execution.

use crate::TileKind;
use std::path::PathBuf;
use tensor_core::TensorError;

/// Errors raised while configuring the accelerator or running on it.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// A scalar architecture parameter is out of range.
    #[error("invalid architecture parameter: {0}")]
    InvalidParameter(String),

    /// Reading or writing a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tile configuration line could not be understood.
    #[error("tile config line {line}: {detail}")]
    TileParse { line: usize, detail: String },

    /// A tile configuration file is malformed.
    #[error("invalid tile file '{path}': {detail}")]
    InvalidTileFile { path: PathBuf, detail: String },

    /// The number of tile files differs from the number of layers of that kind.
    #[error("expected {expected} {kind} tile files, got {actual}")]
    TileCountMismatch {
        kind: TileKind,
        expected: usize,
        actual: usize,
    },

    /// A tile file of the wrong kind was supplied for a slot.
    #[error("tile file '{path}' is {found}, expected {expected}")]
    TileKindMismatch {
        path: PathBuf,
        expected: TileKind,
        found: TileKind,
    },

    /// A tile occupies more multipliers than the mesh has.
    #[error("tile '{path}' needs {multipliers} multipliers but the mesh has {ms_size}")]
    TileTooLarge {
        path: PathBuf,
        multipliers: usize,
        ms_size: usize,
    },

    /// `create_config_file` was called before `load_tile_config`.
    #[error("tile configuration has not been loaded")]
    TilesNotLoaded,

    /// More layers of a kind were offloaded than tiles were configured.
    #[error("no {kind} tile left for layer '{layer}'")]
    NoTileForLayer { layer: String, kind: TileKind },

    /// The layer cannot be executed by the accelerator.
    #[error("layer '{layer}' ({op}) is not supported by the accelerator")]
    UnsupportedLayer { layer: String, op: &'static str },

    /// TOML (de)serialisation of the descriptor failed.
    #[error("architecture config error: {0}")]
    Config(String),

    /// The kernel rejected the operands.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
