// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph construction and checkpoint inspection.

use tensor_core::{Shape, TensorError};

/// Errors that can occur when building or checking a model graph.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The checkpoint file could not be opened or mapped.
    #[error("failed to read checkpoint: {0}")]
    Io(#[from] std::io::Error),

    /// Graph (de)serialisation failed.
    #[error("failed to (de)serialise graph: {0}")]
    Json(#[from] serde_json::Error),

    /// A weight tensor named by a layer is absent from the checkpoint.
    #[error("weight tensor not found: {name}")]
    WeightNotFound { name: String },

    /// A checkpoint tensor has a different shape than the layer expects.
    #[error("weight '{name}' has shape {actual}, expected {expected}")]
    WeightShapeMismatch {
        name: String,
        expected: Shape,
        actual: Shape,
    },

    /// The SafeTensors header is malformed or uses an unsupported dtype.
    #[error("failed to load SafeTensors: {0}")]
    SafeTensorsError(String),

    /// A layer definition is invalid (e.g., incompatible shapes).
    #[error("invalid layer '{layer}': {detail}")]
    InvalidLayer { layer: String, detail: String },

    /// The model graph is empty or its layers do not chain.
    #[error("invalid model graph: {0}")]
    InvalidGraph(String),

    /// Shape inference failed inside an operator helper.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
