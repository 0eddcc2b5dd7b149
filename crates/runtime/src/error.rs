// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the inference runtime.

use model_ir::LayerCounts;
use tensor_core::Shape;

/// Errors that can occur during inference execution.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The batch handed to `run` does not have the model's input shape.
    #[error("input shape mismatch: model expects {expected}, got {actual}")]
    InputShapeMismatch { expected: Shape, actual: Shape },

    /// The accelerator was configured for a different number of layers.
    #[error(
        "accelerator tiles cover {} conv / {} fc layers but the model has {} / {}",
        configured.conv, configured.fc, model.conv, model.fc
    )]
    TileCountMismatch {
        configured: LayerCounts,
        model: LayerCounts,
    },

    /// Failed to load weights from disk.
    #[error("weight loading failed for layer '{layer}': {detail}")]
    WeightLoadError { layer: String, detail: String },

    /// A host-side tensor operation failed during layer execution.
    #[error("execution error in layer '{layer}': {source}")]
    ExecutionError {
        layer: String,
        #[source]
        source: tensor_core::TensorError,
    },

    /// The accelerator rejected or failed an offloaded layer.
    #[error("accelerator error: {0}")]
    AcceleratorError(#[from] accel_sim::ArchError),

    /// Model graph or checkpoint problem.
    #[error("model error: {0}")]
    ModelError(#[from] model_ir::ModelError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
