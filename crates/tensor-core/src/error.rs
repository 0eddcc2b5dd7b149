// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.

use crate::Shape;

/// Errors that can occur during tensor operations.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// A byte buffer does not match the size implied by the shape.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// An element buffer does not match the element count implied by the shape.
    #[error("element count mismatch: expected {expected}, got {actual}")]
    ElementCountMismatch { expected: usize, actual: usize },

    /// Two tensors have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// An axis is out of range for the tensor's rank.
    #[error("axis {axis} out of range for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// An operator parameter is invalid (zero stride, kernel larger than input, ...).
    #[error("invalid parameter for {op}: {detail}")]
    InvalidParameter { op: &'static str, detail: String },
}
