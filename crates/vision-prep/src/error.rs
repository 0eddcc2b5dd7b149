// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for image preprocessing.

use tensor_core::TensorError;

/// Errors that can occur while preprocessing an image.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// The image could not be opened or decoded.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// A transform received a sample of the wrong form.
    #[error("{transform} expects {expected} input")]
    UnexpectedSample {
        transform: &'static str,
        expected: &'static str,
    },

    /// A transform was constructed with unusable parameters.
    #[error("invalid transform parameter: {0}")]
    InvalidParameter(String),

    /// Tensor construction or reshaping failed.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
