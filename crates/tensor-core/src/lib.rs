// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Minimal `f32` tensors and the operators an image-classification CNN
//! needs on the host and on the simulated accelerator.
//!
//! This crate provides:
//! - [`Tensor`] — an owned, row-major `f32` tensor (NCHW for images).
//! - [`Shape`] — runtime shape descriptors.
//! - Operators: [`conv2d`], [`linear`], [`max_pool2d`],
//!   [`adaptive_avg_pool2d`], [`relu_inplace`], [`softmax`].
//!
//! Operators write into caller-allocated outputs; use the matching
//! `*_output_shape` helper to size them.

mod error;
mod ops;
mod shape;
mod tensor;

pub use error::TensorError;
pub use ops::{
    adaptive_avg_pool2d, conv2d, conv2d_output_shape, conv_output_len, linear,
    linear_output_shape, max_pool2d, max_pool2d_output_shape, relu_inplace, softmax,
    Conv2dParams, Pool2dParams,
};
pub use shape::{Shape, F32_BYTES};
pub use tensor::{Tensor, TensorView};
