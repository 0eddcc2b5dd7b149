// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor operators needed by image-classification CNNs.
//!
//! Each operation writes into a pre-allocated output tensor. The
//! `*_output_shape` helpers compute the shape the caller must allocate.

mod activation_op;
mod conv2d_op;
mod linear_op;
mod pool_op;
mod softmax_op;

pub use activation_op::relu_inplace;
pub use conv2d_op::{conv2d, conv2d_output_shape, conv_output_len, Conv2dParams};
pub use linear_op::{linear, linear_output_shape};
pub use pool_op::{
    adaptive_avg_pool2d, max_pool2d, max_pool2d_output_shape, Pool2dParams,
};
pub use softmax_op::softmax;
