// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax activation operation.

use crate::{Tensor, TensorError, TensorView};

/// Computes softmax along the last dimension: `output[i] = exp(x[i] - max) / sum(exp(x - max))`.
///
/// Uses the numerically stable variant that subtracts the maximum value
/// before exponentiation to prevent overflow.
///
/// Used to turn classifier logits into class probabilities.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if input and output shapes differ.
pub fn softmax(input: &TensorView<'_>, output: &mut Tensor) -> Result<(), TensorError> {
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "softmax",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let last_dim = match input.shape().dims().last() {
        Some(&d) if d > 0 => d,
        Some(_) => return Ok(()),
        None => {
            output.as_mut_slice()[0] = 1.0;
            return Ok(());
        }
    };

    let src = input.as_slice();
    let dst = output.as_mut_slice();
    let num_rows = src.len() / last_dim;

    for row in 0..num_rows {
        let offset = row * last_dim;
        let row_src = &src[offset..offset + last_dim];
        let row_dst = &mut dst[offset..offset + last_dim];

        let max_val = row_src.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for (d, &s) in row_dst.iter_mut().zip(row_src.iter()) {
            let e = (s - max_val).exp();
            *d = e;
            sum += e;
        }

        if sum > 0.0 {
            let inv_sum = 1.0 / sum;
            for d in row_dst.iter_mut() {
                *d *= inv_sum;
            }
        }
    }

    Ok(())
}
