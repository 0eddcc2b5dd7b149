// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully-connected (dense) layer.

use crate::{Shape, Tensor, TensorError, TensorView};

/// Computes the output shape of [`linear`]: `[N, in] x [out, in]^T → [N, out]`.
pub fn linear_output_shape(input: &Shape, weight: &Shape) -> Result<Shape, TensorError> {
    match (input.dims(), weight.dims()) {
        (&[n, k_in], &[out, k_w]) if k_in == k_w => Ok(Shape::matrix(n, out)),
        _ => Err(TensorError::ShapeMismatch {
            op: "linear",
            lhs: input.clone(),
            rhs: weight.clone(),
        }),
    }
}

/// Dense layer: `output = input @ weight^T + bias`.
///
/// `weight` uses the `[out_features, in_features]` layout that PyTorch
/// checkpoints store, so each output is a contiguous dot product.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if dimensions are incompatible.
pub fn linear(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: Option<&TensorView<'_>>,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    let expected = linear_output_shape(input.shape(), weight.shape())?;
    if output.shape() != &expected {
        return Err(TensorError::ShapeMismatch {
            op: "linear (output)",
            lhs: expected,
            rhs: output.shape().clone(),
        });
    }
    let (n, out_features) = (expected.dims()[0], expected.dims()[1]);
    let in_features = input.shape().dims()[1];

    if let Some(b) = bias {
        if b.shape() != &Shape::vector(out_features) {
            return Err(TensorError::ShapeMismatch {
                op: "linear (bias)",
                lhs: Shape::vector(out_features),
                rhs: b.shape().clone(),
            });
        }
    }

    let x = input.as_slice();
    let w = weight.as_slice();
    let y = output.as_mut_slice();

    for row in 0..n {
        let x_row = &x[row * in_features..(row + 1) * in_features];
        let y_row = &mut y[row * out_features..(row + 1) * out_features];
        for (o, y_o) in y_row.iter_mut().enumerate() {
            let w_row = &w[o * in_features..(o + 1) * in_features];
            let dot: f32 = x_row.iter().zip(w_row).map(|(a, b)| a * b).sum();
            *y_o = dot + bias.map(|b| b.as_slice()[o]).unwrap_or(0.0);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_2x3() {
        // x = [[1, 2, 3], [4, 5, 6]], W = [[1, 0, 1], [0, 1, 0]], b = [0.5, -1]
        let x = Tensor::from_slice(Shape::matrix(2, 3), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let w = Tensor::from_slice(Shape::matrix(2, 3), &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]).unwrap();
        let b = Tensor::from_slice(Shape::vector(2), &[0.5, -1.0]).unwrap();
        let mut y = Tensor::zeros(Shape::matrix(2, 2));

        linear(&x.view(), &w.view(), Some(&b.view()), &mut y).unwrap();

        assert_eq!(y.as_slice(), &[4.5, 1.0, 10.5, 4.0]);
    }

    #[test]
    fn test_linear_no_bias() {
        let x = Tensor::from_slice(Shape::matrix(1, 2), &[3.0, 4.0]).unwrap();
        let w = Tensor::from_slice(Shape::matrix(1, 2), &[2.0, 0.5]).unwrap();
        let mut y = Tensor::zeros(Shape::matrix(1, 1));

        linear(&x.view(), &w.view(), None, &mut y).unwrap();
        assert!((y.as_slice()[0] - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_linear_shape_mismatch() {
        let x = Shape::matrix(1, 9216);
        let w = Shape::matrix(4096, 4096);
        assert!(linear_output_shape(&x, &w).is_err());
    }

    #[test]
    fn test_linear_bad_bias() {
        let x = Tensor::zeros(Shape::matrix(1, 2));
        let w = Tensor::zeros(Shape::matrix(3, 2));
        let b = Tensor::zeros(Shape::vector(2));
        let mut y = Tensor::zeros(Shape::matrix(1, 3));
        assert!(linear(&x.view(), &w.view(), Some(&b.view()), &mut y).is_err());
    }
}
