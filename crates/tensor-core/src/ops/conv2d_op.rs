// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 2-D convolution (direct, NCHW).

use crate::{Shape, Tensor, TensorError, TensorView};

/// Stride and zero-padding for a square 2-D convolution window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Conv2dParams {
    pub stride: usize,
    pub padding: usize,
}

impl Default for Conv2dParams {
    fn default() -> Self {
        Self {
            stride: 1,
            padding: 0,
        }
    }
}

/// Output length of a sliding window along one axis.
///
/// Returns `None` when the (padded) input is shorter than the kernel or
/// `stride` is zero.
pub fn conv_output_len(input: usize, kernel: usize, stride: usize, padding: usize) -> Option<usize> {
    if stride == 0 || kernel == 0 {
        return None;
    }
    let padded = input + 2 * padding;
    if padded < kernel {
        return None;
    }
    Some((padded - kernel) / stride + 1)
}

/// Computes the output shape of [`conv2d`].
///
/// `input` is `[N, C, H, W]`, `weight` is `[K, C, R, S]`; the result is
/// `[N, K, H_out, W_out]`.
pub fn conv2d_output_shape(
    input: &Shape,
    weight: &Shape,
    params: Conv2dParams,
) -> Result<Shape, TensorError> {
    let (n, c, h, w) = input.as_nchw().ok_or_else(|| TensorError::InvalidParameter {
        op: "conv2d",
        detail: format!("input must be rank 4, got {input}"),
    })?;
    let (k, wc, r, s) = weight.as_nchw().ok_or_else(|| TensorError::InvalidParameter {
        op: "conv2d",
        detail: format!("weight must be rank 4, got {weight}"),
    })?;
    if wc != c {
        return Err(TensorError::ShapeMismatch {
            op: "conv2d",
            lhs: input.clone(),
            rhs: weight.clone(),
        });
    }
    let window = |len, kernel| {
        conv_output_len(len, kernel, params.stride, params.padding).ok_or_else(|| {
            TensorError::InvalidParameter {
                op: "conv2d",
                detail: format!(
                    "kernel {kernel} with stride {} / padding {} does not fit input length {len}",
                    params.stride, params.padding
                ),
            }
        })
    };
    Ok(Shape::nchw(n, k, window(h, r)?, window(w, s)?))
}

/// Direct convolution: `output = conv(input, weight) + bias`.
///
/// `bias`, when present, must be a vector of length `K`. `output` must
/// already have the shape returned by [`conv2d_output_shape`].
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] on any shape inconsistency.
pub fn conv2d(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: Option<&TensorView<'_>>,
    params: Conv2dParams,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    let expected = conv2d_output_shape(input.shape(), weight.shape(), params)?;
    if output.shape() != &expected {
        return Err(TensorError::ShapeMismatch {
            op: "conv2d (output)",
            lhs: expected,
            rhs: output.shape().clone(),
        });
    }
    let (n, c, h, w) = input.shape().as_nchw().unwrap_or_default();
    let (k, _, r, s) = weight.shape().as_nchw().unwrap_or_default();
    let (_, _, oh, ow) = expected.as_nchw().unwrap_or_default();

    if let Some(b) = bias {
        if b.shape() != &Shape::vector(k) {
            return Err(TensorError::ShapeMismatch {
                op: "conv2d (bias)",
                lhs: Shape::vector(k),
                rhs: b.shape().clone(),
            });
        }
    }

    let x = input.as_slice();
    let wt = weight.as_slice();
    let out = output.as_mut_slice();
    let stride = params.stride as isize;
    let pad = params.padding as isize;

    for b in 0..n {
        for ko in 0..k {
            let plane = &mut out[(b * k + ko) * oh * ow..(b * k + ko + 1) * oh * ow];
            let init = bias.map(|v| v.as_slice()[ko]).unwrap_or(0.0);
            plane.iter_mut().for_each(|v| *v = init);

            for ci in 0..c {
                let in_plane = &x[(b * c + ci) * h * w..(b * c + ci + 1) * h * w];
                let w_base = (ko * c + ci) * r * s;
                for kr in 0..r {
                    for ks in 0..s {
                        let coeff = wt[w_base + kr * s + ks];
                        for oy in 0..oh {
                            let iy = oy as isize * stride + kr as isize - pad;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            let in_row = &in_plane[iy as usize * w..(iy as usize + 1) * w];
                            let out_row = &mut plane[oy * ow..(oy + 1) * ow];
                            for (ox, o) in out_row.iter_mut().enumerate() {
                                let ix = ox as isize * stride + ks as isize - pad;
                                if ix >= 0 && ix < w as isize {
                                    *o += coeff * in_row[ix as usize];
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
