// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Spatial pooling: windowed max pooling and adaptive average pooling.

use super::conv2d_op::conv_output_len;
use crate::{Shape, Tensor, TensorError, TensorView};

/// Window parameters for [`max_pool2d`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Pool2dParams {
    pub kernel_size: usize,
    pub stride: usize,
    pub padding: usize,
}

/// Computes the output shape of [`max_pool2d`].
pub fn max_pool2d_output_shape(input: &Shape, params: Pool2dParams) -> Result<Shape, TensorError> {
    let (n, c, h, w) = input.as_nchw().ok_or_else(|| TensorError::InvalidParameter {
        op: "max_pool2d",
        detail: format!("input must be rank 4, got {input}"),
    })?;
    if params.padding * 2 > params.kernel_size {
        return Err(TensorError::InvalidParameter {
            op: "max_pool2d",
            detail: format!(
                "padding {} exceeds half the kernel size {}",
                params.padding, params.kernel_size
            ),
        });
    }
    let window = |len| {
        conv_output_len(len, params.kernel_size, params.stride, params.padding).ok_or_else(|| {
            TensorError::InvalidParameter {
                op: "max_pool2d",
                detail: format!("window {params:?} does not fit input length {len}"),
            }
        })
    };
    Ok(Shape::nchw(n, c, window(h)?, window(w)?))
}

/// Max pooling over `kernel_size x kernel_size` windows.
///
/// Padded positions never win the max (they behave as `-inf`).
pub fn max_pool2d(
    input: &TensorView<'_>,
    params: Pool2dParams,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    let expected = max_pool2d_output_shape(input.shape(), params)?;
    if output.shape() != &expected {
        return Err(TensorError::ShapeMismatch {
            op: "max_pool2d (output)",
            lhs: expected,
            rhs: output.shape().clone(),
        });
    }
    let (n, c, h, w) = input.shape().as_nchw().unwrap_or_default();
    let (_, _, oh, ow) = expected.as_nchw().unwrap_or_default();
    let x = input.as_slice();
    let y = output.as_mut_slice();
    let (k, stride, pad) = (
        params.kernel_size as isize,
        params.stride as isize,
        params.padding as isize,
    );

    for plane in 0..n * c {
        let src = &x[plane * h * w..(plane + 1) * h * w];
        let dst = &mut y[plane * oh * ow..(plane + 1) * oh * ow];
        for oy in 0..oh {
            for ox in 0..ow {
                let mut best = f32::NEG_INFINITY;
                for ky in 0..k {
                    let iy = oy as isize * stride + ky - pad;
                    if iy < 0 || iy >= h as isize {
                        continue;
                    }
                    for kx in 0..k {
                        let ix = ox as isize * stride + kx - pad;
                        if ix < 0 || ix >= w as isize {
                            continue;
                        }
                        best = best.max(src[iy as usize * w + ix as usize]);
                    }
                }
                dst[oy * ow + ox] = best;
            }
        }
    }

    Ok(())
}

/// Adaptive average pooling to the spatial size of `output`.
///
/// Bin `i` along an axis of input length `L` and output length `O` covers
/// `[floor(i * L / O), ceil((i + 1) * L / O))`, which also handles `O > L`.
pub fn adaptive_avg_pool2d(input: &TensorView<'_>, output: &mut Tensor) -> Result<(), TensorError> {
    let (n, c, h, w) = input.shape().as_nchw().ok_or_else(|| TensorError::InvalidParameter {
        op: "adaptive_avg_pool2d",
        detail: format!("input must be rank 4, got {}", input.shape()),
    })?;
    let (on, oc, oh, ow) = output.shape().as_nchw().ok_or_else(|| TensorError::InvalidParameter {
        op: "adaptive_avg_pool2d",
        detail: format!("output must be rank 4, got {}", output.shape()),
    })?;
    if on != n || oc != c || h == 0 || w == 0 {
        return Err(TensorError::ShapeMismatch {
            op: "adaptive_avg_pool2d",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let bin = |i: usize, len: usize, out: usize| {
        let start = i * len / out;
        let end = ((i + 1) * len).div_ceil(out);
        (start, end)
    };

    let x = input.as_slice();
    let y = output.as_mut_slice();
    for plane in 0..n * c {
        let src = &x[plane * h * w..(plane + 1) * h * w];
        let dst = &mut y[plane * oh * ow..(plane + 1) * oh * ow];
        for oy in 0..oh {
            let (y0, y1) = bin(oy, h, oh);
            for ox in 0..ow {
                let (x0, x1) = bin(ox, w, ow);
                let mut sum = 0.0f32;
                for iy in y0..y1 {
                    sum += src[iy * w + x0..iy * w + x1].iter().sum::<f32>();
                }
                dst[oy * ow + ox] = sum / ((y1 - y0) * (x1 - x0)) as f32;
            }
        }
    }

    Ok(())
}
