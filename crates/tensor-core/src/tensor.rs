// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type and view abstractions.

use crate::{Shape, TensorError};

/// An owned, n-dimensional `f32` tensor stored in contiguous memory.
///
/// # Memory Layout
/// Data is stored in row-major (C) order. Image tensors are NCHW.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::zeros(Shape::matrix(2, 3));
    /// assert_eq!(t.size_bytes(), 24);
    /// ```
    pub fn zeros(shape: Shape) -> Self {
        let n = shape.num_elements();
        Self {
            shape,
            data: vec![0.0; n],
        }
    }

    /// Creates a tensor filled with a constant value.
    pub fn full(shape: Shape, value: f32) -> Self {
        let n = shape.num_elements();
        Self {
            shape,
            data: vec![value; n],
        }
    }

    /// Creates a tensor from an owned buffer.
    ///
    /// Returns an error if `data.len()` does not match the shape.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_vec(Shape::vector(3), vec![1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.as_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_vec(shape: Shape, data: Vec<f32>) -> Result<Self, TensorError> {
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(TensorError::ElementCountMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates a tensor by copying a slice.
    pub fn from_slice(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        Self::from_vec(shape, values.to_vec())
    }

    /// Decodes little-endian `f32` bytes (the SafeTensors on-disk layout).
    pub fn from_le_bytes(shape: Shape, bytes: &[u8]) -> Result<Self, TensorError> {
        let expected = shape.size_bytes();
        if bytes.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { shape, data })
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns an immutable view over this tensor's data.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: &self.shape,
            data: &self.data,
        }
    }

    /// Returns the element buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the element buffer mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the tensor and returns its buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * crate::shape::F32_BYTES
    }

    /// Reinterprets the buffer under a new shape with the same element count.
    pub fn reshape(self, shape: Shape) -> Result<Self, TensorError> {
        if shape.num_elements() != self.data.len() {
            return Err(TensorError::ShapeMismatch {
                op: "reshape",
                lhs: self.shape,
                rhs: shape,
            });
        }
        Ok(Self {
            shape,
            data: self.data,
        })
    }

    /// Inserts a dimension of size 1 at `axis` (e.g. CHW → NCHW with `axis = 0`).
    pub fn unsqueeze(self, axis: usize) -> Result<Self, TensorError> {
        let mut dims = self.shape.dims().to_vec();
        if axis > dims.len() {
            return Err(TensorError::InvalidAxis {
                axis,
                rank: dims.len(),
            });
        }
        dims.insert(axis, 1);
        self.reshape(Shape::new(dims))
    }

    /// Flattens every dimension after the first: `[N, ...] → [N, prod(...)]`.
    pub fn flatten_batch(self) -> Result<Self, TensorError> {
        let n = self.shape.dim(0).unwrap_or(1);
        let rest = if n == 0 { 0 } else { self.data.len() / n };
        self.reshape(Shape::matrix(n, rest))
    }

    /// Returns `(min, max)` over all elements, or `None` for an empty tensor.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.data.iter().copied();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x))))
    }
}

/// A borrowed, read-only view over a [`Tensor`]'s data.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a> {
    shape: &'a Shape,
    data: &'a [f32],
}

impl<'a> TensorView<'a> {
    /// Creates a view from raw parts.
    pub fn from_parts(shape: &'a Shape, data: &'a [f32]) -> Result<Self, TensorError> {
        if shape.num_elements() != data.len() {
            return Err(TensorError::ElementCountMismatch {
                expected: shape.num_elements(),
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &'a Shape {
        self.shape
    }

    /// Returns the element slice.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }
}
