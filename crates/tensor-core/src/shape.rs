// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use std::fmt;

/// Size of one `f32` element in bytes.
pub const F32_BYTES: usize = 4;

/// Describes the dimensionality of a [`crate::Tensor`].
///
/// Image tensors use NCHW order (`[batch, channels, height, width]`),
/// dense activations use `[batch, features]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![1, 3, 224, 224]);
    /// assert_eq!(s.rank(), 4);
    /// assert_eq!(s.num_elements(), 150_528);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Creates a 4-D `[N, C, H, W]` image shape.
    pub fn nchw(n: usize, c: usize, h: usize, w: usize) -> Self {
        Self {
            dims: vec![n, c, h, w],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For a rank-0 shape, returns 1.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Memory footprint in bytes of an `f32` tensor with this shape.
    pub fn size_bytes(&self) -> usize {
        self.num_elements() * F32_BYTES
    }

    /// Splits a rank-4 shape into `(n, c, h, w)`.
    pub fn as_nchw(&self) -> Option<(usize, usize, usize, usize)> {
        match self.dims.as_slice() {
            &[n, c, h, w] => Some((n, c, h, w)),
            _ => None,
        }
    }

    /// Returns `true` if any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    /// Computes row-major (C-order) strides for this shape.
    pub fn strides(&self) -> Vec<usize> {
        let rank = self.dims.len();
        if rank == 0 {
            return vec![];
        }
        let mut strides = vec![0usize; rank];
        strides[rank - 1] = 1;
        for i in (0..rank - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nchw_shape() {
        let s = Shape::nchw(1, 3, 224, 224);
        assert_eq!(s.rank(), 4);
        assert_eq!(s.as_nchw(), Some((1, 3, 224, 224)));
        assert_eq!(s.size_bytes(), 3 * 224 * 224 * 4);
    }

    #[test]
    fn test_as_nchw_wrong_rank() {
        assert_eq!(Shape::matrix(2, 3).as_nchw(), None);
    }

    #[test]
    fn test_strides() {
        assert_eq!(Shape::new(vec![2, 3, 4]).strides(), vec![12, 4, 1]);
        assert_eq!(Shape::vector(5).strides(), vec![1]);
        assert!(Shape::new(vec![]).strides().is_empty());
    }

    #[test]
    fn test_is_empty() {
        assert!(Shape::nchw(1, 0, 4, 4).is_empty());
        assert!(!Shape::matrix(1, 1).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Shape::nchw(1, 3, 6, 6)), "[1, 3, 6, 6]");
    }

    #[test]
    fn test_from_conversions() {
        let a: Shape = vec![2, 3].into();
        let b: Shape = [2, 3].into();
        let c: Shape = (&[2, 3][..]).into();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }
}
