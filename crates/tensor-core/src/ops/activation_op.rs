// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise activations.

use crate::Tensor;

/// Rectified linear unit, applied in place: `x = max(x, 0)`.
pub fn relu_inplace(tensor: &mut Tensor) {
    tensor
        .as_mut_slice()
        .iter_mut()
        .for_each(|x| *x = x.max(0.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    #[test]
    fn test_relu() {
        let mut t = Tensor::from_slice(Shape::vector(4), &[-1.0, 0.0, 2.5, -0.1]).unwrap();
        relu_inplace(&mut t);
        assert_eq!(t.as_slice(), &[0.0, 0.0, 2.5, 0.0]);
    }
}
