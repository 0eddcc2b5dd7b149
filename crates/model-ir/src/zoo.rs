// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference network definitions.

use crate::graph::Validated;
use crate::{GraphBuilder, ModelError, ModelGraph};
use tensor_core::Shape;

/// Input resolution of [`alexnet`].
pub const ALEXNET_INPUT: usize = 224;

/// AlexNet (single-GPU variant) for a `[1, 3, 224, 224]` input.
///
/// Layer names follow the usual PyTorch checkpoint keys (`features.0`,
/// `classifier.1`, ...) so pretrained SafeTensors exports load directly.
pub fn alexnet(num_classes: usize) -> Result<ModelGraph<Validated>, ModelError> {
    GraphBuilder::new("alexnet", Shape::nchw(1, 3, ALEXNET_INPUT, ALEXNET_INPUT))
        .conv2d("features.0", 3, 64, 11, 4, 2)
        .relu("features.1")
        .max_pool2d("features.2", 3, 2, 0)
        .conv2d("features.3", 64, 192, 5, 1, 2)
        .relu("features.4")
        .max_pool2d("features.5", 3, 2, 0)
        .conv2d("features.6", 192, 384, 3, 1, 1)
        .relu("features.7")
        .conv2d("features.8", 384, 256, 3, 1, 1)
        .relu("features.9")
        .conv2d("features.10", 256, 256, 3, 1, 1)
        .relu("features.11")
        .max_pool2d("features.12", 3, 2, 0)
        .adaptive_avg_pool2d("avgpool", (6, 6))
        .flatten("flatten")
        .dropout("classifier.0", 0.5)
        .linear("classifier.1", 256 * 6 * 6, 4096)
        .relu("classifier.2")
        .dropout("classifier.3", 0.5)
        .linear("classifier.4", 4096, 4096)
        .relu("classifier.5")
        .linear("classifier.6", 4096, num_classes)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LayerCounts;

    #[test]
    fn test_alexnet_shapes() {
        let g = alexnet(1000).unwrap();
        assert_eq!(g.num_layers(), 22);
        assert_eq!(g.input_shape(), &Shape::nchw(1, 3, 224, 224));
        assert_eq!(g.output_shape(), &Shape::matrix(1, 1000));

        let spatial: Vec<_> = g
            .iter_layers()
            .filter(|l| l.name.starts_with("features."))
            .map(|l| l.output_shape.dim(2).unwrap())
            .collect();
        assert_eq!(spatial, [55, 55, 27, 27, 27, 13, 13, 13, 13, 13, 13, 13, 6]);
        assert_eq!(g.layer(14).unwrap().output_shape, Shape::matrix(1, 9216));
    }

    #[test]
    fn test_alexnet_counts() {
        let g = alexnet(1000).unwrap();
        assert_eq!(g.layer_counts(), LayerCounts { conv: 5, fc: 3 });
    }

    #[test]
    fn test_alexnet_parameter_count() {
        // 61,100,840 parameters in the standard 1000-class model.
        let g = alexnet(1000).unwrap();
        assert_eq!(g.total_weight_bytes(), 61_100_840 * 4);
    }

    #[test]
    fn test_alexnet_custom_head() {
        let g = alexnet(10).unwrap();
        assert_eq!(g.output_shape(), &Shape::matrix(1, 10));
        assert_eq!(g.layer(21).unwrap().weight_shapes[0], Shape::matrix(10, 4096));
    }
}
