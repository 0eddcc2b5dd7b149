// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer definitions for CNN model IR.
//!
//! Each [`LayerDef`] describes a single computation in the model graph:
//! its operator and hyper-parameters, weight references, and the
//! activation shapes flowing in and out. Weight data is **not** stored
//! here, only names (keys into the SafeTensors file).

use tensor_core::{Conv2dParams, Pool2dParams, Shape};

/// The operator a layer performs, with its hyper-parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LayerType {
    /// 2-D convolution with a square kernel.
    Conv2d {
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    },
    /// Rectified linear unit.
    Relu,
    /// Max pooling over square windows.
    MaxPool2d {
        kernel_size: usize,
        stride: usize,
        padding: usize,
    },
    /// Adaptive average pooling to a fixed spatial size.
    AdaptiveAvgPool2d { output_size: (usize, usize) },
    /// `[N, C, H, W] → [N, C*H*W]`.
    Flatten,
    /// Dropout; identity at inference time.
    Dropout { p: f32 },
    /// Fully-connected layer.
    Linear {
        in_features: usize,
        out_features: usize,
    },
}

/// Coarse operator family, used for tile assignment and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Conv,
    FullyConnected,
    Activation,
    Pool,
    Reshape,
}

impl LayerType {
    /// Returns the operator family.
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Conv2d { .. } => OpKind::Conv,
            Self::Linear { .. } => OpKind::FullyConnected,
            Self::Relu | Self::Dropout { .. } => OpKind::Activation,
            Self::MaxPool2d { .. } | Self::AdaptiveAvgPool2d { .. } => OpKind::Pool,
            Self::Flatten => OpKind::Reshape,
        }
    }

    /// `true` for layers that carry weights and can be offloaded.
    pub fn has_weights(&self) -> bool {
        matches!(self.kind(), OpKind::Conv | OpKind::FullyConnected)
    }

    /// Convolution parameters, for `Conv2d` layers.
    pub fn conv_params(&self) -> Option<Conv2dParams> {
        match *self {
            Self::Conv2d { stride, padding, .. } => Some(Conv2dParams { stride, padding }),
            _ => None,
        }
    }

    /// Pooling window, for `MaxPool2d` layers.
    pub fn pool_params(&self) -> Option<Pool2dParams> {
        match *self {
            Self::MaxPool2d {
                kernel_size,
                stride,
                padding,
            } => Some(Pool2dParams {
                kernel_size,
                stride,
                padding,
            }),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conv2d { .. } => "conv2d",
            Self::Relu => "relu",
            Self::MaxPool2d { .. } => "max_pool2d",
            Self::AdaptiveAvgPool2d { .. } => "adaptive_avg_pool2d",
            Self::Flatten => "flatten",
            Self::Dropout { .. } => "dropout",
            Self::Linear { .. } => "linear",
        }
    }
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing a single layer in the model graph.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LayerDef {
    /// Unique identifier, matching the checkpoint prefix (e.g. `"features.0"`).
    pub name: String,
    /// The operator this layer performs.
    pub layer_type: LayerType,
    /// Index in the execution order (0-based).
    pub index: usize,
    /// Names of weight tensors, weight first then bias.
    pub weight_names: Vec<String>,
    /// Shapes of the weight tensors (parallel to `weight_names`).
    pub weight_shapes: Vec<Shape>,
    /// Shape of the layer's input activation.
    pub input_shape: Shape,
    /// Shape of the layer's output activation.
    pub output_shape: Shape,
}

impl LayerDef {
    /// Memory required for this layer's weights in bytes.
    pub fn estimated_weight_bytes(&self) -> usize {
        self.weight_shapes.iter().map(Shape::size_bytes).sum()
    }

    /// Memory required for the input and output activations in bytes.
    pub fn estimated_activation_bytes(&self) -> usize {
        self.input_shape.size_bytes() + self.output_shape.size_bytes()
    }

    /// Multiply-accumulate count of one forward pass (0 for weightless layers).
    pub fn macs(&self) -> u64 {
        match self.layer_type {
            LayerType::Conv2d {
                in_channels,
                kernel_size,
                ..
            } => {
                self.output_shape.num_elements() as u64
                    * (in_channels * kernel_size * kernel_size) as u64
            }
            LayerType::Linear { in_features, .. } => {
                self.output_shape.num_elements() as u64 * in_features as u64
            }
            _ => 0,
        }
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} ({}) {} -> {}, weights: {:.1} KB, {} MACs",
            self.index,
            self.name,
            self.layer_type,
            self.input_shape,
            self.output_shape,
            self.estimated_weight_bytes() as f64 / 1024.0,
            self.macs(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv_layer() -> LayerDef {
        LayerDef {
            name: "features.0".into(),
            layer_type: LayerType::Conv2d {
                in_channels: 3,
                out_channels: 64,
                kernel_size: 11,
                stride: 4,
                padding: 2,
            },
            index: 0,
            weight_names: vec!["features.0.weight".into(), "features.0.bias".into()],
            weight_shapes: vec![Shape::nchw(64, 3, 11, 11), Shape::vector(64)],
            input_shape: Shape::nchw(1, 3, 224, 224),
            output_shape: Shape::nchw(1, 64, 55, 55),
        }
    }

    #[test]
    fn test_weight_bytes() {
        assert_eq!(conv_layer().estimated_weight_bytes(), (64 * 3 * 121 + 64) * 4);
    }

    #[test]
    fn test_conv_macs() {
        assert_eq!(conv_layer().macs(), 64 * 55 * 55 * 3 * 121);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(conv_layer().layer_type.kind(), OpKind::Conv);
        assert!(conv_layer().layer_type.has_weights());
        assert!(!LayerType::Relu.has_weights());
        assert_eq!(LayerType::Dropout { p: 0.5 }.kind(), OpKind::Activation);
        assert_eq!(
            LayerType::Linear { in_features: 4, out_features: 2 }.kind(),
            OpKind::FullyConnected
        );
    }

    #[test]
    fn test_params_accessors() {
        let conv = conv_layer().layer_type;
        assert_eq!(conv.conv_params(), Some(Conv2dParams { stride: 4, padding: 2 }));
        assert_eq!(conv.pool_params(), None);
    }

    #[test]
    fn test_summary() {
        let s = conv_layer().summary();
        assert!(s.contains("[0]"));
        assert!(s.contains("conv2d"));
        assert!(s.contains("[1, 64, 55, 55]"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let layer = conv_layer();
        let json = serde_json::to_string(&layer).unwrap();
        assert!(json.contains("\"op\":\"conv2d\""));
        let back: LayerDef = serde_json::from_str(&json).unwrap();
        assert_eq!(back.layer_type, layer.layer_type);
        assert_eq!(back.weight_names, layer.weight_names);
    }
}
