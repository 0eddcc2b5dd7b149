// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sequential graph builder with shape inference.
//!
//! Each method appends one layer whose input is the previous layer's
//! output. The first failure is remembered and reported by
//! [`GraphBuilder::build`], so calls can be chained freely.

use crate::graph::{Loaded, Validated};
use crate::{LayerDef, LayerType, ModelError, ModelGraph};
use tensor_core::{
    conv2d_output_shape, linear_output_shape, max_pool2d_output_shape, Conv2dParams,
    Pool2dParams, Shape,
};

/// Builds a [`ModelGraph`] layer by layer.
#[derive(Debug)]
pub struct GraphBuilder {
    name: String,
    current: Shape,
    layers: Vec<LayerDef>,
    error: Option<ModelError>,
}

impl GraphBuilder {
    /// Starts a graph that consumes activations of `input_shape`.
    pub fn new(name: impl Into<String>, input_shape: Shape) -> Self {
        Self {
            name: name.into(),
            current: input_shape,
            layers: Vec::new(),
            error: None,
        }
    }

    /// Shape produced by the last appended layer.
    pub fn current_shape(&self) -> &Shape {
        &self.current
    }

    /// Appends a square-kernel convolution with bias.
    pub fn conv2d(
        self,
        name: &str,
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    ) -> Self {
        let layer_type = LayerType::Conv2d {
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
        };
        let weight = Shape::nchw(out_channels, in_channels, kernel_size, kernel_size);
        self.push(name, layer_type, |input| {
            let out = conv2d_output_shape(input, &weight, Conv2dParams { stride, padding })?;
            Ok((out, vec![weight.clone(), Shape::vector(out_channels)]))
        })
    }

    /// Appends a ReLU.
    pub fn relu(self, name: &str) -> Self {
        self.push(name, LayerType::Relu, |input| Ok((input.clone(), vec![])))
    }

    /// Appends a max pooling layer.
    pub fn max_pool2d(self, name: &str, kernel_size: usize, stride: usize, padding: usize) -> Self {
        let params = Pool2dParams {
            kernel_size,
            stride,
            padding,
        };
        let layer_type = LayerType::MaxPool2d {
            kernel_size,
            stride,
            padding,
        };
        self.push(name, layer_type, |input| {
            Ok((max_pool2d_output_shape(input, params)?, vec![]))
        })
    }

    /// Appends adaptive average pooling to `output_size`.
    pub fn adaptive_avg_pool2d(self, name: &str, output_size: (usize, usize)) -> Self {
        let layer_type = LayerType::AdaptiveAvgPool2d { output_size };
        self.push(name, layer_type, |input| {
            let (n, c, _, _) = input.as_nchw().ok_or_else(|| {
                format!("adaptive pooling needs a rank-4 input, got {input}")
            })?;
            Ok((Shape::nchw(n, c, output_size.0, output_size.1), vec![]))
        })
    }

    /// Appends a flatten of every axis after the batch axis.
    pub fn flatten(self, name: &str) -> Self {
        self.push(name, LayerType::Flatten, |input| match input.dims() {
            [n, rest @ ..] if !rest.is_empty() => {
                Ok((Shape::matrix(*n, rest.iter().product()), vec![]))
            }
            _ => Err(format!("cannot flatten {input}").into()),
        })
    }

    /// Appends a dropout layer (identity at inference).
    pub fn dropout(self, name: &str, p: f32) -> Self {
        self.push(name, LayerType::Dropout { p }, |input| {
            if !(0.0..1.0).contains(&p) {
                return Err(format!("dropout probability {p} outside [0, 1)").into());
            }
            Ok((input.clone(), vec![]))
        })
    }

    /// Appends a fully-connected layer with bias.
    pub fn linear(self, name: &str, in_features: usize, out_features: usize) -> Self {
        let layer_type = LayerType::Linear {
            in_features,
            out_features,
        };
        let weight = Shape::matrix(out_features, in_features);
        self.push(name, layer_type, |input| {
            let out = linear_output_shape(input, &weight)?;
            Ok((out, vec![weight.clone(), Shape::vector(out_features)]))
        })
    }

    /// Returns the assembled, unvalidated graph.
    pub fn finish(self) -> Result<ModelGraph<Loaded>, ModelError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(ModelGraph::new(self.name, self.layers)),
        }
    }

    /// Assembles and validates the graph.
    pub fn build(self) -> Result<ModelGraph<Validated>, ModelError> {
        self.finish()?.validate()
    }

    fn push<F>(mut self, name: &str, layer_type: LayerType, infer: F) -> Self
    where
        F: FnOnce(&Shape) -> Result<(Shape, Vec<Shape>), InferError>,
    {
        if self.error.is_some() {
            return self;
        }
        match infer(&self.current) {
            Ok((output_shape, weight_shapes)) => {
                let weight_names = match weight_shapes.len() {
                    0 => vec![],
                    _ => vec![format!("{name}.weight"), format!("{name}.bias")],
                };
                let input_shape = std::mem::replace(&mut self.current, output_shape.clone());
                self.layers.push(LayerDef {
                    name: name.to_string(),
                    layer_type,
                    index: self.layers.len(),
                    weight_names,
                    weight_shapes,
                    input_shape,
                    output_shape,
                });
            }
            Err(e) => {
                self.error = Some(ModelError::InvalidLayer {
                    layer: name.to_string(),
                    detail: e.0,
                });
            }
        }
        self
    }
}

/// Inference failure message, convertible from operator shape errors.
#[derive(Debug)]
struct InferError(String);

impl From<String> for InferError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<tensor_core::TensorError> for InferError {
    fn from(e: tensor_core::TensorError) -> Self {
        Self(e.to_string())
    }
}
