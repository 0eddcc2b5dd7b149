// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: a CNN as an ordered chain of layers.
//!
//! # Type-State Pattern
//!
//! ```text
//! ModelGraph<Loaded>     — layers assembled, not yet checked.
//!       │  .validate()
//!       ▼
//! ModelGraph<Validated>  — shapes chain end to end, ready to execute.
//! ```
//!
//! Only a `Validated` graph can be handed to the inference engine.

use crate::{LayerDef, ModelError, OpKind};
use std::collections::HashSet;
use std::fmt;
use tensor_core::Shape;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been assembled but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and can be executed.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

/// Number of layers of each offloadable kind.
///
/// The accelerator needs exactly one tile per convolution and one per
/// fully-connected layer, so these counts size the tile lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct LayerCounts {
    pub conv: usize,
    pub fc: usize,
}

// ── ModelGraph ─────────────────────────────────────────────────────

/// The complete model represented as an ordered sequence of layers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelGraph<S: GraphState = Loaded> {
    /// Human-readable model name (e.g., `"alexnet"`).
    pub name: String,
    /// Ordered list of layer definitions.
    pub layers: Vec<LayerDef>,
    #[serde(skip)]
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Creates a new graph in the `Loaded` state.
    pub fn new(name: String, layers: Vec<LayerDef>) -> Self {
        Self {
            name,
            layers,
            _state: std::marker::PhantomData,
        }
    }

    /// Parses a graph previously written with [`ModelGraph::to_json`].
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        #[derive(serde::Deserialize)]
        struct Raw {
            name: String,
            layers: Vec<LayerDef>,
        }
        let raw: Raw = serde_json::from_str(json)?;
        Ok(Self::new(raw.name, raw.layers))
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - The graph is non-empty and layer names are unique.
    /// - Layer indices are consecutive starting from 0.
    /// - No shape has zero elements.
    /// - Every weight name has a matching shape.
    /// - Each layer's output shape equals the next layer's input shape.
    pub fn validate(self) -> Result<ModelGraph<Validated>, ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::InvalidGraph(
                "model graph contains no layers".into(),
            ));
        }

        let mut seen = HashSet::new();
        for (i, layer) in self.layers.iter().enumerate() {
            if !seen.insert(layer.name.as_str()) {
                return Err(ModelError::InvalidGraph(format!(
                    "duplicate layer name '{}'",
                    layer.name
                )));
            }
            if layer.index != i {
                return Err(invalid(layer, format!("expected index {i}, got {}", layer.index)));
            }
            if layer.input_shape.num_elements() == 0 {
                return Err(invalid(layer, "input shape has zero elements".into()));
            }
            if layer.output_shape.num_elements() == 0 {
                return Err(invalid(layer, "output shape has zero elements".into()));
            }
            if layer.weight_names.len() != layer.weight_shapes.len() {
                return Err(invalid(
                    layer,
                    format!(
                        "{} weight names but {} weight shapes",
                        layer.weight_names.len(),
                        layer.weight_shapes.len()
                    ),
                ));
            }
        }

        for pair in self.layers.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if current.output_shape != next.input_shape {
                return Err(ModelError::InvalidGraph(format!(
                    "'{}' produces {} but '{}' expects {}",
                    current.name, current.output_shape, next.name, next.input_shape,
                )));
            }
        }

        tracing::debug!(model = %self.name, layers = self.layers.len(), "graph validated");

        Ok(ModelGraph {
            name: self.name,
            layers: self.layers,
            _state: std::marker::PhantomData,
        })
    }
}

fn invalid(layer: &LayerDef, detail: String) -> ModelError {
    ModelError::InvalidLayer {
        layer: layer.name.clone(),
        detail,
    }
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    /// Returns the total number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Shape the first layer consumes.
    pub fn input_shape(&self) -> &Shape {
        // Validation guarantees at least one layer.
        &self.layers[0].input_shape
    }

    /// Shape the last layer produces.
    pub fn output_shape(&self) -> &Shape {
        &self.layers[self.layers.len() - 1].output_shape
    }

    /// Counts convolution and fully-connected layers.
    pub fn layer_counts(&self) -> LayerCounts {
        self.layers
            .iter()
            .fold(LayerCounts::default(), |mut acc, l| {
                match l.layer_type.kind() {
                    OpKind::Conv => acc.conv += 1,
                    OpKind::FullyConnected => acc.fc += 1,
                    _ => {}
                }
                acc
            })
    }

    /// Returns the total estimated memory for all weights in bytes.
    pub fn total_weight_bytes(&self) -> usize {
        self.layers.iter().map(LayerDef::estimated_weight_bytes).sum()
    }

    /// Total multiply-accumulates of one forward pass.
    pub fn total_macs(&self) -> u64 {
        self.layers.iter().map(LayerDef::macs).sum()
    }

    /// Returns an iterator over the layers in execution order.
    pub fn iter_layers(&self) -> impl Iterator<Item = &LayerDef> {
        self.layers.iter()
    }

    /// Returns a reference to a layer by index.
    pub fn layer(&self, index: usize) -> Option<&LayerDef> {
        self.layers.get(index)
    }

    /// Serialises the graph to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        let counts = self.layer_counts();
        format!(
            "Model '{}': {} layers ({} conv, {} fc), {:.1} MB weights, {:.2} GMACs",
            self.name,
            self.num_layers(),
            counts.conv,
            counts.fc,
            self.total_weight_bytes() as f64 / (1024.0 * 1024.0),
            self.total_macs() as f64 / 1e9,
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModelGraph '{}' ({} layers):", self.name, self.layers.len())?;
        for layer in &self.layers {
            writeln!(f, "  {}", layer.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LayerType;

    /// Helper: a chain of `n` square linear layers.
    fn make_layers(n: usize, width: usize) -> Vec<LayerDef> {
        (0..n)
            .map(|i| LayerDef {
                name: format!("fc.{i}"),
                layer_type: LayerType::Linear {
                    in_features: width,
                    out_features: width,
                },
                index: i,
                weight_names: vec![format!("fc.{i}.weight")],
                weight_shapes: vec![Shape::matrix(width, width)],
                input_shape: Shape::matrix(1, width),
                output_shape: Shape::matrix(1, width),
            })
            .collect()
    }

    #[test]
    fn test_validate_ok() {
        let validated = ModelGraph::new("test".into(), make_layers(4, 16))
            .validate()
            .unwrap();
        assert_eq!(validated.num_layers(), 4);
        assert_eq!(validated.input_shape(), &Shape::matrix(1, 16));
        assert_eq!(validated.output_shape(), &Shape::matrix(1, 16));
    }

    #[test]
    fn test_validate_empty() {
        let graph = ModelGraph::new("empty".into(), vec![]);
        assert!(matches!(graph.validate(), Err(ModelError::InvalidGraph(_))));
    }

    #[test]
    fn test_validate_bad_index() {
        let mut layers = make_layers(3, 16);
        layers[1].index = 5;
        let graph = ModelGraph::new("bad".into(), layers);
        assert!(matches!(graph.validate(), Err(ModelError::InvalidLayer { .. })));
    }

    #[test]
    fn test_validate_zero_shape() {
        let mut layers = make_layers(2, 16);
        layers[0].input_shape = Shape::new(vec![0, 16]);
        assert!(ModelGraph::new("zero".into(), layers).validate().is_err());
    }

    #[test]
    fn test_validate_broken_chain() {
        let mut layers = make_layers(2, 16);
        layers[1].input_shape = Shape::matrix(1, 32);
        let err = ModelGraph::new("chain".into(), layers).validate().unwrap_err();
        assert!(err.to_string().contains("'fc.1' expects [1, 32]"));
    }

    #[test]
    fn test_validate_duplicate_name() {
        let mut layers = make_layers(2, 16);
        layers[1].name = "fc.0".into();
        assert!(ModelGraph::new("dup".into(), layers).validate().is_err());
    }

    #[test]
    fn test_validate_weight_arity() {
        let mut layers = make_layers(1, 16);
        layers[0].weight_names.push("fc.0.bias".into());
        assert!(ModelGraph::new("arity".into(), layers).validate().is_err());
    }

    #[test]
    fn test_layer_counts_and_macs() {
        let validated = ModelGraph::new("test".into(), make_layers(3, 8))
            .validate()
            .unwrap();
        assert_eq!(validated.layer_counts(), LayerCounts { conv: 0, fc: 3 });
        assert_eq!(validated.total_macs(), 3 * 8 * 8);
        assert_eq!(validated.total_weight_bytes(), 3 * 8 * 8 * 4);
    }

    #[test]
    fn test_summary_and_display() {
        let graph = ModelGraph::new("tiny".into(), make_layers(2, 4));
        let display = format!("{graph}");
        assert!(display.contains("fc.0"));
        assert!(display.contains("fc.1"));

        let s = graph.validate().unwrap().summary();
        assert!(s.contains("tiny"));
        assert!(s.contains("2 layers (0 conv, 2 fc)"));
    }

    #[test]
    fn test_json_roundtrip() {
        let validated = ModelGraph::new("json".into(), make_layers(2, 4))
            .validate()
            .unwrap();
        let json = validated.to_json().unwrap();
        let back = ModelGraph::from_json(&json).unwrap().validate().unwrap();
        assert_eq!(back.name, "json");
        assert_eq!(back.num_layers(), 2);
    }

    #[test]
    fn test_layer_access() {
        let validated = ModelGraph::new("test".into(), make_layers(3, 4))
            .validate()
            .unwrap();
        assert_eq!(validated.layer(2).unwrap().name, "fc.2");
        assert!(validated.layer(3).is_none());
        let names: Vec<_> = validated.iter_layers().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["fc.0", "fc.1", "fc.2"]);
    }
}
