// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The core inference engine with type-state–enforced pipeline.
//!
//! ```text
//! InferenceEngine<Idle>
//!     │  .attach(ConfiguredArchitecture)
//!     ▼
//! InferenceEngine<Configured>
//!     │  .load_model(graph)
//!     ▼
//! InferenceEngine<Ready>
//!     │  .run(&batch)
//!     ▼
//!   InferenceOutput
//! ```
//!
//! Each state transition consumes the old value and returns a new one,
//! so running a model before the accelerator is configured is a compile
//! error.

use crate::metrics::{LayerMetrics, Placement, Stopwatch};
use crate::{InferenceMetrics, RuntimeConfig, RuntimeError, WeightLoader};
use accel_sim::{Accelerator, ConfiguredArchitecture, OffloadRecord, Simulator};
use model_ir::{graph::Validated, LayerCounts, LayerDef, LayerType, ModelGraph};
use tensor_core::{Shape, Tensor};

/// Batch shape every model run through the engine must accept.
pub const INPUT_SHAPE: [usize; 4] = [1, 3, 224, 224];

// ── Type-state markers ─────────────────────────────────────────

/// Engine is created but has no accelerator.
#[derive(Debug)]
pub struct Idle;

/// An accelerator is attached; no model yet.
#[derive(Debug)]
pub struct Configured;

/// Engine is ready to run inference.
#[derive(Debug)]
pub struct Ready;

/// Sealed trait for engine states.
pub trait EngineState: std::fmt::Debug {}
impl EngineState for Idle {}
impl EngineState for Configured {}
impl EngineState for Ready {}

// ── Inference output ───────────────────────────────────────────

/// The result of a single inference run.
#[derive(Debug)]
pub struct InferenceOutput {
    /// Raw network output, `[1, num_classes]`.
    pub logits: Tensor,
    /// Best classes as `(class index, probability)`, highest first.
    pub top_k: Vec<(usize, f32)>,
    /// One record per offloaded layer, in execution order.
    pub offloads: Vec<OffloadRecord>,
    /// Per-layer and overall timing.
    pub metrics: InferenceMetrics,
}

// ── Engine ─────────────────────────────────────────────────────

/// The primary inference engine.
///
/// `S` is a type-state marker that enforces the pipeline ordering at
/// compile time. You cannot call `.run()` on an `Idle` engine or
/// `.load_model()` before an accelerator is attached.
///
/// # Example
/// ```no_run
/// use runtime::{InferenceEngine, RuntimeConfig};
/// # fn example(
/// #     arch: accel_sim::ConfiguredArchitecture,
/// #     batch: tensor_core::Tensor,
/// # ) -> Result<(), runtime::RuntimeError> {
/// let mut engine = InferenceEngine::new(RuntimeConfig::default())
///     .attach(arch)
///     .load_model(model_ir::zoo::alexnet(1000)?)?;
/// let output = engine.run(&batch)?;
/// println!("{}", output.metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct InferenceEngine<S: EngineState = Idle> {
    config: RuntimeConfig,
    _state: std::marker::PhantomData<S>,
    // Fields populated as the engine transitions through states:
    accelerator: Option<Box<dyn Accelerator>>,
    tile_counts: Option<LayerCounts>,
    graph: Option<ModelGraph<Validated>>,
    weight_loader: Option<WeightLoader>,
    /// Weights per layer, indexed like the graph. Empty for weightless layers.
    weights: Vec<Vec<Tensor>>,
}

// ── Idle → Configured ──────────────────────────────────────────

impl InferenceEngine<Idle> {
    /// Creates a new engine from the given configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        tracing::info!(
            "engine created (profiling {}, top-{})",
            if config.enable_profiling { "on" } else { "off" },
            config.top_k,
        );
        Self {
            config,
            _state: std::marker::PhantomData,
            accelerator: None,
            tile_counts: None,
            graph: None,
            weight_loader: None,
            weights: Vec::new(),
        }
    }

    /// Attaches the tile-driven simulator for `arch`.
    pub fn attach(self, arch: ConfiguredArchitecture) -> InferenceEngine<Configured> {
        let counts = arch.layer_counts();
        tracing::info!(
            config = %arch.config_path().display(),
            ms_size = arch.ms_size(),
            "attaching simulator"
        );
        self.attach_accelerator(Box::new(Simulator::new(arch)), counts)
    }

    /// Attaches any [`Accelerator`] that holds tiles for `counts` layers.
    pub fn attach_accelerator(
        self,
        accelerator: Box<dyn Accelerator>,
        counts: LayerCounts,
    ) -> InferenceEngine<Configured> {
        InferenceEngine {
            config: self.config,
            _state: std::marker::PhantomData,
            accelerator: Some(accelerator),
            tile_counts: Some(counts),
            graph: None,
            weight_loader: None,
            weights: Vec::new(),
        }
    }
}

// ── Configured → Ready ─────────────────────────────────────────

impl InferenceEngine<Configured> {
    /// Name of the attached accelerator.
    pub fn accelerator_name(&self) -> &str {
        self.accelerator
            .as_ref()
            .expect("accelerator must exist in Configured state")
            .name()
    }

    /// Binds the model and loads its weights.
    /// Transitions to the `Ready` state.
    ///
    /// Steps:
    /// 1. Check the model takes a `[1, 3, 224, 224]` batch.
    /// 2. Check the model's conv/fc counts match the attached tiles.
    /// 3. Open the checkpoint (or fall back to synthetic weights) and
    ///    verify it against the graph.
    /// 4. Load every layer's weights up front, so `run` does no I/O.
    pub fn load_model(
        self,
        graph: ModelGraph<Validated>,
    ) -> Result<InferenceEngine<Ready>, RuntimeError> {
        let expected = Shape::new(INPUT_SHAPE.to_vec());
        if graph.input_shape() != &expected {
            return Err(RuntimeError::InputShapeMismatch {
                expected,
                actual: graph.input_shape().clone(),
            });
        }

        let configured = self
            .tile_counts
            .expect("tile counts must exist in Configured state");
        let model = graph.layer_counts();
        if configured != model {
            return Err(RuntimeError::TileCountMismatch { configured, model });
        }
        tracing::info!("{}", graph.summary());

        let loader = WeightLoader::new(self.config.model_path.as_deref())?;
        if let Some(path) = loader.path() {
            model_ir::WeightIndex::read(path)?.verify(&graph)?;
        }
        tracing::info!(
            "weight loader: {} mode",
            if loader.is_file_backed() { "file-backed" } else { "synthetic" }
        );

        let weights = graph
            .iter_layers()
            .map(|layer| loader.load_layer_weights(layer))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InferenceEngine {
            config: self.config,
            _state: std::marker::PhantomData,
            accelerator: self.accelerator,
            tile_counts: self.tile_counts,
            graph: Some(graph),
            weight_loader: Some(loader),
            weights,
        })
    }
}

// ── Ready: run inference ───────────────────────────────────────

impl InferenceEngine<Ready> {
    /// Returns the model graph.
    pub fn graph(&self) -> &ModelGraph<Validated> {
        self.graph.as_ref().expect("graph exists in Ready state")
    }

    /// Returns the weight loader the model was loaded with.
    pub fn weight_loader(&self) -> &WeightLoader {
        self.weight_loader
            .as_ref()
            .expect("weight loader exists in Ready state")
    }

    /// Name of the attached accelerator.
    pub fn accelerator_name(&self) -> &str {
        self.accelerator
            .as_ref()
            .expect("accelerator exists in Ready state")
            .name()
    }

    /// Runs one forward pass over `input`.
    ///
    /// Layers execute in graph order. Conv2d and Linear layers the
    /// accelerator supports are offloaded; everything else runs on the
    /// host. The logits are then softmaxed to produce the top-k classes.
    pub fn run(&mut self, input: &Tensor) -> Result<InferenceOutput, RuntimeError> {
        let run_clock = Stopwatch::start();
        let profiling = self.config.enable_profiling;
        let top_k = self.config.top_k;

        let graph = self.graph.as_ref().expect("graph exists in Ready state");
        let accelerator = self
            .accelerator
            .as_mut()
            .expect("accelerator exists in Ready state");

        if input.shape() != graph.input_shape() {
            return Err(RuntimeError::InputShapeMismatch {
                expected: graph.input_shape().clone(),
                actual: input.shape().clone(),
            });
        }

        accelerator.reset();
        let mut metrics = InferenceMetrics::new();
        let mut offloads = Vec::new();
        let mut activation = input.clone();

        tracing::debug!("starting inference: {} layers", graph.num_layers());

        for layer in graph.iter_layers() {
            let weights = self.weights.get(layer.index).map_or(&[][..], Vec::as_slice);
            let layer_clock = Stopwatch::start();

            let (output, placement, record) = if accelerator.supports(layer) {
                let (out, record) = offload_layer(accelerator.as_mut(), layer, &activation, weights)?;
                (out, Placement::Accelerator, Some(record))
            } else {
                (host_layer(layer, activation, weights)?, Placement::Host, None)
            };
            activation = output;

            let folds = record.as_ref().map(|r| r.folds);
            let macs = record.as_ref().map_or(0, |r| r.macs);
            metrics.record_layer(
                LayerMetrics {
                    layer_name: layer.name.clone(),
                    op: layer.layer_type.as_str(),
                    placement,
                    compute_duration: layer_clock.elapsed(),
                    folds,
                },
                macs,
                profiling,
            );
            offloads.extend(record);
        }

        let top_k = rank_classes(&activation, top_k)?;

        metrics.finalise(run_clock.elapsed());
        tracing::info!("{}", metrics.summary());

        Ok(InferenceOutput {
            logits: activation,
            top_k,
            offloads,
            metrics,
        })
    }
}

// ── Layer execution ────────────────────────────────────────────

fn exec_err(layer: &LayerDef) -> impl FnOnce(tensor_core::TensorError) -> RuntimeError + '_ {
    move |source| RuntimeError::ExecutionError {
        layer: layer.name.clone(),
        source,
    }
}

fn offload_layer(
    accelerator: &mut dyn Accelerator,
    layer: &LayerDef,
    input: &Tensor,
    weights: &[Tensor],
) -> Result<(Tensor, OffloadRecord), RuntimeError> {
    let (weight, bias) = split_weights(layer, weights)?;
    let bias = bias.map(Tensor::view);
    let mut output = Tensor::zeros(layer.output_shape.clone());
    let record = match layer.layer_type {
        LayerType::Conv2d { .. } => {
            accelerator.conv2d(layer, &input.view(), &weight.view(), bias.as_ref(), &mut output)?
        }
        _ => accelerator.linear(layer, &input.view(), &weight.view(), bias.as_ref(), &mut output)?,
    };
    Ok((output, record))
}

fn host_layer(layer: &LayerDef, input: Tensor, weights: &[Tensor]) -> Result<Tensor, RuntimeError> {
    // In-place and identity layers return early; the rest fill `output`.
    let mut output = match layer.layer_type {
        LayerType::Relu => {
            let mut t = input;
            tensor_core::relu_inplace(&mut t);
            return Ok(t);
        }
        LayerType::Flatten => {
            return input
                .reshape(layer.output_shape.clone())
                .map_err(exec_err(layer));
        }
        // Identity at inference time.
        LayerType::Dropout { .. } => return Ok(input),
        _ => Tensor::zeros(layer.output_shape.clone()),
    };
    match layer.layer_type {
        LayerType::Conv2d { stride, padding, .. } => {
            let (weight, bias) = split_weights(layer, weights)?;
            let bias = bias.map(Tensor::view);
            tensor_core::conv2d(
                &input.view(),
                &weight.view(),
                bias.as_ref(),
                tensor_core::Conv2dParams { stride, padding },
                &mut output,
            )
            .map_err(exec_err(layer))?;
        }
        LayerType::Linear { .. } => {
            let (weight, bias) = split_weights(layer, weights)?;
            let bias = bias.map(Tensor::view);
            tensor_core::linear(&input.view(), &weight.view(), bias.as_ref(), &mut output)
                .map_err(exec_err(layer))?;
        }
        LayerType::MaxPool2d {
            kernel_size,
            stride,
            padding,
        } => {
            let params = tensor_core::Pool2dParams {
                kernel_size,
                stride,
                padding,
            };
            tensor_core::max_pool2d(&input.view(), params, &mut output).map_err(exec_err(layer))?;
        }
        LayerType::AdaptiveAvgPool2d { .. } => {
            tensor_core::adaptive_avg_pool2d(&input.view(), &mut output)
                .map_err(exec_err(layer))?;
        }
        LayerType::Relu | LayerType::Flatten | LayerType::Dropout { .. } => {}
    }
    Ok(output)
}

fn split_weights<'a>(
    layer: &LayerDef,
    weights: &'a [Tensor],
) -> Result<(&'a Tensor, Option<&'a Tensor>), RuntimeError> {
    match weights {
        [weight] => Ok((weight, None)),
        [weight, bias] => Ok((weight, Some(bias))),
        _ => Err(RuntimeError::WeightLoadError {
            layer: layer.name.clone(),
            detail: format!("expected weight and optional bias, got {} tensors", weights.len()),
        }),
    }
}

/// Softmax over the class dimension, then the `k` most probable classes.
fn rank_classes(logits: &Tensor, k: usize) -> Result<Vec<(usize, f32)>, RuntimeError> {
    let mut probs = Tensor::zeros(logits.shape().clone());
    tensor_core::softmax(&logits.view(), &mut probs).map_err(|source| {
        RuntimeError::ExecutionError {
            layer: "softmax".into(),
            source,
        }
    })?;
    let classes = logits.shape().dims().last().copied().unwrap_or(0);
    let mut ranked: Vec<(usize, f32)> = probs
        .as_slice()
        .iter()
        .take(classes)
        .copied()
        .enumerate()
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);
    Ok(ranked)
}

impl<S: EngineState> std::fmt::Debug for InferenceEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("state", &std::any::type_name::<S>())
            .field(
                "accelerator",
                &self.accelerator.as_ref().map(|a| a.name().to_string()),
            )
            .field("tile_counts", &self.tile_counts)
            .field("has_graph", &self.graph.is_some())
            .field("profiling", &self.config.enable_profiling)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accel_sim::ArchitectureDescriptor;
    use model_ir::GraphBuilder;

    /// Writes one conv and one fc tile and freezes a small architecture.
    fn configured(tag: &str) -> ConfiguredArchitecture {
        let dir = std::env::temp_dir().join(format!("runtime_engine_{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let conv = dir.join("conv.txt");
        let fc = dir.join("fc.txt");
        std::fs::write(&conv, "tile_type=\"CONV\"\nT_R=2\nT_S=2\nT_K=2\nT_X'=2\n").unwrap();
        std::fs::write(&fc, "tile_type=\"FC\"\nT_M=4\nT_K=8\n").unwrap();

        let mut arch = ArchitectureDescriptor::with_mesh(32, 8, 8);
        arch.load_tile_config(vec![conv], vec![fc], LayerCounts { conv: 1, fc: 1 })
            .unwrap();
        let configured = arch.create_config_file(&dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        configured
    }

    /// conv → relu → pool → adaptive pool → flatten → dropout → linear.
    fn tiny_graph() -> ModelGraph<Validated> {
        GraphBuilder::new("tiny", Shape::new(INPUT_SHAPE.to_vec()))
            .conv2d("features.0", 3, 2, 8, 8, 0)
            .relu("features.1")
            .max_pool2d("features.2", 2, 2, 0)
            .adaptive_avg_pool2d("avgpool", (2, 2))
            .flatten("flatten")
            .dropout("classifier.0", 0.5)
            .linear("classifier.1", 8, 4)
            .build()
            .unwrap()
    }

    fn ready(tag: &str, config: RuntimeConfig) -> InferenceEngine<Ready> {
        InferenceEngine::new(config)
            .attach(configured(tag))
            .load_model(tiny_graph())
            .unwrap()
    }

    #[test]
    fn test_idle_to_configured() {
        let engine = InferenceEngine::new(RuntimeConfig::default()).attach(configured("attach"));
        assert_eq!(engine.accelerator_name(), "stonne-sim");
    }

    #[test]
    fn test_load_model_rejects_tile_mismatch() {
        let graph = GraphBuilder::new("two_fc", Shape::new(INPUT_SHAPE.to_vec()))
            .conv2d("c", 3, 2, 8, 8, 0)
            .flatten("flatten")
            .linear("fc0", 2 * 28 * 28, 4)
            .linear("fc1", 4, 2)
            .build()
            .unwrap();
        let err = InferenceEngine::new(RuntimeConfig::default())
            .attach(configured("mismatch"))
            .load_model(graph)
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::TileCountMismatch { configured, model }
                if configured.fc == 1 && model.fc == 2
        ));
    }

    #[test]
    fn test_load_model_rejects_wrong_input() {
        let graph = GraphBuilder::new("small", Shape::nchw(1, 3, 32, 32))
            .conv2d("c", 3, 2, 8, 8, 0)
            .flatten("flatten")
            .linear("fc", 32, 4)
            .build()
            .unwrap();
        let err = InferenceEngine::new(RuntimeConfig::default())
            .attach(configured("input"))
            .load_model(graph)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InputShapeMismatch { .. }));
    }

    #[test]
    fn test_full_pipeline() {
        let mut engine = ready("full", RuntimeConfig::default());
        assert!(!engine.weight_loader().is_file_backed());

        let input = Tensor::full(engine.graph().input_shape().clone(), 0.25);
        let output = engine.run(&input).unwrap();

        assert_eq!(output.logits.shape(), &Shape::matrix(1, 4));
        // Zero weights give equal logits, so class order falls back to index.
        assert_eq!(output.top_k.len(), 4);
        assert_eq!(output.top_k[0].0, 0);
        assert!((output.top_k[0].1 - 0.25).abs() < 1e-6);

        assert_eq!(output.offloads.len(), 2);
        assert_eq!(output.offloads[0].layer, "features.0");
        assert_eq!(output.offloads[1].layer, "classifier.1");
        // Conv: R,S 8/2 each, C 3/1, K 2/2, X 28/2, Y 28/1.
        assert_eq!(output.offloads[0].folds, 4 * 4 * 3 * 14 * 28);
        // FC: M 4/4, K 8/8.
        assert_eq!(output.offloads[1].folds, 1);

        assert_eq!(output.metrics.layer_metrics.len(), 7);
        assert_eq!(output.metrics.total_folds, 4 * 4 * 3 * 14 * 28 + 1);
        assert_eq!(output.metrics.layer_metrics[1].placement, Placement::Host);
    }

    #[test]
    fn test_top_k_respects_config() {
        let config = RuntimeConfig {
            top_k: 2,
            enable_profiling: false,
            ..Default::default()
        };
        let mut engine = ready("topk", config);
        let input = Tensor::zeros(engine.graph().input_shape().clone());
        let output = engine.run(&input).unwrap();
        assert_eq!(output.top_k.len(), 2);
        assert!(output.metrics.layer_metrics.is_empty());
    }

    #[test]
    fn test_multiple_runs_restart_tiles() {
        let mut engine = ready("repeat", RuntimeConfig::default());
        let input = Tensor::zeros(engine.graph().input_shape().clone());
        for _ in 0..3 {
            let output = engine.run(&input).unwrap();
            assert_eq!(output.offloads[0].tile_index, 0);
            assert_eq!(output.offloads[1].tile_index, 0);
        }
    }

    #[test]
    fn test_run_rejects_wrong_batch() {
        let mut engine = ready("batch", RuntimeConfig::default());
        let err = engine
            .run(&Tensor::zeros(Shape::nchw(1, 3, 32, 32)))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InputShapeMismatch { .. }));
    }

    #[test]
    fn test_rank_classes() {
        let logits = Tensor::from_slice(Shape::matrix(1, 4), &[0.0, 3.0, 1.0, 3.0]).unwrap();
        let ranked = rank_classes(&logits, 3).unwrap();
        assert_eq!(ranked.iter().map(|r| r.0).collect::<Vec<_>>(), vec![1, 3, 2]);
        let total: f32 = rank_classes(&logits, 4).unwrap().iter().map(|r| r.1).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_debug_format() {
        let engine = InferenceEngine::new(RuntimeConfig::default());
        let debug = format!("{engine:?}");
        assert!(debug.contains("InferenceEngine"));
        assert!(debug.contains("Idle"));
    }
}
