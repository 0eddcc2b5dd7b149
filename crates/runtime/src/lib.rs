// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! The execution engine that runs an image classifier with its conv and
//! dense layers offloaded to an accelerator.
//!
//! The runtime takes:
//! - A validated `ModelGraph` from `model-ir`.
//! - A `ConfiguredArchitecture` (or any `Accelerator`) from `accel-sim`.
//! - An optional SafeTensors checkpoint.
//!
//! And executes the model layer by layer, routing weighted layers to the
//! accelerator and the rest to host kernels from `tensor-core`.
//!
//! # Type-State Pipeline
//! The runtime enforces a type-safe pipeline:
//! ```text
//! InferenceEngine<Idle> → InferenceEngine<Configured> → InferenceEngine<Ready>
//! ```
//! Transitions are compile-time checked.

mod config;
mod engine;
mod error;
pub mod metrics;
mod weight_loader;

pub use config::RuntimeConfig;
pub use engine::{
    Configured, EngineState, Idle, InferenceEngine, InferenceOutput, Ready, INPUT_SHAPE,
};
pub use error::RuntimeError;
pub use metrics::{InferenceMetrics, LayerMetrics, Placement, Stopwatch};
pub use weight_loader::WeightLoader;
