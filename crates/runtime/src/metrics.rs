// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inference timing.
//!
//! [`Stopwatch`] is the benchmark timer; [`InferenceMetrics`] breaks a run
//! down per layer and by where each layer executed.

use std::time::{Duration, Instant};

/// Monotonic wall-clock timer.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Starts timing now.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time since [`Stopwatch::start`]. Never negative.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

/// Where a layer ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Host,
    Accelerator,
}

/// Metrics for a single layer's execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LayerMetrics {
    /// Layer name.
    pub layer_name: String,
    /// Operator label (`"conv2d"`, `"relu"`, ...).
    pub op: &'static str,
    pub placement: Placement,
    /// Time spent executing the layer computation.
    pub compute_duration: Duration,
    /// Tile passes, for offloaded layers.
    pub folds: Option<u64>,
}

/// Aggregate metrics for a complete inference run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct InferenceMetrics {
    /// Total wall-clock time for the inference run.
    pub total_duration: Duration,
    /// Time spent in host-executed layers.
    pub host_duration: Duration,
    /// Time spent in offloaded layers.
    pub accelerator_duration: Duration,
    /// Sum of folds over offloaded layers.
    pub total_folds: u64,
    /// Multiply-accumulates performed by the accelerator.
    pub accelerator_macs: u64,
    /// Per-layer metrics (empty when profiling is off).
    pub layer_metrics: Vec<LayerMetrics>,
}

impl InferenceMetrics {
    /// Creates an empty metrics container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed layer.
    ///
    /// Aggregates are always updated; the per-layer entry is kept only
    /// when `keep_layer` is set.
    pub fn record_layer(&mut self, layer: LayerMetrics, macs: u64, keep_layer: bool) {
        match layer.placement {
            Placement::Host => self.host_duration += layer.compute_duration,
            Placement::Accelerator => {
                self.accelerator_duration += layer.compute_duration;
                self.total_folds += layer.folds.unwrap_or(0);
                self.accelerator_macs += macs;
            }
        }
        if keep_layer {
            self.layer_metrics.push(layer);
        }
    }

    /// Finalises metrics with the total wall-clock time.
    pub fn finalise(&mut self, total: Duration) {
        self.total_duration = total;
    }

    /// Share of compute time spent on the accelerator, in percent.
    pub fn accelerator_share(&self) -> f64 {
        let busy = (self.host_duration + self.accelerator_duration).as_secs_f64();
        if busy <= 0.0 {
            return 0.0;
        }
        self.accelerator_duration.as_secs_f64() / busy * 100.0
    }

    /// Serialises metrics to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "Inference: {:.2}ms total, {:.2}ms accelerator ({:.0}%), {:.2}ms host, \
             {} folds, {:.2} GMACs offloaded",
            self.total_duration.as_secs_f64() * 1000.0,
            self.accelerator_duration.as_secs_f64() * 1000.0,
            self.accelerator_share(),
            self.host_duration.as_secs_f64() * 1000.0,
            self.total_folds,
            self.accelerator_macs as f64 / 1e9,
        )
    }
}
