// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `accel-bench run`: the full benchmark.
//!
//! ```text
//! configure simulator → fetch image → preprocess → [ start clock → run → stop clock ]
//! ```
//!
//! Stdout receives exactly one line, the elapsed seconds of the forward
//! pass. Everything else is logged to stderr.

use super::config::BenchConfig;
use anyhow::Context;
use model_ir::{graph::Validated, ModelGraph};
use runtime::{InferenceEngine, InferenceOutput, Stopwatch};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of one benchmark pass.
#[derive(Debug)]
pub struct BenchRun {
    /// Time spent configuring, fetching and preprocessing.
    pub setup: Duration,
    /// The forward pass alone.
    pub forward: Duration,
    pub output: InferenceOutput,
}

impl BenchRun {
    pub fn elapsed_secs(&self) -> f64 {
        self.forward.as_secs_f64()
    }
}

pub async fn execute(
    config: BenchConfig,
    image: Option<PathBuf>,
    metrics_json: Option<PathBuf>,
) -> anyhow::Result<()> {
    let graph = model_ir::zoo::alexnet(config.runtime.num_classes)?;
    let run = run_pipeline(&config, graph, image).await?;

    write_elapsed(&mut std::io::stdout().lock(), run.elapsed_secs())?;

    log_results(&run.output);
    if let Some(path) = metrics_json {
        write_report(&path, run.elapsed_secs(), &run.output)?;
    }
    Ok(())
}

/// Configures the simulator for `graph`, obtains and preprocesses the
/// image, then times a single forward pass.
///
/// A given `image` is used as is; otherwise the configured asset is
/// downloaded into the output directory.
pub async fn run_pipeline(
    config: &BenchConfig,
    graph: ModelGraph<Validated>,
    image: Option<PathBuf>,
) -> anyhow::Result<BenchRun> {
    let setup = Stopwatch::start();

    // Step 1: accelerator configuration.
    let arch = super::configure_architecture(config, graph.layer_counts())?;

    // Step 2: asset.
    let image_path = match image {
        Some(path) => path,
        None => asset_fetch::fetch_asset(&config.asset, &config.output_dir)
            .await
            .with_context(|| format!("fetching sample image from {}", config.asset.url))?,
    };

    // Step 3: preprocessing.
    let batch = vision_prep::preprocess_file(&image_path)
        .with_context(|| format!("preprocessing '{}'", image_path.display()))?;
    tracing::info!(image = %image_path.display(), shape = %batch.shape(), "input batch ready");

    let mut engine = InferenceEngine::new(config.runtime.clone())
        .attach(arch)
        .load_model(graph)?;
    let setup = setup.elapsed();
    tracing::info!(setup_secs = setup.as_secs_f64(), "benchmark prepared");

    // Step 4: timed forward pass.
    let stopwatch = Stopwatch::start();
    let output = engine.run(&batch)?;
    let forward = stopwatch.elapsed();

    Ok(BenchRun {
        setup,
        forward,
        output,
    })
}

/// The only thing `run` prints to stdout.
fn write_elapsed(out: &mut impl Write, elapsed_secs: f64) -> std::io::Result<()> {
    writeln!(out, "{elapsed_secs}")
}

fn log_results(output: &InferenceOutput) {
    for (rank, (class, prob)) in output.top_k.iter().enumerate() {
        tracing::info!(rank = rank + 1, class, prob = *prob, "prediction");
    }
    tracing::info!("{}", output.metrics.summary());
}

#[derive(serde::Serialize)]
struct RunReport<'a> {
    elapsed_secs: f64,
    top_k: &'a [(usize, f32)],
    offloads: &'a [accel_sim::OffloadRecord],
    metrics: &'a runtime::InferenceMetrics,
}

fn write_report(path: &Path, elapsed_secs: f64, output: &InferenceOutput) -> anyhow::Result<()> {
    let report = RunReport {
        elapsed_secs,
        top_k: &output.top_k,
        offloads: &output.offloads,
        metrics: &output.metrics,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json).with_context(|| format!("writing metrics to '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "metrics written");
    Ok(())
}
