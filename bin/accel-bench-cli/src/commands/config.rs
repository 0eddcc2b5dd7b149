// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bench configuration file.
//!
//! # TOML Format
//! ```toml
//! output_dir = "./out"
//!
//! [architecture]
//! ms_size = 128
//! dn_bw = 64
//! rn_bw = 64
//! conv_tile_paths = ["tiles/performance/conv_1.txt"]
//! fc_tile_paths = ["tiles/opt/fc_1.txt"]
//!
//! [asset]
//! url = "https://raw.githubusercontent.com/pytorch/hub/master/images/dog.jpg"
//! filename = "dog.jpg"
//!
//! [runtime]
//! model_path = "alexnet.safetensors"
//! ```
//!
//! Relative paths resolve against the directory holding the file.

use accel_sim::ArchitectureDescriptor;
use anyhow::Context;
use asset_fetch::AssetConfig;
use runtime::RuntimeConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Where the simulator config and downloaded image are written.
    pub output_dir: PathBuf,
    pub architecture: ArchitectureDescriptor,
    pub asset: AssetConfig,
    pub runtime: RuntimeConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            architecture: ArchitectureDescriptor::default(),
            asset: AssetConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl BenchConfig {
    /// Reads `path`, or returns the built-in defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            tracing::info!("no config file given, using defaults");
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let config = Self::from_toml(&content, base)
            .with_context(|| format!("parsing config '{}'", path.display()))?;
        tracing::info!(path = %path.display(), "loaded bench config");
        Ok(config)
    }

    /// Parses TOML and resolves relative paths against `base`.
    pub fn from_toml(content: &str, base: &Path) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.architecture.validate()?;
        config.asset.validate()?;
        config.runtime.validate()?;
        config.resolve_paths(base);
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.output_dir);
        self.architecture.conv_tile_paths.iter_mut().for_each(resolve);
        self.architecture.fc_tile_paths.iter_mut().for_each(resolve);
        if let Some(model) = self.runtime.model_path.as_mut() {
            resolve(model);
        }
    }
}
