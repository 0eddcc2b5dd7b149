// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model_path = "./models/alexnet.safetensors"
//! num_classes = 1000
//! top_k = 5
//! enable_profiling = true
//! ```

use std::path::{Path, PathBuf};

/// Configuration for the inference runtime.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// SafeTensors checkpoint. Synthetic zero weights are used when unset
    /// or when the file does not exist.
    pub model_path: Option<PathBuf>,
    /// Width of the classifier head.
    pub num_classes: usize,
    /// Number of best classes reported per run.
    pub top_k: usize,
    /// Whether to enable per-layer profiling metrics.
    pub enable_profiling: bool,
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, super::RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            super::RuntimeError::ConfigError(format!(
                "cannot read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, super::RuntimeError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            super::RuntimeError::ConfigError(format!("TOML parse error: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, super::RuntimeError> {
        toml::to_string_pretty(self).map_err(|e| {
            super::RuntimeError::ConfigError(format!("TOML serialise error: {e}"))
        })
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), super::RuntimeError> {
        if self.num_classes == 0 {
            return Err(super::RuntimeError::ConfigError(
                "num_classes must be at least 1".into(),
            ));
        }
        if self.top_k == 0 || self.top_k > self.num_classes {
            return Err(super::RuntimeError::ConfigError(format!(
                "top_k must be in 1..={}, got {}",
                self.num_classes, self.top_k
            )));
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            num_classes: 1000,
            top_k: 5,
            enable_profiling: true,
        }
    }
}
