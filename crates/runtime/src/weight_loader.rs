// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Weight loading from SafeTensors files with memory-mapped I/O.
//!
//! [`WeightLoader`] provides two modes:
//!
//! 1. **File-backed**: maps a `.safetensors` checkpoint and copies each
//!    layer's tensors out of it on demand.
//! 2. **Synthetic**: zero-filled tensors of the right shapes. The benchmark
//!    measures time, not accuracy, so this is the default when no
//!    checkpoint is configured.

use crate::RuntimeError;
use model_ir::LayerDef;
use std::path::{Path, PathBuf};
use tensor_core::{Shape, Tensor};

/// Loads weight tensors from a SafeTensors file on demand.
pub struct WeightLoader {
    /// Checkpoint path, when one was found.
    path: Option<PathBuf>,
    /// Memory-mapped SafeTensors file (opened once, reused).
    mmap: Option<memmap2::Mmap>,
}

impl WeightLoader {
    /// Creates a loader for `path`.
    ///
    /// An existing file is memory-mapped immediately. `None` or a missing
    /// file puts the loader in synthetic mode.
    pub fn new(path: Option<&Path>) -> Result<Self, RuntimeError> {
        let Some(path) = path else {
            tracing::info!("weight loader: no checkpoint configured, using synthetic weights");
            return Ok(Self::synthetic());
        };
        if !path.exists() {
            tracing::warn!(
                "weight loader: '{}' not found, using synthetic weights",
                path.display(),
            );
            return Ok(Self::synthetic());
        }

        let init_err = |detail: String| RuntimeError::WeightLoadError {
            layer: "init".into(),
            detail,
        };
        let file = std::fs::File::open(path)
            .map_err(|e| init_err(format!("cannot open '{}': {e}", path.display())))?;
        // SAFETY: the checkpoint is opened read-only and not modified while mapped.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| init_err(format!("mmap failed: {e}")))?;
        tracing::info!(
            "weight loader: mmap'd {} ({:.2} MB)",
            path.display(),
            mmap.len() as f64 / (1024.0 * 1024.0),
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            mmap: Some(mmap),
        })
    }

    /// Creates a weight loader in synthetic mode (no file needed).
    pub fn synthetic() -> Self {
        Self {
            path: None,
            mmap: None,
        }
    }

    /// Returns `true` if operating in file-backed mode.
    pub fn is_file_backed(&self) -> bool {
        self.mmap.is_some()
    }

    /// The mapped checkpoint, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads all weight tensors for a given layer, in `weight_names` order.
    pub fn load_layer_weights(&self, layer: &LayerDef) -> Result<Vec<Tensor>, RuntimeError> {
        match &self.mmap {
            Some(mmap) => load_from_safetensors(layer, mmap),
            None => Ok(layer
                .weight_shapes
                .iter()
                .map(|shape| Tensor::zeros(shape.clone()))
                .collect()),
        }
    }
}

fn load_from_safetensors(layer: &LayerDef, bytes: &[u8]) -> Result<Vec<Tensor>, RuntimeError> {
    let err = |detail: String| RuntimeError::WeightLoadError {
        layer: layer.name.clone(),
        detail,
    };
    let st = safetensors::SafeTensors::deserialize(bytes)
        .map_err(|e| err(format!("SafeTensors parse error: {e}")))?;

    let mut tensors = Vec::with_capacity(layer.weight_names.len());
    for (name, expected) in layer.weight_names.iter().zip(&layer.weight_shapes) {
        let view = st
            .tensor(name)
            .map_err(|e| err(format!("tensor '{name}' not found: {e}")))?;
        if view.dtype() != safetensors::Dtype::F32 {
            return Err(err(format!("tensor '{name}' is {:?}, expected F32", view.dtype())));
        }
        let actual = Shape::new(view.shape().to_vec());
        if &actual != expected {
            return Err(err(format!(
                "tensor '{name}' has shape {actual}, expected {expected}"
            )));
        }
        let tensor = Tensor::from_le_bytes(actual, view.data())
            .map_err(|e| err(format!("tensor '{name}': {e}")))?;
        tensors.push(tensor);
    }
    Ok(tensors)
}

impl std::fmt::Debug for WeightLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightLoader")
            .field("path", &self.path)
            .field("file_backed", &self.is_file_backed())
            .finish()
    }
}
