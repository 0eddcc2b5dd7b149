// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! SafeTensors checkpoint inspection.
//!
//! Only the header is parsed here: tensor names, shapes and dtypes. The
//! runtime reads the actual data later through its own memory map.

use crate::graph::Validated;
use crate::{ModelError, ModelGraph};
use std::collections::BTreeMap;
use std::path::Path;
use tensor_core::Shape;

/// Metadata for a single tensor extracted from the SafeTensors header.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMeta {
    /// Tensor name (key in the SafeTensors file).
    pub name: String,
    /// Shape of the tensor.
    pub shape: Shape,
    /// Size in bytes.
    pub size_bytes: usize,
}

/// Name-sorted index of the tensors in a checkpoint.
#[derive(Debug, Clone, Default)]
pub struct WeightIndex {
    entries: BTreeMap<String, WeightMeta>,
}

impl WeightIndex {
    /// Reads the header of a `.safetensors` file.
    ///
    /// Only `F32` tensors are accepted.
    pub fn read(path: &Path) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the map is read-only and dropped before returning.
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        let tensors = safetensors::SafeTensors::deserialize(&mmap)
            .map_err(|e| ModelError::SafeTensorsError(format!("{}: {e}", path.display())))?;

        let mut entries = BTreeMap::new();
        for (name, view) in tensors.tensors() {
            if view.dtype() != safetensors::Dtype::F32 {
                return Err(ModelError::SafeTensorsError(format!(
                    "tensor '{name}' has unsupported dtype {:?}",
                    view.dtype()
                )));
            }
            let shape = Shape::new(view.shape().to_vec());
            entries.insert(
                name.clone(),
                WeightMeta {
                    name,
                    size_bytes: shape.size_bytes(),
                    shape,
                },
            );
        }
        tracing::debug!(path = %path.display(), tensors = entries.len(), "read checkpoint header");
        Ok(Self { entries })
    }

    /// Builds an index from known metadata, without touching disk.
    pub fn from_entries(entries: impl IntoIterator<Item = WeightMeta>) -> Self {
        Self {
            entries: entries.into_iter().map(|m| (m.name.clone(), m)).collect(),
        }
    }

    /// Looks up a tensor by name.
    pub fn get(&self, name: &str) -> Option<&WeightMeta> {
        self.entries.get(name)
    }

    /// Number of tensors in the checkpoint.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the checkpoint holds no tensors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total payload size in bytes.
    pub fn total_bytes(&self) -> usize {
        self.entries.values().map(|m| m.size_bytes).sum()
    }

    /// Checks that every weight the graph names exists with the right shape.
    ///
    /// Extra tensors in the checkpoint are ignored.
    pub fn verify(&self, graph: &ModelGraph<Validated>) -> Result<(), ModelError> {
        for layer in graph.iter_layers() {
            for (name, expected) in layer.weight_names.iter().zip(&layer.weight_shapes) {
                let meta = self
                    .get(name)
                    .ok_or_else(|| ModelError::WeightNotFound { name: name.clone() })?;
                if &meta.shape != expected {
                    return Err(ModelError::WeightShapeMismatch {
                        name: name.clone(),
                        expected: expected.clone(),
                        actual: meta.shape.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;

    fn tiny_graph() -> ModelGraph<Validated> {
        GraphBuilder::new("tiny", Shape::matrix(1, 4))
            .linear("fc", 4, 2)
            .build()
            .unwrap()
    }

    fn meta(name: &str, shape: Shape) -> WeightMeta {
        WeightMeta {
            name: name.into(),
            size_bytes: shape.size_bytes(),
            shape,
        }
    }

    #[test]
    fn test_verify_ok() {
        let index = WeightIndex::from_entries([
            meta("fc.weight", Shape::matrix(2, 4)),
            meta("fc.bias", Shape::vector(2)),
            meta("unused", Shape::vector(3)),
        ]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.total_bytes(), (8 + 2 + 3) * 4);
        index.verify(&tiny_graph()).unwrap();
    }

    #[test]
    fn test_verify_missing() {
        let index = WeightIndex::from_entries([meta("fc.weight", Shape::matrix(2, 4))]);
        let err = index.verify(&tiny_graph()).unwrap_err();
        assert!(matches!(err, ModelError::WeightNotFound { name } if name == "fc.bias"));
    }

    #[test]
    fn test_verify_wrong_shape() {
        let index = WeightIndex::from_entries([
            meta("fc.weight", Shape::matrix(4, 2)),
            meta("fc.bias", Shape::vector(2)),
        ]);
        assert!(matches!(
            index.verify(&tiny_graph()),
            Err(ModelError::WeightShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_read_safetensors_header() {
        let weight: Vec<u8> = [1.0f32; 8].iter().flat_map(|v| v.to_le_bytes()).collect();
        let bias: Vec<u8> = [0.5f32; 2].iter().flat_map(|v| v.to_le_bytes()).collect();
        let tensors = vec![
            (
                "fc.weight",
                safetensors::tensor::TensorView::new(safetensors::Dtype::F32, vec![2, 4], &weight)
                    .unwrap(),
            ),
            (
                "fc.bias",
                safetensors::tensor::TensorView::new(safetensors::Dtype::F32, vec![2], &bias)
                    .unwrap(),
            ),
        ];
        let bytes = safetensors::serialize(tensors, &None).unwrap();
        let path = std::env::temp_dir().join(format!("model_ir_header_{}.safetensors", std::process::id()));
        std::fs::write(&path, bytes).unwrap();

        let index = WeightIndex::read(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(index.get("fc.weight").unwrap().shape, Shape::matrix(2, 4));
        index.verify(&tiny_graph()).unwrap();
    }

    #[test]
    fn test_read_missing_file() {
        let path = std::env::temp_dir().join("model_ir_does_not_exist.safetensors");
        assert!(matches!(WeightIndex::read(&path), Err(ModelError::Io(_))));
    }
}
