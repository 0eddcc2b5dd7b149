// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Offload target.
//!
//! The [`Accelerator`] trait is the seam between the host runtime and the
//! co-processor. [`Simulator`] implements it on top of a
//! [`ConfiguredArchitecture`]: it computes each layer with the host
//! kernels and records how the layer's tile maps onto the mesh.

use crate::{ArchError, ConfiguredArchitecture, ConvDims, FcDims, TileConfig, TileKind};
use model_ir::{LayerDef, LayerType};
use tensor_core::{conv2d, linear, Tensor, TensorView};

/// What the accelerator reports for one offloaded layer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OffloadRecord {
    /// Layer name (e.g. `"features.0"`).
    pub layer: String,
    pub kind: TileKind,
    /// Position of the tile in its list (0-based).
    pub tile_index: usize,
    pub tile: TileConfig,
    /// Tile passes needed to cover the layer.
    pub folds: u64,
    /// Multiply-accumulates performed.
    pub macs: u64,
    /// Multipliers occupied per pass.
    pub multipliers: usize,
    /// Fraction of the mesh occupied per pass, in `[0, 1]`.
    pub utilization: f64,
}

/// A compute backend that offloaded layers run on.
pub trait Accelerator: Send {
    /// Returns the human-readable name of this backend.
    fn name(&self) -> &str;

    /// `true` if `layer` can run on this backend.
    fn supports(&self, layer: &LayerDef) -> bool;

    /// Starts a new forward pass; tile assignment restarts from the first layer.
    fn reset(&mut self);

    /// Runs a convolution layer into `output`.
    fn conv2d(
        &mut self,
        layer: &LayerDef,
        input: &TensorView<'_>,
        weight: &TensorView<'_>,
        bias: Option<&TensorView<'_>>,
        output: &mut Tensor,
    ) -> Result<OffloadRecord, ArchError>;

    /// Runs a fully-connected layer into `output`.
    fn linear(
        &mut self,
        layer: &LayerDef,
        input: &TensorView<'_>,
        weight: &TensorView<'_>,
        bias: Option<&TensorView<'_>>,
        output: &mut Tensor,
    ) -> Result<OffloadRecord, ArchError>;
}

/// Tile-driven accelerator model.
///
/// The *i*-th convolution of a pass uses the *i*-th conv tile, likewise
/// for fully-connected layers.
#[derive(Debug)]
pub struct Simulator {
    arch: ConfiguredArchitecture,
    next_conv: usize,
    next_fc: usize,
}

impl Simulator {
    pub fn new(arch: ConfiguredArchitecture) -> Self {
        Self {
            arch,
            next_conv: 0,
            next_fc: 0,
        }
    }

    pub fn architecture(&self) -> &ConfiguredArchitecture {
        &self.arch
    }

    fn record(
        &self,
        layer: &LayerDef,
        tile_index: usize,
        tile: TileConfig,
        folds: u64,
    ) -> OffloadRecord {
        let multipliers = tile.multipliers();
        let record = OffloadRecord {
            layer: layer.name.clone(),
            kind: tile.kind(),
            tile_index,
            tile,
            folds,
            macs: layer.macs(),
            multipliers,
            utilization: multipliers as f64 / self.arch.ms_size() as f64,
        };
        tracing::debug!(
            layer = %record.layer,
            tile = %record.tile,
            folds = record.folds,
            macs = record.macs,
            "offloaded layer"
        );
        record
    }
}

impl Accelerator for Simulator {
    fn name(&self) -> &str {
        "stonne-sim"
    }

    fn supports(&self, layer: &LayerDef) -> bool {
        layer.layer_type.has_weights()
    }

    fn reset(&mut self) {
        self.next_conv = 0;
        self.next_fc = 0;
    }

    fn conv2d(
        &mut self,
        layer: &LayerDef,
        input: &TensorView<'_>,
        weight: &TensorView<'_>,
        bias: Option<&TensorView<'_>>,
        output: &mut Tensor,
    ) -> Result<OffloadRecord, ArchError> {
        let LayerType::Conv2d {
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
        } = layer.layer_type
        else {
            return Err(ArchError::UnsupportedLayer {
                layer: layer.name.clone(),
                op: layer.layer_type.as_str(),
            });
        };
        let index = self.next_conv;
        let tile = *self
            .arch
            .conv_tiles()
            .get(index)
            .ok_or_else(|| ArchError::NoTileForLayer {
                layer: layer.name.clone(),
                kind: TileKind::Conv,
            })?;

        conv2d(
            input,
            weight,
            bias,
            tensor_core::Conv2dParams { stride, padding },
            output,
        )?;

        let (n, _, x, y) = output.shape().as_nchw().unwrap_or_default();
        let dims = ConvDims {
            r: kernel_size,
            s: kernel_size,
            c: in_channels,
            k: out_channels,
            g: 1,
            n,
            x,
            y,
        };
        self.next_conv += 1;
        Ok(self.record(layer, index, TileConfig::Conv(tile), tile.folds(&dims)))
    }

    fn linear(
        &mut self,
        layer: &LayerDef,
        input: &TensorView<'_>,
        weight: &TensorView<'_>,
        bias: Option<&TensorView<'_>>,
        output: &mut Tensor,
    ) -> Result<OffloadRecord, ArchError> {
        let LayerType::Linear {
            in_features,
            out_features,
        } = layer.layer_type
        else {
            return Err(ArchError::UnsupportedLayer {
                layer: layer.name.clone(),
                op: layer.layer_type.as_str(),
            });
        };
        let index = self.next_fc;
        let tile = *self
            .arch
            .fc_tiles()
            .get(index)
            .ok_or_else(|| ArchError::NoTileForLayer {
                layer: layer.name.clone(),
                kind: TileKind::Fc,
            })?;

        linear(input, weight, bias, output)?;

        let dims = FcDims {
            m: out_features,
            n: output.shape().dim(0).unwrap_or(1),
            k: in_features,
        };
        self.next_fc += 1;
        Ok(self.record(layer, index, TileConfig::Fc(tile), tile.folds(&dims)))
    }
}
