// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Accelerator architecture descriptor.
//!
//! # Lifecycle
//! ```text
//! ArchitectureDescriptor   — scalar parameters + tile paths (from TOML)
//!       │  .load_tile_config(conv, fc, counts)
//!       ▼
//! ArchitectureDescriptor   — tiles parsed and checked against the mesh
//!       │  .create_config_file(dir)
//!       ▼
//! ConfiguredArchitecture   — immutable, owned by the simulator
//! ```

use crate::{ArchError, ConvTile, FcTile, TileConfig, TileKind};
use model_ir::LayerCounts;
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the generated simulator configuration.
pub const CONFIG_FILE_NAME: &str = "stonne_config.cfg";

/// Multiplier network topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsNetworkType {
    Linear,
    OsMesh,
}

/// Reduction network topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceNetworkType {
    Asnetwork,
    Fenetwork,
    Temporalrn,
}

/// Memory controller driving the dataflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerType {
    MaeriDenseWorkload,
    SigmaSparseGemm,
    TpuOsDense,
}

impl MsNetworkType {
    fn cfg_name(self) -> &'static str {
        match self {
            Self::Linear => "LINEAR",
            Self::OsMesh => "OS_MESH",
        }
    }
}

impl ReduceNetworkType {
    fn cfg_name(self) -> &'static str {
        match self {
            Self::Asnetwork => "ASNETWORK",
            Self::Fenetwork => "FENETWORK",
            Self::Temporalrn => "TEMPORALRN",
        }
    }
}

impl ControllerType {
    fn cfg_name(self) -> &'static str {
        match self {
            Self::MaeriDenseWorkload => "MAERI_DENSE_WORKLOAD",
            Self::SigmaSparseGemm => "SIGMA_SPARSE_GEMM",
            Self::TpuOsDense => "TPU_OS_DENSE",
        }
    }
}

/// Scalar parameters of the simulated accelerator plus its tile files.
///
/// # TOML Format
/// ```toml
/// ms_size = 128
/// dn_bw = 64
/// rn_bw = 64
/// conv_tile_paths = ["tiles/performance/conv_1.txt"]
/// fc_tile_paths = ["tiles/opt/fc_1.txt"]
/// ```
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ArchitectureDescriptor {
    /// Number of multiplier switches in the mesh.
    pub ms_size: usize,
    /// Distribution network bandwidth (elements per cycle).
    pub dn_bw: usize,
    /// Reduction network bandwidth (elements per cycle).
    pub rn_bw: usize,
    pub ms_network: MsNetworkType,
    pub reduce_network: ReduceNetworkType,
    pub controller_type: ControllerType,
    pub accumulation_buffer: bool,
    /// Percentage of zero weights assumed by sparse controllers (0-100).
    pub sparsity_ratio: u32,
    pub print_stats: bool,
    /// One tile file per convolution layer, in network order.
    pub conv_tile_paths: Vec<PathBuf>,
    /// One tile file per fully-connected layer, in network order.
    pub fc_tile_paths: Vec<PathBuf>,
    #[serde(skip)]
    conv_tiles: Vec<ConvTile>,
    #[serde(skip)]
    fc_tiles: Vec<FcTile>,
    /// Files the loaded tiles came from, conv first.
    #[serde(skip)]
    tile_sources: Vec<PathBuf>,
    #[serde(skip)]
    tiles_loaded: bool,
}

impl Default for ArchitectureDescriptor {
    fn default() -> Self {
        Self {
            ms_size: 128,
            dn_bw: 64,
            rn_bw: 64,
            ms_network: MsNetworkType::Linear,
            reduce_network: ReduceNetworkType::Asnetwork,
            controller_type: ControllerType::MaeriDenseWorkload,
            accumulation_buffer: true,
            sparsity_ratio: 0,
            print_stats: true,
            conv_tile_paths: (1..=5)
                .map(|i| PathBuf::from(format!("tiles/performance/conv_{i}.txt")))
                .collect(),
            fc_tile_paths: (1..=3)
                .map(|i| PathBuf::from(format!("tiles/opt/fc_{i}.txt")))
                .collect(),
            conv_tiles: Vec::new(),
            fc_tiles: Vec::new(),
            tile_sources: Vec::new(),
            tiles_loaded: false,
        }
    }
}

impl ArchitectureDescriptor {
    /// Default descriptor with the given mesh size and bandwidths.
    pub fn with_mesh(ms_size: usize, dn_bw: usize, rn_bw: usize) -> Self {
        Self {
            ms_size,
            dn_bw,
            rn_bw,
            ..Default::default()
        }
    }

    /// Parses a descriptor from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ArchError> {
        toml::from_str(toml_str).map_err(|e| ArchError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises the descriptor to TOML. Parsed tiles are not included.
    pub fn to_toml(&self) -> Result<String, ArchError> {
        toml::to_string_pretty(self)
            .map_err(|e| ArchError::Config(format!("TOML serialise error: {e}")))
    }

    /// Checks the scalar parameters.
    pub fn validate(&self) -> Result<(), ArchError> {
        if self.ms_size < 8 || !self.ms_size.is_power_of_two() {
            return Err(ArchError::InvalidParameter(format!(
                "ms_size must be a power of two >= 8, got {}",
                self.ms_size
            )));
        }
        if self.ms_network == MsNetworkType::OsMesh && self.mesh_side().is_none() {
            return Err(ArchError::InvalidParameter(format!(
                "an os_mesh network needs a square ms_size, got {}",
                self.ms_size
            )));
        }
        for (name, bw) in [("dn_bw", self.dn_bw), ("rn_bw", self.rn_bw)] {
            if bw == 0 || bw > self.ms_size {
                return Err(ArchError::InvalidParameter(format!(
                    "{name} must be in 1..={}, got {bw}",
                    self.ms_size
                )));
            }
        }
        if self.sparsity_ratio > 100 {
            return Err(ArchError::InvalidParameter(format!(
                "sparsity_ratio must be a percentage, got {}",
                self.sparsity_ratio
            )));
        }
        Ok(())
    }

    /// Loads one tile file per convolution and per fully-connected layer.
    ///
    /// List lengths are checked against `expected` before any file is
    /// opened. Each tile must match its slot's kind and fit in the mesh.
    pub fn load_tile_config(
        &mut self,
        conv_paths: Vec<PathBuf>,
        fc_paths: Vec<PathBuf>,
        expected: LayerCounts,
    ) -> Result<(), ArchError> {
        if conv_paths.len() != expected.conv {
            return Err(ArchError::TileCountMismatch {
                kind: TileKind::Conv,
                expected: expected.conv,
                actual: conv_paths.len(),
            });
        }
        if fc_paths.len() != expected.fc {
            return Err(ArchError::TileCountMismatch {
                kind: TileKind::Fc,
                expected: expected.fc,
                actual: fc_paths.len(),
            });
        }
        self.validate()?;

        let mut conv_tiles = Vec::with_capacity(conv_paths.len());
        for path in &conv_paths {
            match self.load_tile(path)? {
                TileConfig::Conv(t) => conv_tiles.push(t),
                other => return Err(kind_mismatch(path, TileKind::Conv, other.kind())),
            }
        }
        let mut fc_tiles = Vec::with_capacity(fc_paths.len());
        for path in &fc_paths {
            match self.load_tile(path)? {
                TileConfig::Fc(t) => fc_tiles.push(t),
                other => return Err(kind_mismatch(path, TileKind::Fc, other.kind())),
            }
        }

        tracing::info!(
            conv = conv_tiles.len(),
            fc = fc_tiles.len(),
            ms_size = self.ms_size,
            "tile configuration loaded"
        );

        self.tile_sources = conv_paths.iter().chain(&fc_paths).cloned().collect();
        self.conv_tile_paths = conv_paths;
        self.fc_tile_paths = fc_paths;
        self.conv_tiles = conv_tiles;
        self.fc_tiles = fc_tiles;
        self.tiles_loaded = true;
        Ok(())
    }

    fn load_tile(&self, path: &Path) -> Result<TileConfig, ArchError> {
        let tile = TileConfig::from_file(path)?;
        self.check_fit(path, tile.multipliers())?;
        tracing::debug!(path = %path.display(), %tile, "loaded tile");
        Ok(tile)
    }

    fn check_fit(&self, path: &Path, multipliers: usize) -> Result<(), ArchError> {
        if multipliers > self.ms_size {
            return Err(ArchError::TileTooLarge {
                path: path.to_path_buf(),
                multipliers,
                ms_size: self.ms_size,
            });
        }
        Ok(())
    }

    /// `true` once [`load_tile_config`](Self::load_tile_config) succeeded.
    pub fn tiles_loaded(&self) -> bool {
        self.tiles_loaded
    }

    /// Renders the simulator configuration file contents.
    pub fn render_config(&self) -> String {
        SimulatorConfig(self).to_string()
    }

    /// Writes `<dir>/stonne_config.cfg` and freezes the descriptor.
    pub fn create_config_file(&self, dir: &Path) -> Result<ConfiguredArchitecture, ArchError> {
        if !self.tiles_loaded {
            return Err(ArchError::TilesNotLoaded);
        }
        // Public fields may have changed since the tiles were loaded.
        self.validate()?;
        let multipliers = self
            .conv_tiles
            .iter()
            .map(ConvTile::multipliers)
            .chain(self.fc_tiles.iter().map(FcTile::multipliers));
        for (path, m) in self.tile_sources.iter().zip(multipliers) {
            self.check_fit(path, m)?;
        }

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ArchError::Io { path, source }
        };
        std::fs::create_dir_all(dir).map_err(io_err(dir))?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, self.render_config()).map_err(io_err(&config_path))?;

        tracing::info!(path = %config_path.display(), "wrote simulator configuration");

        Ok(ConfiguredArchitecture {
            descriptor: self.clone(),
            config_path,
        })
    }

    fn mesh_side(&self) -> Option<usize> {
        let side = (self.ms_size as f64).sqrt().round() as usize;
        (side * side == self.ms_size).then_some(side)
    }
}

/// `Display` adapter producing the simulator's INI-style config.
struct SimulatorConfig<'a>(&'a ArchitectureDescriptor);

impl fmt::Display for SimulatorConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arch = self.0;
        writeln!(f, "[MSNetwork]")?;
        writeln!(f, "type=\"{}\"", arch.ms_network.cfg_name())?;
        match arch.mesh_side() {
            Some(side) if arch.ms_network == MsNetworkType::OsMesh => {
                writeln!(f, "ms_rows={side}")?;
                writeln!(f, "ms_cols={side}")?;
            }
            _ => writeln!(f, "ms_size={}", arch.ms_size)?,
        }
        writeln!(f, "[ReduceNetwork]")?;
        writeln!(f, "type=\"{}\"", arch.reduce_network.cfg_name())?;
        writeln!(f, "[SDMemory]")?;
        writeln!(f, "controller_type=\"{}\"", arch.controller_type.cfg_name())?;
        writeln!(f, "dn_bw={}", arch.dn_bw)?;
        writeln!(f, "rn_bw={}", arch.rn_bw)?;
        writeln!(
            f,
            "accumulation_buffer_enabled={}",
            u8::from(arch.accumulation_buffer)
        )?;
        writeln!(f, "sparsity_ratio={}", arch.sparsity_ratio)?;
        writeln!(f, "print_stats_enabled={}", u8::from(arch.print_stats))
    }
}

fn kind_mismatch(path: &Path, expected: TileKind, found: TileKind) -> ArchError {
    ArchError::TileKindMismatch {
        path: path.to_path_buf(),
        expected,
        found,
    }
}

/// A validated architecture with its tiles loaded and config file written.
///
/// Only obtainable from [`ArchitectureDescriptor::create_config_file`].
#[derive(Debug, Clone)]
pub struct ConfiguredArchitecture {
    descriptor: ArchitectureDescriptor,
    config_path: PathBuf,
}

impl ConfiguredArchitecture {
    pub fn descriptor(&self) -> &ArchitectureDescriptor {
        &self.descriptor
    }

    /// Path of the generated simulator configuration.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn ms_size(&self) -> usize {
        self.descriptor.ms_size
    }

    /// Convolution tiles in network order.
    pub fn conv_tiles(&self) -> &[ConvTile] {
        &self.descriptor.conv_tiles
    }

    /// Fully-connected tiles in network order.
    pub fn fc_tiles(&self) -> &[FcTile] {
        &self.descriptor.fc_tiles
    }

    /// Layer counts the loaded tiles cover.
    pub fn layer_counts(&self) -> LayerCounts {
        LayerCounts {
            conv: self.conv_tiles().len(),
            fc: self.fc_tiles().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONV_TILE: &str = "tile_type=\"CONV\"\nT_R=3\nT_S=3\nT_K=4\n";
    const FC_TILE: &str = "tile_type=\"FC\"\nT_M=4\nT_K=8\n";

    /// Writes tile files into a fresh temp dir and returns their paths.
    fn write_tiles(tag: &str, conv: usize, fc: usize) -> (PathBuf, Vec<PathBuf>, Vec<PathBuf>) {
        let dir = std::env::temp_dir().join(format!("accel_sim_{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let write = |name: String, body: &str| {
            let p = dir.join(name);
            std::fs::write(&p, body).unwrap();
            p
        };
        let conv_paths = (0..conv).map(|i| write(format!("conv_{i}.txt"), CONV_TILE)).collect();
        let fc_paths = (0..fc).map(|i| write(format!("fc_{i}.txt"), FC_TILE)).collect();
        (dir, conv_paths, fc_paths)
    }

    const ALEXNET: LayerCounts = LayerCounts { conv: 5, fc: 3 };

    #[test]
    fn test_defaults_are_valid() {
        let arch = ArchitectureDescriptor::default();
        arch.validate().unwrap();
        assert_eq!(arch.conv_tile_paths.len(), 5);
        assert_eq!(arch.fc_tile_paths.len(), 3);
        assert_eq!(arch.fc_tile_paths[0], PathBuf::from("tiles/opt/fc_1.txt"));
        assert!(!arch.tiles_loaded());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let mut arch = ArchitectureDescriptor { ms_size: 100, ..Default::default() };
        assert!(arch.validate().is_err());
        arch.ms_size = 64;
        arch.dn_bw = 128;
        assert!(arch.validate().is_err());
        arch.dn_bw = 0;
        assert!(arch.validate().is_err());
        arch.dn_bw = 32;
        arch.rn_bw = 32;
        arch.sparsity_ratio = 101;
        assert!(arch.validate().is_err());
        arch.sparsity_ratio = 50;
        arch.validate().unwrap();
    }

    #[test]
    fn test_os_mesh_needs_square() {
        let mut arch = ArchitectureDescriptor {
            ms_network: MsNetworkType::OsMesh,
            ms_size: 128,
            ..Default::default()
        };
        assert!(arch.validate().is_err());
        arch.ms_size = 256;
        arch.validate().unwrap();
        let cfg = arch.render_config();
        assert!(cfg.contains("type=\"OS_MESH\""));
        assert!(cfg.contains("ms_rows=16\nms_cols=16"));
    }

    #[test]
    fn test_wrong_conv_count_fails_before_io() {
        // Paths do not exist: the length check must trip first.
        let mut arch = ArchitectureDescriptor::default();
        let conv = vec![PathBuf::from("/nonexistent/conv.txt"); 4];
        let fc = vec![PathBuf::from("/nonexistent/fc.txt"); 3];
        let err = arch.load_tile_config(conv, fc, ALEXNET).unwrap_err();
        assert!(matches!(
            err,
            ArchError::TileCountMismatch { kind: TileKind::Conv, expected: 5, actual: 4 }
        ));
    }

    #[test]
    fn test_wrong_fc_count() {
        let mut arch = ArchitectureDescriptor::default();
        let conv = vec![PathBuf::from("/nonexistent/conv.txt"); 5];
        let fc = vec![PathBuf::from("/nonexistent/fc.txt"); 2];
        let err = arch.load_tile_config(conv, fc, ALEXNET).unwrap_err();
        assert!(matches!(
            err,
            ArchError::TileCountMismatch { kind: TileKind::Fc, expected: 3, actual: 2 }
        ));
    }

    #[test]
    fn test_missing_file() {
        let mut arch = ArchitectureDescriptor::default();
        let conv = vec![PathBuf::from("/nonexistent/conv.txt")];
        let err = arch
            .load_tile_config(conv, vec![], LayerCounts { conv: 1, fc: 0 })
            .unwrap_err();
        assert!(matches!(err, ArchError::Io { .. }));
    }

    #[test]
    fn test_kind_mismatch() {
        let (dir, conv, fc) = write_tiles("kind", 1, 1);
        let mut arch = ArchitectureDescriptor::default();
        // Swap the lists so a CONV file lands in the fc slot.
        let err = arch
            .load_tile_config(fc, conv, LayerCounts { conv: 1, fc: 1 })
            .unwrap_err();
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(
            err,
            ArchError::TileKindMismatch { expected: TileKind::Conv, found: TileKind::Fc, .. }
        ));
    }

    #[test]
    fn test_tile_larger_than_mesh() {
        let (dir, conv, fc) = write_tiles("large", 1, 1);
        // Conv tile uses 3*3*4 = 36 multipliers.
        let mut arch = ArchitectureDescriptor::with_mesh(32, 32, 32);
        let err = arch
            .load_tile_config(conv, fc, LayerCounts { conv: 1, fc: 1 })
            .unwrap_err();
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(err, ArchError::TileTooLarge { multipliers: 36, ms_size: 32, .. }));
    }

    #[test]
    fn test_create_config_requires_tiles() {
        let arch = ArchitectureDescriptor::default();
        let dir = std::env::temp_dir().join("accel_sim_no_tiles");
        assert!(matches!(arch.create_config_file(&dir), Err(ArchError::TilesNotLoaded)));
    }

    #[test]
    fn test_full_configuration() {
        let (dir, conv, fc) = write_tiles("full", 5, 3);
        let mut arch = ArchitectureDescriptor::with_mesh(64, 16, 8);
        arch.load_tile_config(conv, fc, ALEXNET).unwrap();
        assert!(arch.tiles_loaded());

        let configured = arch.create_config_file(&dir.join("out")).unwrap();
        let text = std::fs::read_to_string(configured.config_path()).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert!(configured.config_path().ends_with(CONFIG_FILE_NAME));
        assert!(text.starts_with("[MSNetwork]\ntype=\"LINEAR\"\nms_size=64\n"));
        assert!(text.contains("[ReduceNetwork]\ntype=\"ASNETWORK\"\n"));
        assert!(text.contains("controller_type=\"MAERI_DENSE_WORKLOAD\""));
        assert!(text.contains("dn_bw=16\n"));
        assert!(text.contains("rn_bw=8\n"));
        assert!(text.contains("accumulation_buffer_enabled=1\n"));
        assert_eq!(configured.layer_counts(), ALEXNET);
        assert_eq!(configured.conv_tiles()[0].t_k, 4);
        assert_eq!(configured.fc_tiles()[2].t_k, 8);
    }

    #[test]
    fn test_overflowing_tile_is_rejected() {
        let dir = std::env::temp_dir().join(format!("accel_sim_overflow_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let fc = dir.join("fc.txt");
        std::fs::write(&fc, "tile_type=\"FC\"\nT_M=4294967296\nT_N=4294967296\n").unwrap();

        let mut arch = ArchitectureDescriptor::default();
        let err = arch
            .load_tile_config(vec![], vec![fc], LayerCounts { conv: 0, fc: 1 })
            .unwrap_err();
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(err, ArchError::InvalidTileFile { .. }));
        assert!(!arch.tiles_loaded());
    }

    #[test]
    fn test_create_config_revalidates_after_edits() {
        let (dir, conv, fc) = write_tiles("edited", 1, 1);
        let mut arch = ArchitectureDescriptor::default();
        arch.load_tile_config(conv, fc, LayerCounts { conv: 1, fc: 1 })
            .unwrap();

        arch.dn_bw = 0;
        let err = arch.create_config_file(&dir.join("out")).unwrap_err();
        assert!(matches!(err, ArchError::InvalidParameter(_)));

        // 36-multiplier conv tile no longer fits a 16-wide mesh.
        arch.dn_bw = 8;
        arch.rn_bw = 8;
        arch.ms_size = 16;
        let err = arch.create_config_file(&dir.join("out")).unwrap_err();
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(err, ArchError::TileTooLarge { multipliers: 36, ms_size: 16, .. }));
    }

    #[test]
    fn test_with_mesh() {
        let arch = ArchitectureDescriptor::with_mesh(256, 32, 16);
        assert_eq!((arch.ms_size, arch.dn_bw, arch.rn_bw), (256, 32, 16));
        assert_eq!(arch.conv_tile_paths, ArchitectureDescriptor::default().conv_tile_paths);
        let cfg = arch.render_config();
        assert!(cfg.contains("ms_size=256\n"));
        assert!(cfg.ends_with("print_stats_enabled=1\n"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let toml_str = r#"
            ms_size = 256
            dn_bw = 128
            rn_bw = 32
            reduce_network = "fenetwork"
            controller_type = "sigma_sparse_gemm"
            sparsity_ratio = 70
            fc_tile_paths = ["a.txt"]
        "#;
        let arch = ArchitectureDescriptor::from_toml(toml_str).unwrap();
        assert_eq!(arch.ms_size, 256);
        assert_eq!(arch.reduce_network, ReduceNetworkType::Fenetwork);
        assert_eq!(arch.controller_type, ControllerType::SigmaSparseGemm);
        assert_eq!(arch.fc_tile_paths, [PathBuf::from("a.txt")]);
        // Unspecified fields keep their defaults.
        assert_eq!(arch.conv_tile_paths.len(), 5);
        assert!(arch.accumulation_buffer);

        let back = ArchitectureDescriptor::from_toml(&arch.to_toml().unwrap()).unwrap();
        assert_eq!(back.rn_bw, 32);
        assert_eq!(back.sparsity_ratio, 70);
    }

    #[test]
    fn test_bad_toml() {
        assert!(ArchitectureDescriptor::from_toml("ms_size = \"big\"").is_err());
        assert!(ArchitectureDescriptor::from_toml("reduce_network = \"ring\"").is_err());
    }
}
