// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tile configuration files.
//!
//! A tile describes how one layer is mapped onto the multiplier mesh:
//! how many elements of each loop dimension are processed in parallel.
//!
//! ```text
//! tile_type="CONV"
//! T_R=3
//! T_S=3
//! T_C=1
//! T_K=16
//! T_G=1
//! T_N=1
//! T_X'=1
//! T_Y'=3
//! ```
//!
//! Missing dimensions default to 1. `#` starts a comment.

use crate::ArchError;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Which layer family a tile targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TileKind {
    #[serde(rename = "CONV")]
    Conv,
    #[serde(rename = "FC")]
    Fc,
}

impl TileKind {
    /// The value used for `tile_type` in tile files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conv => "CONV",
            Self::Fc => "FC",
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convolution tile: `R x S` kernel window, `C` input channels, `K`
/// filters, `G` groups, `N` batch and `X' x Y'` output positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConvTile {
    pub t_r: usize,
    pub t_s: usize,
    pub t_c: usize,
    pub t_k: usize,
    pub t_g: usize,
    pub t_n: usize,
    pub t_x: usize,
    pub t_y: usize,
}

/// Fully-connected tile: `M` output neurons, `N` batch, `K` input features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FcTile {
    pub t_m: usize,
    pub t_n: usize,
    pub t_k: usize,
}

/// Loop extents of a convolution, in tile order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvDims {
    pub r: usize,
    pub s: usize,
    pub c: usize,
    pub k: usize,
    pub g: usize,
    pub n: usize,
    pub x: usize,
    pub y: usize,
}

/// Loop extents of a fully-connected layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FcDims {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

/// Product of `extents`, or `None` if it does not fit in a `usize`.
fn checked_product(extents: &[usize]) -> Option<usize> {
    extents.iter().try_fold(1usize, |acc, &e| acc.checked_mul(e))
}

impl ConvTile {
    fn extents(&self) -> [usize; 8] {
        [self.t_r, self.t_s, self.t_c, self.t_k, self.t_g, self.t_n, self.t_x, self.t_y]
    }

    /// Multipliers occupied by one tile. Saturates at `usize::MAX`.
    pub fn multipliers(&self) -> usize {
        checked_product(&self.extents()).unwrap_or(usize::MAX)
    }

    /// Number of tile passes needed to cover `dims`.
    pub fn folds(&self, dims: &ConvDims) -> u64 {
        [
            (dims.r, self.t_r),
            (dims.s, self.t_s),
            (dims.c, self.t_c),
            (dims.k, self.t_k),
            (dims.g, self.t_g),
            (dims.n, self.t_n),
            (dims.x, self.t_x),
            (dims.y, self.t_y),
        ]
        .iter()
        .map(|&(d, t)| d.div_ceil(t) as u64)
        .product()
    }
}

impl FcTile {
    fn extents(&self) -> [usize; 3] {
        [self.t_m, self.t_n, self.t_k]
    }

    /// Multipliers occupied by one tile. Saturates at `usize::MAX`.
    pub fn multipliers(&self) -> usize {
        checked_product(&self.extents()).unwrap_or(usize::MAX)
    }

    /// Number of tile passes needed to cover `dims`.
    pub fn folds(&self, dims: &FcDims) -> u64 {
        [(dims.m, self.t_m), (dims.n, self.t_n), (dims.k, self.t_k)]
            .iter()
            .map(|&(d, t)| d.div_ceil(t) as u64)
            .product()
    }
}

/// A parsed tile configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "tile_type")]
pub enum TileConfig {
    #[serde(rename = "CONV")]
    Conv(ConvTile),
    #[serde(rename = "FC")]
    Fc(FcTile),
}

const CONV_KEYS: [&str; 8] = ["T_R", "T_S", "T_C", "T_K", "T_G", "T_N", "T_X'", "T_Y'"];
const FC_KEYS: [&str; 3] = ["T_M", "T_N", "T_K"];

impl TileConfig {
    /// Parses tile file contents.
    pub fn parse(text: &str) -> Result<Self, ArchError> {
        let mut kind = None;
        let mut values: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut pending: Vec<(usize, String, usize)> = Vec::new();

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ArchError::TileParse {
                line: line_no,
                detail: format!("expected KEY=VALUE, got '{line}'"),
            })?;
            let (key, value) = (key.trim(), value.trim());

            if key == "tile_type" {
                if kind.is_some() {
                    return Err(ArchError::TileParse {
                        line: line_no,
                        detail: "tile_type given twice".into(),
                    });
                }
                kind = Some(match value.trim_matches('"') {
                    "CONV" => TileKind::Conv,
                    "FC" => TileKind::Fc,
                    other => {
                        return Err(ArchError::TileParse {
                            line: line_no,
                            detail: format!("unknown tile_type '{other}'"),
                        })
                    }
                });
                continue;
            }

            let n: usize = value.parse().map_err(|_| ArchError::TileParse {
                line: line_no,
                detail: format!("value of {key} is not a positive integer: '{value}'"),
            })?;
            if n == 0 {
                return Err(ArchError::TileParse {
                    line: line_no,
                    detail: format!("{key} must be at least 1"),
                });
            }
            // T_X_ / T_Y_ are accepted spellings of T_X' / T_Y'.
            let key = match key {
                "T_X_" => "T_X'".to_string(),
                "T_Y_" => "T_Y'".to_string(),
                k => k.to_string(),
            };
            pending.push((line_no, key, n));
        }

        let kind = kind.ok_or_else(|| ArchError::TileParse {
            line: 0,
            detail: "missing tile_type".into(),
        })?;
        let allowed: &[&'static str] = match kind {
            TileKind::Conv => &CONV_KEYS,
            TileKind::Fc => &FC_KEYS,
        };
        for (line_no, key, n) in pending {
            let known = allowed
                .iter()
                .find(|k| **k == key)
                .ok_or_else(|| ArchError::TileParse {
                    line: line_no,
                    detail: format!("unknown key '{key}' for a {kind} tile"),
                })?;
            if values.insert(*known, n).is_some() {
                return Err(ArchError::TileParse {
                    line: line_no,
                    detail: format!("{key} given twice"),
                });
            }
        }

        let get = |k: &str| values.get(k).copied().unwrap_or(1);
        let tile = match kind {
            TileKind::Conv => Self::Conv(ConvTile {
                t_r: get("T_R"),
                t_s: get("T_S"),
                t_c: get("T_C"),
                t_k: get("T_K"),
                t_g: get("T_G"),
                t_n: get("T_N"),
                t_x: get("T_X'"),
                t_y: get("T_Y'"),
            }),
            TileKind::Fc => Self::Fc(FcTile {
                t_m: get("T_M"),
                t_n: get("T_N"),
                t_k: get("T_K"),
            }),
        };

        let fits = match &tile {
            Self::Conv(t) => checked_product(&t.extents()),
            Self::Fc(t) => checked_product(&t.extents()),
        };
        if fits.is_none() {
            return Err(ArchError::TileParse {
                line: 0,
                detail: format!("{kind} tile dimensions overflow the multiplier count"),
            });
        }
        Ok(tile)
    }

    /// Reads and parses a tile file.
    pub fn from_file(path: &Path) -> Result<Self, ArchError> {
        let text = std::fs::read_to_string(path).map_err(|source| ArchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|e| ArchError::InvalidTileFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// The layer family this tile targets.
    pub fn kind(&self) -> TileKind {
        match self {
            Self::Conv(_) => TileKind::Conv,
            Self::Fc(_) => TileKind::Fc,
        }
    }

    /// Multipliers occupied by one tile.
    pub fn multipliers(&self) -> usize {
        match self {
            Self::Conv(t) => t.multipliers(),
            Self::Fc(t) => t.multipliers(),
        }
    }
}

impl fmt::Display for TileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conv(t) => write!(
                f,
                "CONV R={} S={} C={} K={} G={} N={} X'={} Y'={}",
                t.t_r, t.t_s, t.t_c, t.t_k, t.t_g, t.t_n, t.t_x, t.t_y
            ),
            Self::Fc(t) => write!(f, "FC M={} N={} K={}", t.t_m, t.t_n, t.t_k),
        }
    }
}
