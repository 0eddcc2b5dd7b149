// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Individual preprocessing steps.
//!
//! Each [`Transform`] consumes a [`Sample`] and returns the next one.
//! Image-space steps ([`Resize`], [`CenterCrop`]) work on `RgbImage`;
//! [`ToTensor`] switches to a `[C, H, W]` tensor; [`Normalize`] works on
//! that tensor.

use crate::PrepError;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tensor_core::{Shape, Tensor};

/// Data flowing through a transform chain.
#[derive(Debug, Clone)]
pub enum Sample {
    Image(RgbImage),
    Tensor(Tensor),
}

impl Sample {
    /// Unwraps an image sample, or reports which transform wanted one.
    pub fn into_image(self, transform: &'static str) -> Result<RgbImage, PrepError> {
        match self {
            Self::Image(img) => Ok(img),
            Self::Tensor(_) => Err(PrepError::UnexpectedSample {
                transform,
                expected: "an image",
            }),
        }
    }

    /// Unwraps a tensor sample, or reports which transform wanted one.
    pub fn into_tensor(self, transform: &'static str) -> Result<Tensor, PrepError> {
        match self {
            Self::Tensor(t) => Ok(t),
            Self::Image(_) => Err(PrepError::UnexpectedSample {
                transform,
                expected: "a tensor",
            }),
        }
    }
}

/// One deterministic preprocessing step.
pub trait Transform: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn apply(&self, sample: Sample) -> Result<Sample, PrepError>;
}

// ── Resize ─────────────────────────────────────────────────────────

/// Scales the image so its shorter side equals `size`, keeping aspect ratio.
///
/// The longer side becomes `floor(size * long / short)`. Bilinear filtering.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    size: u32,
}

impl Resize {
    pub fn new(size: u32) -> Result<Self, PrepError> {
        if size == 0 {
            return Err(PrepError::InvalidParameter("resize target must be > 0".into()));
        }
        Ok(Self { size })
    }

    /// Output `(width, height)` for an input of `(width, height)`.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |long: u32, short: u32| (self.size as u64 * long as u64 / short as u64) as u32;
        if width <= height {
            (self.size, scale(height, width))
        } else {
            (scale(width, height), self.size)
        }
    }
}

impl Transform for Resize {
    fn name(&self) -> &'static str {
        "Resize"
    }

    fn apply(&self, sample: Sample) -> Result<Sample, PrepError> {
        let img = sample.into_image(self.name())?;
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return Err(PrepError::InvalidParameter(format!("cannot resize a {w}x{h} image")));
        }
        let (nw, nh) = self.output_size(w, h);
        if (nw, nh) == (w, h) {
            return Ok(Sample::Image(img));
        }
        tracing::trace!(from = ?(w, h), to = ?(nw, nh), "resize");
        Ok(Sample::Image(imageops::resize(&img, nw, nh, FilterType::Triangle)))
    }
}

// ── CenterCrop ─────────────────────────────────────────────────────

/// Cuts a `height x width` window from the centre of the image.
///
/// Images smaller than the window are zero-padded symmetrically first.
#[derive(Debug, Clone, Copy)]
pub struct CenterCrop {
    height: u32,
    width: u32,
}

impl CenterCrop {
    pub fn new(height: u32, width: u32) -> Result<Self, PrepError> {
        if height == 0 || width == 0 {
            return Err(PrepError::InvalidParameter("crop size must be > 0".into()));
        }
        Ok(Self { height, width })
    }

    pub fn square(size: u32) -> Result<Self, PrepError> {
        Self::new(size, size)
    }
}

/// `round((len - crop) / 2)` with ties to even.
fn crop_offset(len: u32, crop: u32) -> u32 {
    let diff = len - crop;
    let half = diff / 2;
    if diff % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    }
}

impl Transform for CenterCrop {
    fn name(&self) -> &'static str {
        "CenterCrop"
    }

    fn apply(&self, sample: Sample) -> Result<Sample, PrepError> {
        let mut img = sample.into_image(self.name())?;
        let (w, h) = img.dimensions();

        if w < self.width || h < self.height {
            let (pw, ph) = (w.max(self.width), h.max(self.height));
            let mut canvas = RgbImage::new(pw, ph);
            let left = (pw - w) / 2;
            let top = (ph - h) / 2;
            imageops::overlay(&mut canvas, &img, i64::from(left), i64::from(top));
            img = canvas;
        }

        let (w, h) = img.dimensions();
        let x = crop_offset(w, self.width);
        let y = crop_offset(h, self.height);
        let cropped = imageops::crop_imm(&img, x, y, self.width, self.height).to_image();
        Ok(Sample::Image(cropped))
    }
}

// ── ToTensor ───────────────────────────────────────────────────────

/// HWC `u8` image to CHW `f32` tensor scaled into `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToTensor;

impl Transform for ToTensor {
    fn name(&self) -> &'static str {
        "ToTensor"
    }

    fn apply(&self, sample: Sample) -> Result<Sample, PrepError> {
        let img = sample.into_image(self.name())?;
        let (w, h) = img.dimensions();
        let (w, h) = (w as usize, h as usize);
        let plane = w * h;
        let mut data = vec![0.0f32; 3 * plane];
        for (i, px) in img.pixels().enumerate() {
            for c in 0..3 {
                data[c * plane + i] = f32::from(px.0[c]) / 255.0;
            }
        }
        Ok(Sample::Tensor(Tensor::from_vec(Shape::new(vec![3, h, w]), data)?))
    }
}

// ── Normalize ──────────────────────────────────────────────────────

/// Per-channel `(x - mean) / std` on a `[3, H, W]` tensor.
#[derive(Debug, Clone, Copy)]
pub struct Normalize {
    mean: [f32; 3],
    std: [f32; 3],
}

impl Normalize {
    pub fn new(mean: [f32; 3], std: [f32; 3]) -> Result<Self, PrepError> {
        if std.iter().any(|&s| s <= 0.0 || !s.is_finite()) {
            return Err(PrepError::InvalidParameter(format!(
                "std must be positive, got {std:?}"
            )));
        }
        Ok(Self { mean, std })
    }

    pub fn mean(&self) -> [f32; 3] {
        self.mean
    }

    pub fn std(&self) -> [f32; 3] {
        self.std
    }
}

impl Transform for Normalize {
    fn name(&self) -> &'static str {
        "Normalize"
    }

    fn apply(&self, sample: Sample) -> Result<Sample, PrepError> {
        let mut t = sample.into_tensor(self.name())?;
        let plane = match t.shape().dims() {
            &[3, h, w] => h * w,
            _ => {
                return Err(PrepError::UnexpectedSample {
                    transform: self.name(),
                    expected: "a [3, H, W] tensor",
                })
            }
        };
        for (c, chunk) in t.as_mut_slice().chunks_mut(plane).enumerate() {
            let (m, s) = (self.mean[c], self.std[c]);
            chunk.iter_mut().for_each(|v| *v = (*v - m) / s);
        }
        Ok(Sample::Tensor(t))
    }
}
