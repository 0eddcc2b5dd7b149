// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Transform chains and the standard ImageNet preprocessing.

use crate::transforms::{CenterCrop, Normalize, Resize, Sample, ToTensor, Transform};
use crate::PrepError;
use image::DynamicImage;
use std::path::Path;
use tensor_core::Tensor;

/// Shorter-side size before cropping.
pub const RESIZE_SIZE: u32 = 256;
/// Square crop fed to the network.
pub const CROP_SIZE: u32 = 224;
/// ImageNet per-channel mean (RGB).
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet per-channel standard deviation (RGB).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Runs transforms in order.
#[derive(Default)]
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn then(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Step names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Applies every step to `sample`.
    pub fn apply(&self, sample: Sample) -> Result<Sample, PrepError> {
        self.transforms
            .iter()
            .try_fold(sample, |s, t| t.apply(s))
    }
}

impl std::fmt::Debug for Compose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// `Resize(256) → CenterCrop(224) → ToTensor → Normalize(ImageNet)`.
pub fn imagenet_pipeline() -> Result<Compose, PrepError> {
    Ok(Compose::new()
        .then(Resize::new(RESIZE_SIZE)?)
        .then(CenterCrop::square(CROP_SIZE)?)
        .then(ToTensor)
        .then(Normalize::new(IMAGENET_MEAN, IMAGENET_STD)?))
}

/// Runs the ImageNet pipeline on a decoded image and adds the batch axis.
///
/// Any colour type is converted to 8-bit RGB first. The result has shape
/// `[1, 3, 224, 224]`.
pub fn preprocess_image(image: DynamicImage) -> Result<Tensor, PrepError> {
    let sample = imagenet_pipeline()?.apply(Sample::Image(image.to_rgb8()))?;
    Ok(sample.into_tensor("preprocess")?.unsqueeze(0)?)
}

/// Decodes an image file and preprocesses it (see [`preprocess_image`]).
pub fn preprocess_file(path: &Path) -> Result<Tensor, PrepError> {
    let image = image::open(path)?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "decoded image"
    );
    preprocess_image(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};
    use tensor_core::Shape;

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn test_pipeline_order() {
        let p = imagenet_pipeline().unwrap();
        assert_eq!(p.names(), ["Resize", "CenterCrop", "ToTensor", "Normalize"]);
        assert_eq!(p.len(), 4);
    }

    #[test]
    fn test_output_shape() {
        for (w, h) in [(640, 480), (300, 900), (224, 224), (100, 50)] {
            let t = preprocess_image(gradient(w, h)).unwrap();
            assert_eq!(t.shape(), &Shape::nchw(1, 3, 224, 224), "input {w}x{h}");
        }
    }

    #[test]
    fn test_value_range_per_channel() {
        let t = preprocess_image(gradient(500, 375)).unwrap();
        let plane = 224 * 224;
        for (c, chunk) in t.as_slice().chunks(plane).enumerate() {
            let lo = (0.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            let hi = (1.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            assert!(
                chunk.iter().all(|&v| v >= lo - 1e-5 && v <= hi + 1e-5),
                "channel {c} out of range"
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let a = preprocess_image(gradient(320, 240)).unwrap();
        let b = preprocess_image(gradient(320, 240)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_grayscale_and_rgba_inputs() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 260, Luma([128])));
        let t = preprocess_image(gray).unwrap();
        assert_eq!(t.shape(), &Shape::nchw(1, 3, 224, 224));
        // All channels carry the same grey value.
        let g = 128.0 / 255.0;
        let expected = (g - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        assert!((t.as_slice()[224 * 224 + 1000] - expected).abs() < 1e-5);

        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(256, 256));
        assert!(preprocess_image(rgba).is_ok());
    }

    #[test]
    fn test_preprocess_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("vision_prep_{}.png", std::process::id()));
        gradient(400, 300).save(&path).unwrap();
        let t = preprocess_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(t.shape(), &Shape::nchw(1, 3, 224, 224));
    }

    #[test]
    fn test_undecodable_file() {
        let path = std::env::temp_dir().join(format!("vision_prep_bad_{}.jpg", std::process::id()));
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        let err = preprocess_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, PrepError::Image(_)));
    }
}
