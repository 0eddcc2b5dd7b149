// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # vision-prep
//!
//! Deterministic image preprocessing for ImageNet-trained classifiers.
//!
//! ```no_run
//! use std::path::Path;
//! let batch = vision_prep::preprocess_file(Path::new("dog.jpg")).unwrap();
//! assert_eq!(batch.shape().dims(), &[1, 3, 224, 224]);
//! ```

mod error;
mod pipeline;
pub mod transforms;

pub use error::PrepError;
pub use pipeline::{
    imagenet_pipeline, preprocess_file, preprocess_image, Compose, CROP_SIZE, IMAGENET_MEAN,
    IMAGENET_STD, RESIZE_SIZE,
};
pub use transforms::{CenterCrop, Normalize, Resize, Sample, ToTensor, Transform};
