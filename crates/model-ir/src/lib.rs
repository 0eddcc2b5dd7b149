// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! A lightweight intermediate representation for sequential CNNs.
//!
//! - [`LayerType`] — the operator each layer performs, with its hyper-parameters.
//! - [`LayerDef`] — a single layer's metadata, weight references, and shapes.
//! - [`ModelGraph`] — the model as an ordered chain of layers, with a
//!   **type-state pattern** (`Loaded` → `Validated`).
//! - [`GraphBuilder`] — appends layers and infers their shapes.
//! - [`zoo::alexnet`] — the benchmark network.
//! - [`WeightIndex`] — SafeTensors header inspection and verification.
//!
//! # Example
//! ```
//! let graph = model_ir::zoo::alexnet(1000).unwrap();
//! assert_eq!(graph.layer_counts().conv, 5);
//! println!("{}", graph.summary());
//! ```

mod builder;
mod error;
pub mod graph;
mod layer;
mod weights;
pub mod zoo;

pub use builder::GraphBuilder;
pub use error::ModelError;
pub use graph::{LayerCounts, ModelGraph};
pub use layer::{LayerDef, LayerType, OpKind};
pub use weights::{WeightIndex, WeightMeta};
