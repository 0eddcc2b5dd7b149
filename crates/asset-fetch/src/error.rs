// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for asset retrieval.

use std::path::PathBuf;

/// Errors that can occur while downloading an asset.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client could not be built or the request failed in transit.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Writing the downloaded file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The asset configuration is unusable.
    #[error("invalid asset config: {0}")]
    InvalidConfig(String),

    /// Both the primary and the secondary retrieval failed.
    #[error("all retrieval attempts failed (primary: {primary}; secondary: {secondary})")]
    AllFailed {
        primary: Box<FetchError>,
        secondary: Box<FetchError>,
    },
}
