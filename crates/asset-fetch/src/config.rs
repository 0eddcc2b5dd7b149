// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Where to download the sample image from and how.

use crate::FetchError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default sample image.
pub const DEFAULT_URL: &str = "https://raw.githubusercontent.com/pytorch/hub/master/images/dog.jpg";

/// Asset download settings (the `[asset]` table of the bench config).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// URL tried first.
    pub url: String,
    /// File name the asset is stored under.
    pub filename: String,
    /// URL used by the secondary retrieval; falls back to `url`.
    pub mirror_url: Option<String>,
    /// Request timeout in seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            filename: "dog.jpg".to_string(),
            mirror_url: None,
            timeout_secs: None,
            user_agent: concat!("accel-bench/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl AssetConfig {
    /// Checks that the URL and file name are usable.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.url.trim().is_empty() {
            return Err(FetchError::InvalidConfig("url is empty".into()));
        }
        let name = Path::new(&self.filename);
        if self.filename.is_empty() || name.file_name() != Some(name.as_os_str()) {
            return Err(FetchError::InvalidConfig(format!(
                "filename must be a bare file name, got '{}'",
                self.filename
            )));
        }
        Ok(())
    }

    /// Request timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Destination of the asset inside `dir`.
    pub fn destination(&self, dir: &Path) -> PathBuf {
        dir.join(&self.filename)
    }
}
