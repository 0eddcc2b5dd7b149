// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # asset-fetch
//!
//! Downloads the benchmark's sample image.
//!
//! - [`Retrieve`] — async "URL to file" seam.
//! - [`HttpRetriever`] — `reqwest`-backed implementation.
//! - [`FallbackRetriever`] — primary once, then secondary once.
//! - [`fetch_asset`] — the default chain built from an [`AssetConfig`].

mod config;
mod error;
mod retrieve;

pub use config::{AssetConfig, DEFAULT_URL};
pub use error::FetchError;
pub use retrieve::{FallbackRetriever, HttpRetriever, Retrieve};

use std::path::{Path, PathBuf};

/// Downloads the configured asset into `dir` and returns its path.
///
/// The primary retrieval uses the configured user agent and timeout; the
/// secondary is a default client aimed at `mirror_url` when one is set.
pub async fn fetch_asset(config: &AssetConfig, dir: &Path) -> Result<PathBuf, FetchError> {
    config.validate()?;
    let dest = config.destination(dir);

    let chain = FallbackRetriever::new(
        HttpRetriever::new(&config.user_agent, config.timeout())?,
        HttpRetriever::plain()?,
    )
    .with_secondary_url(config.mirror_url.clone());

    chain.retrieve(&config.url, &dest).await?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_config_fails_before_network() {
        let cfg = AssetConfig {
            url: "  ".into(),
            ..Default::default()
        };
        let err = fetch_asset(&cfg, Path::new(".")).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_unreachable_reports_both_attempts() {
        let dir = std::env::temp_dir().join(format!("asset_fetch_chain_{}", std::process::id()));
        let cfg = AssetConfig {
            url: "http://127.0.0.1:1/dog.jpg".into(),
            mirror_url: Some("http://127.0.0.1:1/mirror/dog.jpg".into()),
            timeout_secs: Some(2),
            ..Default::default()
        };
        let err = fetch_asset(&cfg, &dir).await.unwrap_err();
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(err, FetchError::AllFailed { .. }));
    }
}
