// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Retrieval strategies.
//!
//! [`Retrieve`] is the seam: one implementation per way of getting bytes
//! from a URL to a file. [`FallbackRetriever`] composes two of them.

use crate::FetchError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Downloads a URL to a local file.
#[allow(async_fn_in_trait)]
pub trait Retrieve {
    /// Fetches `url` into `dest`, returning the number of bytes written.
    async fn retrieve(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// HTTP(S) GET through a `reqwest` client.
///
/// The body is streamed into `<dest>.part` and renamed on success, so
/// an interrupted download never leaves a truncated asset at `dest`.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: reqwest::Client,
}

impl HttpRetriever {
    /// Client with a custom user agent and optional request timeout.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Client with library defaults.
    pub fn plain() -> Result<Self, FetchError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
        })
    }

    async fn download(&self, url: &str, part: &Path) -> Result<u64, FetchError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let io_err = |source| FetchError::Io {
            path: part.to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::create(part).await.map_err(io_err)?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;
        Ok(written)
    }
}

impl Retrieve for HttpRetriever {
    async fn retrieve(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let part = part_path(dest);

        match self.download(url, &part).await {
            Ok(bytes) => {
                tokio::fs::rename(&part, dest)
                    .await
                    .map_err(|source| FetchError::Io {
                        path: dest.to_path_buf(),
                        source,
                    })?;
                tracing::info!(url, dest = %dest.display(), bytes, "downloaded asset");
                Ok(bytes)
            }
            Err(e) => {
                // The partial file may not exist if the request itself failed.
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Tries `primary` once and, only if it fails, `secondary` once.
#[derive(Debug, Clone)]
pub struct FallbackRetriever<P, S> {
    primary: P,
    secondary: S,
    secondary_url: Option<String>,
}

impl<P: Retrieve, S: Retrieve> FallbackRetriever<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary,
            secondary_url: None,
        }
    }

    /// Points the secondary retrieval at a different URL.
    pub fn with_secondary_url(mut self, url: Option<String>) -> Self {
        self.secondary_url = url;
        self
    }
}

impl<P: Retrieve, S: Retrieve> Retrieve for FallbackRetriever<P, S> {
    async fn retrieve(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let primary = match self.primary.retrieve(url, dest).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => e,
        };
        let fallback_url = self.secondary_url.as_deref().unwrap_or(url);
        tracing::warn!(error = %primary, url = fallback_url, "primary retrieval failed, trying secondary");

        self.secondary
            .retrieve(fallback_url, dest)
            .await
            .map_err(|secondary| FetchError::AllFailed {
                primary: Box::new(primary),
                secondary: Box::new(secondary),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Test double that counts calls and records the URLs it saw.
    struct Mock {
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
        succeed: bool,
    }

    impl Mock {
        fn new(succeed: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
                succeed,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Retrieve for &Mock {
        async fn retrieve(&self, url: &str, _dest: &Path) -> Result<u64, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            if self.succeed {
                Ok(42)
            } else {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            }
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let (p, s) = (Mock::new(true), Mock::new(true));
        let chain = FallbackRetriever::new(&p, &s);
        let bytes = chain.retrieve("http://a/img.jpg", Path::new("img.jpg")).await.unwrap();
        assert_eq!(bytes, 42);
        assert_eq!(p.calls(), 1);
        assert_eq!(s.calls(), 0);
    }

    #[tokio::test]
    async fn test_secondary_called_once_after_primary_fails() {
        let (p, s) = (Mock::new(false), Mock::new(true));
        let chain = FallbackRetriever::new(&p, &s);
        chain.retrieve("http://a/img.jpg", Path::new("img.jpg")).await.unwrap();
        assert_eq!(p.calls(), 1);
        assert_eq!(s.calls(), 1);
        assert_eq!(*s.urls.lock().unwrap(), ["http://a/img.jpg"]);
    }

    #[tokio::test]
    async fn test_secondary_uses_mirror() {
        let (p, s) = (Mock::new(false), Mock::new(true));
        let chain = FallbackRetriever::new(&p, &s).with_secondary_url(Some("http://mirror/img.jpg".into()));
        chain.retrieve("http://a/img.jpg", Path::new("img.jpg")).await.unwrap();
        assert_eq!(*s.urls.lock().unwrap(), ["http://mirror/img.jpg"]);
    }

    #[tokio::test]
    async fn test_both_fail() {
        let (p, s) = (Mock::new(false), Mock::new(false));
        let chain = FallbackRetriever::new(&p, &s);
        let err = chain.retrieve("http://a/img.jpg", Path::new("img.jpg")).await.unwrap_err();
        assert!(matches!(err, FetchError::AllFailed { .. }));
        assert_eq!(p.calls(), 1);
        assert_eq!(s.calls(), 1);
    }

    #[tokio::test]
    async fn test_http_connection_refused_leaves_nothing() {
        let dir = std::env::temp_dir().join(format!("asset_fetch_refused_{}", std::process::id()));
        let dest = dir.join("img.jpg");
        let http = HttpRetriever::new("test", Some(Duration::from_secs(2))).unwrap();

        // Port 1 on loopback is not listening.
        let result = http.retrieve("http://127.0.0.1:1/img.jpg", &dest).await;

        assert!(matches!(result, Err(FetchError::Http(_))));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_part_path() {
        assert_eq!(part_path(Path::new("out/dog.jpg")), PathBuf::from("out/dog.jpg.part"));
    }
}
