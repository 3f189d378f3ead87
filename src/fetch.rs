//! Fetching site resources.
//!
//! Every network touchpoint of the rendering layer (the feed index, detail
//! pages for excerpt backfill) goes through the [`Fetcher`] trait and returns
//! an explicit `Result`. Renderers decide what a failure means; fetchers never
//! retry and never log.
//!
//! Two implementations ship with the crate:
//!
//! - [`SiteFetcher`] resolves site paths against a local directory, which is
//!   how the CLI renders a built site before it is deployed.
//! - [`HttpFetcher`] issues blocking HTTP GETs against a live base URL.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request for {path} failed with status {status}")]
    Status { path: String, status: u16 },
    #[error("request for {path} failed: {reason}")]
    Transport { path: String, reason: String },
    #[error("invalid site path: {0}")]
    InvalidPath(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-request options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Bypass intermediate caches (`Cache-Control: no-cache`).
    pub no_cache: bool,
}

impl FetchOptions {
    pub fn no_cache() -> Self {
        Self { no_cache: true }
    }
}

/// Source of site resources addressed by absolute site paths (`/posts/a.html`).
///
/// `Sync` so excerpt backfill can fetch from several worker threads at once.
pub trait Fetcher: Sync {
    fn get(&self, path: &str, options: FetchOptions) -> Result<String, FetchError>;
}

/// Serves site paths from a directory on disk.
#[derive(Debug, Clone)]
pub struct SiteFetcher {
    root: PathBuf,
}

impl SiteFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a site path to a file under the root.
    ///
    /// Query strings and fragments are ignored; `..` segments are rejected.
    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let without_query = path.split(['?', '#']).next().unwrap_or_default();
        let relative = Path::new(without_query.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(FetchError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl Fetcher for SiteFetcher {
    fn get(&self, path: &str, _options: FetchOptions) -> Result<String, FetchError> {
        let file = self.resolve(path)?;
        if !file.is_file() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: 404,
            });
        }
        Ok(std::fs::read_to_string(file)?)
    }
}

/// Fetches site paths from a live site over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    base: url::Url,
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base = url::Url::parse(base_url)
            .map_err(|e| FetchError::InvalidPath(format!("{base_url}: {e}")))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Transport {
                path: base_url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { base, client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, path: &str, options: FetchOptions) -> Result<String, FetchError> {
        let target = self
            .base
            .join(path)
            .map_err(|e| FetchError::InvalidPath(format!("{path}: {e}")))?;
        let mut request = self.client.get(target);
        if options.no_cache {
            request = request.header(reqwest::header::CACHE_CONTROL, "no-cache");
        }
        let transport = |e: reqwest::Error| FetchError::Transport {
            path: path.to_string(),
            reason: e.to_string(),
        };
        let response = request.send().map_err(transport)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }
        response.text().map_err(transport)
    }
}
