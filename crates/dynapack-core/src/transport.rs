//! Byte transports used to fetch descriptors and assets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;

use crate::error::{Error, Result};

/// Source of package bytes.
///
/// One call is one network (or disk) read; implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Option<Url>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative package URLs against `base`.
    pub fn with_base(base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| Error::transport(base, e))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base: Some(base),
        })
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        let parsed = match &self.base {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        parsed.map_err(|e| Error::transport(url, e))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let target = self.resolve(url)?;
        tracing::debug!(url = %target, "HTTP fetch");

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| Error::transport(url, format!("request failed: {}", e)))?;

        let response = response
            .error_for_status()
            .map_err(|e| Error::transport(url, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(url, format!("failed to read body: {}", e)))?;
        Ok(body.to_vec())
    }
}

/// Filesystem transport for locally built packages.
///
/// URLs are treated as paths relative to `root`; any query string is ignored.
#[derive(Debug, Clone)]
pub struct FileTransport {
    root: PathBuf,
}

impl FileTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, url: &str) -> PathBuf {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let path = path.strip_prefix("file://").unwrap_or(path);
        self.root.join(path)
    }
}

#[async_trait]
impl Transport for FileTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.resolve(url);
        tracing::debug!(path = ?path, "File fetch");
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::transport(url, e))
    }
}

/// Pick a transport for a package-root template.
///
/// `http://` and `https://` roots are fetched over HTTP; anything else is
/// read from disk relative to the current directory.
pub fn for_root(package_root: &str) -> Arc<dyn Transport> {
    if package_root.starts_with("http://") || package_root.starts_with("https://") {
        Arc::new(HttpTransport::new())
    } else {
        Arc::new(FileTransport::new("."))
    }
}
