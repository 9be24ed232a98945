//! [`Registry`] backed by a live npm registry.
//!
//! The resolver walk is synchronous, so each packument fetch is driven to
//! completion on a private current-thread tokio runtime. Parsed packages are
//! cached by URL and the raw body is dropped once parsed; nothing is fetched
//! twice.

use std::rc::Rc;
use std::time::Duration;

use npmspec_core::config::GlobalConfig;
use npmspec_resolver::package::{Package, Registry};
use npmspec_util::errors::NpmspecError;
use reqwest::Client;
use tokio::runtime::Runtime;

use crate::cache::ResponseCache;
use crate::download;
use crate::packument::Packument;
use crate::repository::NpmRegistry;

pub struct HttpRegistry {
    registry: NpmRegistry,
    client: Client,
    runtime: Runtime,
    retries: u32,
    cache: ResponseCache,
}

impl HttpRegistry {
    pub fn new(registry: NpmRegistry, retries: u32, timeout: Duration) -> Result<Self, NpmspecError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| NpmspecError::Generic {
                message: format!("Failed to create async runtime: {e}"),
            })?;
        Ok(Self {
            registry,
            client: download::build_client(timeout)?,
            runtime,
            retries,
            cache: ResponseCache::new(),
        })
    }

    pub fn from_config(config: &GlobalConfig) -> Result<Self, NpmspecError> {
        Self::new(
            NpmRegistry::from_config(config),
            config.registry.retries,
            Duration::from_secs(config.registry.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.registry.url
    }

    /// Number of distinct packuments fetched so far.
    pub fn fetched(&self) -> usize {
        self.cache.len()
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, NpmspecError> {
        tracing::debug!("Fetching {url}");
        self.runtime.block_on(download::fetch_packument(
            &self.client,
            &self.registry,
            url,
            self.retries,
        ))
    }
}

impl Registry for HttpRegistry {
    fn package(&mut self, name: &str) -> Result<Rc<Package>, NpmspecError> {
        let url = self.registry.package_url(name);
        if let Some(package) = self.cache.get(&url) {
            return Ok(package);
        }
        let body = self.fetch(&url)?;
        let package = Rc::new(Packument::from_slice(&body, &url)?.into_package(name)?);
        self.cache.insert(&url, Rc::clone(&package));
        Ok(package)
    }
}
