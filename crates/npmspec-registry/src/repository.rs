//! Registry endpoint: base URL, credentials, and the packument URL layout.

use npmspec_core::config::GlobalConfig;
use npmspec_core::DEFAULT_REGISTRY;

/// A configured npm registry with an optional bearer token.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    pub url: String,
    pub token: Option<String>,
}

impl NpmRegistry {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// The public npm registry.
    pub fn public() -> Self {
        Self::new(DEFAULT_REGISTRY)
    }

    /// The registry named by `NPMSPEC_REGISTRY` or the global config.
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            token: config.registry.token.clone(),
            ..Self::new(&config.registry_url())
        }
    }

    /// Packument URL for a package.
    ///
    /// `@scope/name` is encoded as `%40scope%2Fname`. A full
    /// `http(s)://.../name` argument is reduced to its last path segment.
    pub fn package_url(&self, name: &str) -> String {
        format!("{}/{}", self.url, encode_name(name))
    }
}

pub fn encode_name(name: &str) -> String {
    let name = if name.starts_with("http") {
        name.trim_end_matches('/').rsplit('/').next().unwrap_or(name)
    } else {
        name
    };
    if name.contains('@') {
        tracing::debug!("Scoped package {name}");
    }
    name.replace('@', "%40").replace('/', "%2F")
}
