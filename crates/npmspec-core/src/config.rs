use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use npmspec_util::errors::NpmspecError;

use crate::DEFAULT_REGISTRY;

/// Environment variable that overrides `registry.url`.
pub const REGISTRY_ENV: &str = "NPMSPEC_REGISTRY";

/// Global user configuration loaded from `~/.npmspec/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub spec: SpecConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,
}

/// Registry settings from `[registry]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub url: String,
    /// Extra attempts after a transient transport failure.
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
    /// Bearer token for private registries.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            retries: default_retries(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY.to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

/// Spec file settings from `[spec]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecConfig {
    /// Template used when the package has no spec file yet. The built-in
    /// template is used when unset.
    #[serde(default)]
    pub template: Option<String>,
}

/// Resolution defaults from `[resolve]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// `shared-prefix` or `deepest-match`.
    #[serde(default = "default_policy")]
    pub policy: String,
    /// Exclusion entries (`name` or `name:range`) applied to every run.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            exclude: Vec::new(),
        }
    }
}

fn default_policy() -> String {
    "shared-prefix".to_string()
}

impl GlobalConfig {
    /// Load the global configuration from `~/.npmspec/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| NpmspecError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            NpmspecError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// The registry base URL, with `NPMSPEC_REGISTRY` taking precedence over
    /// the config file.
    pub fn registry_url(&self) -> String {
        match std::env::var(REGISTRY_ENV) {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self.registry.url.clone(),
        }
    }
}

/// Returns the path to the npmspec data directory (`~/.npmspec/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".npmspec")
}
