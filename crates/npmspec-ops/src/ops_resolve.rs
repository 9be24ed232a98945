//! Operation: resolve a package against the configured registry.

use std::path::PathBuf;

use npmspec_core::config::GlobalConfig;
use npmspec_registry::http::HttpRegistry;
use npmspec_registry::offline::load_registry_file;
use npmspec_resolver::ancestor::AncestorPolicy;
use npmspec_resolver::exclusion::ExclusionSet;
use npmspec_resolver::resolver::{self, Resolution, ResolveOptions};
use npmspec_util::errors::NpmspecResult;
use npmspec_util::progress::{spinner, status};

/// What to resolve and where metadata comes from.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub name: String,
    /// Dist-tag or range.
    pub version: String,
    /// Exclusion entries added to the ones from config.
    pub exclude: Vec<String>,
    /// Read packuments from this JSON file instead of the network.
    pub registry_file: Option<PathBuf>,
    /// Overrides `resolve.policy` from config.
    pub policy: Option<AncestorPolicy>,
    /// Skip the dependencies of the root package.
    pub root_only: bool,
}

impl ResolveRequest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            exclude: Vec::new(),
            registry_file: None,
            policy: None,
            root_only: false,
        }
    }
}

/// Exclusions from config followed by those given on the command line.
pub fn exclusions(config: &GlobalConfig, request: &ResolveRequest) -> NpmspecResult<ExclusionSet> {
    let mut set = ExclusionSet::new();
    for entry in config.resolve.exclude.iter().chain(&request.exclude) {
        for part in entry.split(',') {
            if !part.trim().is_empty() {
                set.add(part)?;
            }
        }
    }
    Ok(set)
}

pub fn options(config: &GlobalConfig, request: &ResolveRequest) -> NpmspecResult<ResolveOptions> {
    let policy = match request.policy {
        Some(p) => p,
        None => config.resolve.policy.parse()?,
    };
    Ok(ResolveOptions {
        policy,
        root_only: request.root_only,
        ..ResolveOptions::default()
    })
}

/// Resolve `request` and report the result on stderr.
pub fn resolve(config: &GlobalConfig, request: &ResolveRequest) -> NpmspecResult<Resolution> {
    let exclusions = exclusions(config, request)?;
    let options = options(config, request)?;
    if !exclusions.is_empty() {
        tracing::debug!("Exclusions:\n{exclusions}");
    }

    let sp = spinner(&format!("Resolving {}@{}...", request.name, request.version));
    let result = match &request.registry_file {
        Some(path) => {
            let mut registry = load_registry_file(path)?;
            resolver::resolve(&mut registry, &request.name, &request.version, &exclusions, &options)
        }
        None => {
            let mut registry = HttpRegistry::from_config(config)?;
            tracing::debug!("Using registry {}", registry.base_url());
            resolver::resolve(&mut registry, &request.name, &request.version, &exclusions, &options)
        }
    };
    sp.finish_and_clear();
    let resolution = result?;

    status(
        "Resolved",
        &format!(
            "{} ({} packages, {} tarballs)",
            resolution.root,
            resolution.tree.len(),
            resolution.tarballs.len()
        ),
    );
    Ok(resolution)
}
