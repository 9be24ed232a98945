//! Operation: resolve a package and write its packaging files.
//!
//! Produces, in the package directory:
//! - `<name>-<version>.json`: the hoisted tree,
//! - `<name>.spec`: rendered from a template, or updated in place,
//! - `_service`: one `download_url` per tarball (unless disabled).
//!
//! Nothing is written unless resolution succeeds.

use std::path::{Path, PathBuf};

use npmspec_core::config::GlobalConfig;
use npmspec_core::specfile::{spec_basename, Specfile};
use npmspec_util::errors::{NpmspecError, NpmspecResult};
use npmspec_util::fs::write_atomic;
use npmspec_util::progress::{status, status_info, status_warn};

use crate::ops_resolve::{self, ResolveRequest};
use crate::ops_service::{self, ServiceReport};

/// Options for `npmspec package`.
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Directory the files are written to.
    pub dir: PathBuf,
    /// Template for a new spec file; falls back to `spec.template` in config,
    /// then to the built-in template.
    pub template: Option<PathBuf>,
    /// Write `_service`.
    pub service: bool,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            template: None,
            service: true,
        }
    }
}

/// Files written by [`package`].
#[derive(Debug)]
pub struct PackageSummary {
    pub tree_json: PathBuf,
    pub spec: PathBuf,
    /// Whether the spec file was rendered from a template.
    pub spec_created: bool,
    pub service: Option<ServiceReport>,
}

pub fn package(
    config: &GlobalConfig,
    request: &ResolveRequest,
    opts: &PackageOptions,
) -> NpmspecResult<PackageSummary> {
    let resolution = ops_resolve::resolve(config, request)?;
    let root = &resolution.root;
    let version = root.version.to_string();

    let template = opts
        .template
        .clone()
        .or_else(|| config.spec.template.as_ref().map(PathBuf::from));
    let mut spec = Specfile::open(&opts.dir, &root.name, template.as_deref())?;
    spec.fill(&root.name, &version, &resolution.licenses, &resolution.tarballs);

    let json = resolution
        .tree
        .to_json_pretty()
        .map_err(|e| NpmspecError::Generic {
            message: format!("Failed to serialize tree: {e}"),
        })?;
    let service = if opts.service {
        Some(ops_service::prepare_service(&opts.dir, &resolution.tarballs)?)
    } else {
        None
    };

    // Everything is rendered; only now touch the package directory.
    let tree_json = tree_json_path(&opts.dir, &root.name, &version);
    write_atomic(&tree_json, json.as_bytes())?;
    status("Writing", &tree_json.display().to_string());

    spec.save()?;
    let verb = if spec.is_templated() { "Created" } else { "Updated" };
    status(verb, &spec.path().display().to_string());

    let service = match service {
        Some(pending) => {
            let report = pending.write()?;
            report_service(&report);
            Some(report)
        }
        None => None,
    };

    Ok(PackageSummary {
        tree_json,
        spec: spec.path().to_path_buf(),
        spec_created: spec.is_templated(),
        service,
    })
}

pub fn tree_json_path(dir: &Path, name: &str, version: &str) -> PathBuf {
    dir.join(format!("{}-{version}.json", spec_basename(name)))
}

fn report_service(report: &ServiceReport) {
    status(
        "Writing",
        &format!(
            "{} ({} new, {} unchanged, {} dropped)",
            ops_service::SERVICE_FILE,
            report.added.len(),
            report.kept.len(),
            report.removed.len()
        ),
    );
    for name in &report.added {
        status_info("New", name);
    }
    for name in &report.removed {
        status_warn("Dropped", name);
    }
}
