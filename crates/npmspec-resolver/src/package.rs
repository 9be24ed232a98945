//! Registry metadata as seen by the resolver, and the seam to fetch it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use npmspec_util::errors::NpmspecError;

use crate::range::{self, Range};
use crate::version::Version;

/// One published version of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    /// Dependency name to constraint string, as published.
    pub dependencies: BTreeMap<String, String>,
    pub tarball: Option<String>,
}

/// Everything the resolver needs to know about a package.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: String,
    /// Published versions, newest first.
    pub versions: Vec<Version>,
    pub dist_tags: BTreeMap<String, Version>,
    pub releases: BTreeMap<Version, Release>,
    /// Normalized license expression; empty when the package declares none.
    pub license: String,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register a release, keeping `versions` sorted newest first.
    pub fn add_release(&mut self, version: Version, release: Release) {
        if self.releases.insert(version.clone(), release).is_none() {
            let pos = self
                .versions
                .binary_search_by(|probe| version.cmp(probe))
                .unwrap_or_else(|pos| pos);
            self.versions.insert(pos, version);
        }
    }

    pub fn release(&self, version: &Version) -> Result<&Release, NpmspecError> {
        self.releases
            .get(version)
            .ok_or_else(|| NpmspecError::Registry {
                message: format!("{} has no metadata for version {version}", self.name),
            })
    }

    /// The `latest` dist-tag, or the newest published version without one.
    pub fn latest(&self) -> Option<&Version> {
        self.dist_tags.get("latest").or_else(|| self.versions.first())
    }

    /// Pick the version a dependency spec refers to.
    ///
    /// Dist-tags win over ranges, so `latest` or `next` resolve through the
    /// registry's tags; anything else is parsed as a range and the newest
    /// satisfying version is chosen.
    pub fn select(&self, spec: &str) -> Result<&Version, NpmspecError> {
        let spec = spec.trim();
        if let Some(tagged) = self.dist_tags.get(spec) {
            return self
                .versions
                .iter()
                .find(|v| *v == tagged)
                .ok_or_else(|| NpmspecError::Registry {
                    message: format!("{} dist-tag `{spec}` points at unpublished {tagged}", self.name),
                });
        }
        if spec == "latest" {
            return self.latest().ok_or_else(|| self.unsatisfied(spec, "no versions published"));
        }

        let range = Range::parse(spec)?;
        range::resolve(&self.versions, &range).ok_or_else(|| {
            self.unsatisfied(spec, &format!("no published version satisfies {range}"))
        })
    }

    fn unsatisfied(&self, spec: &str, message: &str) -> NpmspecError {
        NpmspecError::Resolution {
            package: self.name.clone(),
            constraint: spec.to_string(),
            message: message.to_string(),
        }
    }
}

/// A resolved `name@version`, keyed as `name:version` in the tree.
///
/// `:` never occurs in an npm name or a semver string, so the key splits
/// unambiguously even for scoped names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId {
    pub name: String,
    pub version: Version,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }

    pub fn parse_key(key: &str) -> Result<Self, NpmspecError> {
        let (name, version) = key.rsplit_once(':').ok_or_else(|| NpmspecError::Generic {
            message: format!("`{key}` is not a name:version key"),
        })?;
        Ok(Self::new(name, Version::parse(version)?))
    }

    /// The package name of a `name:version` key, or the key itself.
    pub fn name_of(key: &str) -> &str {
        key.rsplit_once(':').map_or(key, |(name, _)| name)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Source of package metadata for the resolver.
///
/// Implementations memoize, so asking for the same package twice costs one
/// lookup.
pub trait Registry {
    fn package(&mut self, name: &str) -> Result<Rc<Package>, NpmspecError>;
}

/// A fixed, in-memory registry. Records every lookup it serves.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    packages: HashMap<String, Rc<Package>>,
    requests: Vec<String>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: Package) {
        self.packages.insert(package.name.clone(), Rc::new(package));
    }

    /// Add `name@version` with `dependencies` given as `(name, constraint)`.
    ///
    /// The tarball URL follows the public registry layout and `license`
    /// applies to the whole package, as in a packument.
    pub fn publish(
        &mut self,
        name: &str,
        version: &str,
        license: &str,
        dependencies: &[(&str, &str)],
    ) -> Result<(), NpmspecError> {
        let version = Version::parse(version)?;
        let basename = name.rsplit('/').next().unwrap_or(name);
        let release = Release {
            dependencies: dependencies
                .iter()
                .map(|(n, c)| (n.to_string(), c.to_string()))
                .collect(),
            tarball: Some(format!(
                "https://registry.npmjs.org/{name}/-/{basename}-{version}.tgz"
            )),
        };

        let entry = self
            .packages
            .entry(name.to_string())
            .or_insert_with(|| Rc::new(Package::new(name)));
        let package = Rc::make_mut(entry);
        package.license = license.to_string();
        package.add_release(version, release);
        Ok(())
    }

    /// Names looked up so far, in request order.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl Registry for MemoryRegistry {
    fn package(&mut self, name: &str) -> Result<Rc<Package>, NpmspecError> {
        self.requests.push(name.to_string());
        self.packages
            .get(name)
            .cloned()
            .ok_or_else(|| NpmspecError::Registry {
                message: format!("package `{name}` not found"),
            })
    }
}
