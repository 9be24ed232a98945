//! Packument parsing.
//!
//! A packument is the registry document for one package: every published
//! version with its dependencies and tarball, the dist-tags, and the license.
//! Only the fields the resolver needs are read.

use std::collections::BTreeMap;

use npmspec_core::license::normalize_expression;
use npmspec_resolver::package::{Package, Release};
use npmspec_resolver::version::Version;
use npmspec_util::errors::NpmspecError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Packument {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionManifest>,
    #[serde(default)]
    pub license: Option<LicenseField>,
    #[serde(default)]
    pub licenses: Option<Vec<LicenseField>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dist: Option<Dist>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Dist {
    #[serde(default)]
    pub tarball: Option<String>,
}

/// `"MIT"`, `{"type": "MIT", "url": ...}`, or anything else a publisher
/// managed to put there.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LicenseField {
    Text(String),
    Object {
        #[serde(rename = "type", default)]
        kind: Option<String>,
    },
    Other(serde_json::Value),
}

impl LicenseField {
    fn kind(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Object { kind } => kind.as_deref(),
            Self::Other(_) => None,
        }
    }
}

fn unrecognized_license(value: &serde_json::Value) -> NpmspecError {
    NpmspecError::Registry {
        message: format!("unrecognized license value {value}"),
    }
}

impl Packument {
    pub fn from_slice(body: &[u8], url: &str) -> Result<Self, NpmspecError> {
        serde_json::from_slice(body).map_err(|e| NpmspecError::Registry {
            message: format!("Cannot parse packument from {url}: {e}"),
        })
    }

    /// The package license in one of its three published shapes.
    ///
    /// A string is normalized, an object contributes its `type`, and a
    /// `licenses` array is joined with ` OR `. Empty when none is declared.
    pub fn license(&self) -> Result<String, NpmspecError> {
        match &self.license {
            Some(LicenseField::Text(s)) => Ok(normalize_expression(s)),
            Some(field @ LicenseField::Object { .. }) => {
                Ok(field.kind().unwrap_or_default().to_string())
            }
            Some(LicenseField::Other(value)) => Err(unrecognized_license(value)),
            None => {
                let mut kinds = Vec::new();
                for field in self.licenses.iter().flatten() {
                    match field {
                        LicenseField::Other(value) => return Err(unrecognized_license(value)),
                        field => kinds.extend(field.kind()),
                    }
                }
                Ok(kinds.join(" OR "))
            }
        }
    }

    /// Convert into the resolver's view of a package. `fallback_name` is used
    /// when the document carries neither `_id` nor `name`.
    pub fn into_package(self, fallback_name: &str) -> Result<Package, NpmspecError> {
        let license = self.license()?;
        let name = self
            .id
            .or(self.name)
            .unwrap_or_else(|| fallback_name.to_string());
        let mut package = Package::new(name);
        package.license = license;

        for (raw, manifest) in self.versions {
            let version = match Version::parse(&raw) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("{}: skipping unparsable version `{raw}`: {e}", package.name);
                    continue;
                }
            };
            package.add_release(
                version,
                Release {
                    dependencies: manifest.dependencies,
                    tarball: manifest.dist.and_then(|d| d.tarball),
                },
            );
        }

        for (tag, raw) in self.dist_tags {
            match Version::parse(&raw) {
                Ok(v) => {
                    package.dist_tags.insert(tag, v);
                }
                Err(e) => tracing::warn!("{}: ignoring dist-tag {tag}={raw}: {e}", package.name),
            }
        }
        Ok(package)
    }
}
