//! Registry loaded from a local JSON file, for offline runs and fixtures.
//!
//! The file is one object mapping package names to packuments, exactly as
//! the registry serves them:
//!
//! ```json
//! { "left-pad": { "dist-tags": { "latest": "1.3.0" }, "versions": { ... } } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use npmspec_resolver::package::MemoryRegistry;
use npmspec_util::errors::NpmspecError;

use crate::packument::Packument;

pub fn load_registry_file(path: &Path) -> Result<MemoryRegistry, NpmspecError> {
    let content = std::fs::read(path).map_err(|e| NpmspecError::Registry {
        message: format!("Failed to read registry file {}: {e}", path.display()),
    })?;
    parse_registry(&content, &path.display().to_string())
}

pub fn parse_registry(content: &[u8], origin: &str) -> Result<MemoryRegistry, NpmspecError> {
    let documents: BTreeMap<String, Packument> =
        serde_json::from_slice(content).map_err(|e| NpmspecError::Registry {
            message: format!("Cannot parse registry file {origin}: {e}"),
        })?;

    let mut registry = MemoryRegistry::new();
    for (name, packument) in documents {
        let mut package = packument.into_package(&name)?;
        if package.name != name {
            tracing::warn!("{origin}: entry `{name}` declares name `{}`", package.name);
            package.name = name;
        }
        registry.insert(package);
    }
    tracing::debug!("Loaded offline registry from {origin}");
    Ok(registry)
}
