use std::collections::HashMap;
use std::rc::Rc;

use npmspec_resolver::package::Package;

/// Parsed packuments keyed by request URL, so each package is fetched and
/// parsed once per run. Raw bodies are not kept.
#[derive(Debug, Default)]
pub struct ResponseCache {
    packages: HashMap<String, Rc<Package>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Rc<Package>> {
        self.packages.get(url).map(Rc::clone)
    }

    pub fn insert(&mut self, url: &str, package: Rc<Package>) {
        self.packages.insert(url.to_string(), package);
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
