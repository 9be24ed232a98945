//! Packages to leave out of the resolved tree.
//!
//! Useful for splitting a big bundle into several smaller ones: anything
//! excluded here is expected to be packaged separately.

use std::collections::BTreeMap;
use std::fmt;

use npmspec_util::errors::NpmspecError;

use crate::range::Range;
use crate::version::Version;

/// Which versions of a package an exclusion covers.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Every version, prereleases included.
    All,
    Matching(Range),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::All => f.write_str("*"),
            Rule::Matching(range) => write!(f, "{range}"),
        }
    }
}

/// Exclusion rules keyed by package name.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    rules: BTreeMap<String, Rule>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name[:version|:constraint],...`.
    ///
    /// A bare version (`rimraf:1.0.0`) is an exact match, anything else after
    /// the colon is a range (`rimraf:^2`), and a name on its own excludes
    /// every version. A later entry for the same name replaces an earlier one.
    pub fn parse(input: &str) -> Result<Self, NpmspecError> {
        let mut set = Self::new();
        for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            set.add(entry)?;
        }
        Ok(set)
    }

    /// Add one `name[:version|:constraint]` entry.
    pub fn add(&mut self, entry: &str) -> Result<(), NpmspecError> {
        let (name, spec) = match entry.split_once(':') {
            Some((name, spec)) => (name.trim(), spec.trim()),
            None => (entry.trim(), ""),
        };
        if name.is_empty() {
            return Err(NpmspecError::Constraint {
                constraint: entry.to_string(),
                reason: "exclusion entry has no package name".to_string(),
            });
        }

        let rule = if spec.is_empty() {
            Rule::All
        } else if spec.starts_with(|c: char| c.is_ascii_digit()) {
            Rule::Matching(Range::parse(&format!("={spec}"))?)
        } else {
            Rule::Matching(Range::parse(spec)?)
        };
        self.rules.insert(name.to_string(), rule);
        Ok(())
    }

    /// Whether the edge to `name@version` must be dropped.
    pub fn contains(&self, name: &str, version: &Version) -> bool {
        match self.rules.get(name) {
            Some(Rule::All) => true,
            Some(Rule::Matching(range)) => range.satisfies(version),
            None => false,
        }
    }

    /// Whether every version of `name` is excluded, so it need not be fetched.
    pub fn excludes_all(&self, name: &str) -> bool {
        matches!(self.rules.get(name), Some(Rule::All))
    }

    /// Whether `name` has any exclusion rule at all.
    pub fn mentions(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl fmt::Display for ExclusionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rules.is_empty() {
            return write!(f, "No packages excluded.");
        }
        let width = self.rules.keys().map(String::len).max().unwrap_or(0).max(7);
        writeln!(f, "{:<width$}  Versions", "Package")?;
        for (name, rule) in &self.rules {
            writeln!(f, "{name:<width$}  {rule}")?;
        }
        Ok(())
    }
}
