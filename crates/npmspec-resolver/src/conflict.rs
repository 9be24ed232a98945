//! Packages that ended up in the tree at more than one version.

use std::collections::BTreeMap;
use std::fmt;

use crate::package::PackageId;
use crate::tree::Tree;

/// Every package placed at two or more distinct versions.
#[derive(Debug, Default)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// One package name with each version it was placed at and where.
#[derive(Debug, Clone)]
pub struct VersionConflict {
    pub name: String,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub version: String,
    /// Keys from the top of the tree down to the placed node's parent.
    pub path: Vec<String>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the conflicts present in a finished tree.
    pub fn from_tree(tree: &Tree) -> Self {
        let mut by_name: BTreeMap<String, Vec<Placement>> = BTreeMap::new();
        tree.walk(&mut |path, key| {
            let (name, version) = key.rsplit_once(':').unwrap_or((key, ""));
            by_name.entry(name.to_string()).or_default().push(Placement {
                version: version.to_string(),
                path: path.iter().map(|s| s.to_string()).collect(),
            });
        });

        let mut report = Self::new();
        for (name, placements) in by_name {
            let first = &placements[0].version;
            if placements.iter().any(|p| &p.version != first) {
                report.add(VersionConflict { name, placements });
            }
        }
        report
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let placements: Vec<String> = self
            .placements
            .iter()
            .map(|p| {
                let under: Vec<&str> = p.path.iter().map(|k| PackageId::name_of(k)).collect();
                format!("{} under {}", p.version, under.join(" > "))
            })
            .collect();
        write!(f, "{}: {}", self.name, placements.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report() {
        let report = ConflictReport::from_tree(&Tree::new());
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert_eq!(report.to_string(), "No version conflicts.");
    }

    #[test]
    fn same_version_twice_is_not_a_conflict() {
        let mut tree = Tree::new();
        tree.insert(&["app:1.0.0"], "x:1.0.0");
        tree.insert(&["app:1.0.0", "x:1.0.0"], "y:1.0.0");
        tree.insert(&["app:1.0.0", "z:1.0.0"], "y:1.0.0");
        assert!(ConflictReport::from_tree(&tree).is_empty());
    }

    #[test]
    fn report_lists_each_version() {
        let mut tree = Tree::new();
        tree.insert(&["app:1.0.0", "b:1.0.0"], "d:1.0.0");
        tree.insert(&["app:1.0.0", "c:1.0.0"], "d:2.0.0");

        let report = ConflictReport::from_tree(&tree);
        assert_eq!(report.len(), 1);
        let s = report.to_string();
        assert!(s.contains("Version conflicts (1):"));
        assert!(s.contains("d: 1.0.0 under app > b, 2.0.0 under app > c"), "got: {s}");
    }
}
