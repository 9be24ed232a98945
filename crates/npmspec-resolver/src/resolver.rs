//! Hoisting dependency resolution.
//!
//! A depth-first walk from the root package. Every resolved `name:version`
//! ends in exactly one of four outcomes:
//!
//! - **visible**: an ancestor or an ancestor's brother already provides it;
//!   nothing is placed and its dependencies are not revisited.
//! - **placed**: first sighting; it goes where its chain points.
//! - **same placement**: seen before, and unifying the old and new chains
//!   lands on the existing node.
//! - **relocated**: seen before somewhere the new consumer cannot reach; the
//!   old node and everything nested under it is dropped and the key is placed
//!   again at the unified chain.
//!
//! The final shape does not depend on the order dependencies are visited in.

use std::collections::BTreeSet;
use std::rc::Rc;

use npmspec_core::license::LicenseSet;
use npmspec_core::tarball::TarballSet;
use npmspec_util::errors::NpmspecError;

use crate::ancestor::{unify, AncestorPolicy, AncestorTracker, Parents};
use crate::conflict::ConflictReport;
use crate::exclusion::ExclusionSet;
use crate::package::{Package, PackageId, Registry};
use crate::tree::Tree;
use crate::version::Version;

/// The order a node's dependencies are visited in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DependencyOrder {
    #[default]
    Lexical,
    Reverse,
}

/// Knobs for [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub policy: AncestorPolicy,
    pub order: DependencyOrder,
    /// Resolve the root package alone, without its dependencies.
    pub root_only: bool,
}

/// Counters for each walk outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub placed: usize,
    pub visible: usize,
    pub same_placement: usize,
    pub relocated: usize,
    pub excluded: usize,
}

/// The output of dependency resolution.
#[derive(Debug)]
pub struct Resolution {
    pub root: PackageId,
    pub tree: Tree,
    pub ancestors: AncestorTracker,
    pub licenses: LicenseSet,
    pub tarballs: TarballSet,
    pub stats: ResolveStats,
}

impl Resolution {
    /// Packages placed at more than one version.
    pub fn conflicts(&self) -> ConflictReport {
        ConflictReport::from_tree(&self.tree)
    }
}

/// Resolve `name@spec` and everything it depends on.
///
/// `spec` is a dist-tag (`latest`) or a range. Any failure aborts the walk:
/// no partial tree is returned.
pub fn resolve<R: Registry + ?Sized>(
    registry: &mut R,
    name: &str,
    spec: &str,
    exclusions: &ExclusionSet,
    options: &ResolveOptions,
) -> Result<Resolution, NpmspecError> {
    let package = registry.package(name)?;
    let version = package.select(spec)?.clone();
    let root = PackageId::new(package.name.clone(), version.clone());
    tracing::info!("Resolving {root} from {name}@{spec}");

    let mut walk = Walk {
        registry,
        exclusions,
        options,
        tree: Tree::new(),
        ancestors: AncestorTracker::new(),
        licenses: LicenseSet::new(),
        tarballs: TarballSet::new(),
        stats: ResolveStats::default(),
    };
    walk.visit(&package, &version, Parents::default())?;

    let stats = walk.stats;
    tracing::info!(
        "Resolved {root}: {} placed, {} relocated, {} already visible, {} reused, {} excluded",
        stats.placed,
        stats.relocated,
        stats.visible,
        stats.same_placement,
        stats.excluded
    );

    Ok(Resolution {
        root,
        tree: walk.tree,
        ancestors: walk.ancestors,
        licenses: walk.licenses,
        tarballs: walk.tarballs,
        stats,
    })
}

/// A dependency edge that survived exclusion, ready to visit.
struct Edge {
    package: Rc<Package>,
    version: Version,
    key: String,
}

struct Walk<'a, R: ?Sized> {
    registry: &'a mut R,
    exclusions: &'a ExclusionSet,
    options: &'a ResolveOptions,
    tree: Tree,
    ancestors: AncestorTracker,
    licenses: LicenseSet,
    tarballs: TarballSet,
    stats: ResolveStats,
}

impl<R: Registry + ?Sized> Walk<'_, R> {
    fn visit(
        &mut self,
        package: &Package,
        version: &Version,
        parents: Parents,
    ) -> Result<(), NpmspecError> {
        let key = PackageId::new(package.name.as_str(), version.clone()).key();
        let parents = if parents.is_empty() {
            Parents::root(&key)
        } else {
            parents
        };

        let release = package.release(version)?;
        self.licenses.insert(&package.license);
        if let Some(tarball) = &release.tarball {
            self.tarballs.insert(tarball);
        }

        if parents.provides(&key) {
            tracing::debug!("{key} is provided by an ancestor of {parents}, skipped");
            self.stats.visible += 1;
            return Ok(());
        }

        let placed = match self.ancestors.get(&key).cloned() {
            None => {
                self.place(&key, &parents);
                self.stats.placed += 1;
                parents
            }
            Some(old) => {
                let unified = unify(&old, &parents, &self.tree, self.options.policy);
                if unified.direct_parents() == old.direct_parents() {
                    tracing::debug!("{key} already placed under {old}, reused");
                    self.stats.same_placement += 1;
                    return Ok(());
                }
                tracing::info!("Relocating {key} from {old} to {unified}");
                self.relocate(&key, &old, &unified)?;
                self.stats.relocated += 1;
                unified
            }
        };

        if self.options.root_only {
            return Ok(());
        }

        let edges = self.dependencies(&package.name, &release.dependencies)?;
        for (i, edge) in edges.iter().enumerate() {
            let brothers: BTreeSet<String> = edges
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| other.key.clone())
                .collect();
            let chain = placed.child(&edge.key, brothers);
            self.visit(&edge.package, &edge.version, chain)?;
        }
        Ok(())
    }

    fn place(&mut self, key: &str, chain: &Parents) {
        tracing::debug!("Placing {key} at {chain}");
        self.tree.insert(&chain.placement_path(), key);
        self.ancestors.record(key, chain.clone());
    }

    /// Drop the node at `old` with its subtree, forget every key that lived
    /// in it, and place `key` again at `unified`.
    fn relocate(&mut self, key: &str, old: &Parents, unified: &Parents) -> Result<(), NpmspecError> {
        let removed = self
            .tree
            .remove(&old.placement_path(), key)
            .ok_or_else(|| NpmspecError::Invariant {
                message: format!("{key} is tracked under {old} but missing from the tree"),
            })?;
        self.ancestors.forget(key);
        for stale in removed.descendant_keys() {
            tracing::debug!("Forgetting {stale}, nested under relocated {key}");
            self.ancestors.forget(&stale);
        }
        self.place(key, unified);
        Ok(())
    }

    /// Resolve the dependency map of `parent` to concrete versions, dropping
    /// excluded edges.
    fn dependencies(
        &mut self,
        parent: &str,
        declared: &std::collections::BTreeMap<String, String>,
    ) -> Result<Vec<Edge>, NpmspecError> {
        let mut ordered: Vec<(&String, &String)> = declared.iter().collect();
        if self.options.order == DependencyOrder::Reverse {
            ordered.reverse();
        }

        let mut edges = Vec::with_capacity(ordered.len());
        for (name, constraint) in ordered {
            if self.exclusions.excludes_all(name) {
                tracing::info!("{name} (required by {parent}) is excluded, skipped");
                self.stats.excluded += 1;
                continue;
            }

            let package = self.registry.package(name)?;
            let version = match package.select(constraint) {
                Ok(version) => version.clone(),
                Err(e) if self.exclusions.mentions(name) => {
                    tracing::warn!("{name}@{constraint} is excluded and did not resolve: {e}");
                    self.stats.excluded += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if self.exclusions.contains(name, &version) {
                tracing::info!(
                    "{name} {version} (required by {parent}) matches an exclusion, skipped"
                );
                self.stats.excluded += 1;
                continue;
            }

            let key = PackageId::new(name.as_str(), version.clone()).key();
            edges.push(Edge {
                package,
                version,
                key,
            });
        }
        Ok(edges)
    }
}
