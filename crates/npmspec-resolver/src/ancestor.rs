//! Ancestor chains and the tracker that remembers where each key was placed.
//!
//! A [`Parents`] chain runs from the top of the tree (index 0) to a node's own
//! placement (last). Link `i` names the key the subtree holding link `i + 1`
//! is nested under, and carries the *brothers* resolved alongside it: keys a
//! descendant can see without placing its own copy.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use npmspec_util::errors::NpmspecError;
use serde::{Deserialize, Serialize};

use crate::tree::Tree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub name: String,
    pub brothers: BTreeSet<String>,
}

impl ParentLink {
    pub fn new(name: impl Into<String>, brothers: BTreeSet<String>) -> Self {
        Self {
            name: name.into(),
            brothers,
        }
    }
}

/// An ancestor chain. Passed by value down each branch of the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parents(Vec<ParentLink>);

impl Parents {
    /// The one-link chain of the package the walk starts from.
    pub fn root(key: &str) -> Self {
        Self(vec![ParentLink::new(key, BTreeSet::new())])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn links(&self) -> &[ParentLink] {
        &self.0
    }

    /// Whether `key` is already visible: it names an ancestor, or is a
    /// brother of one. The last link is the node itself and is skipped.
    pub fn provides(&self, key: &str) -> bool {
        let ancestors = &self.0[..self.0.len().saturating_sub(1)];
        ancestors
            .iter()
            .any(|link| link.name == key || link.brothers.contains(key))
    }

    /// Names only, top to bottom.
    pub fn direct_parents(&self) -> Vec<&str> {
        self.0.iter().map(|link| link.name.as_str()).collect()
    }

    /// The tree path a node with this chain is placed under: every name but
    /// the last.
    pub fn placement(&self) -> &[ParentLink] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    pub fn placement_path(&self) -> Vec<&str> {
        self.placement().iter().map(|link| link.name.as_str()).collect()
    }

    /// This chain extended by one link.
    pub fn child(&self, key: &str, brothers: BTreeSet<String>) -> Self {
        let mut links = self.0.clone();
        links.push(ParentLink::new(key, brothers));
        Self(links)
    }
}

impl fmt::Display for Parents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.direct_parents().join(" > "))
    }
}

/// Last chain in force for every placed key.
#[derive(Debug, Clone, Default)]
pub struct AncestorTracker {
    chains: HashMap<String, Parents>,
}

impl AncestorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Parents> {
        self.chains.get(key)
    }

    pub fn record(&mut self, key: &str, chain: Parents) {
        self.chains.insert(key.to_string(), chain);
    }

    pub fn forget(&mut self, key: &str) -> Option<Parents> {
        self.chains.remove(key)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parents)> {
        self.chains.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// How the depth shared by two chains of the same key is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AncestorPolicy {
    /// Deepest index before the names first diverge, scanning from the top.
    #[default]
    SharedPrefix,
    /// Deepest index whose names are equal, scanning from the bottom. Can pick
    /// an index below an earlier divergence.
    DeepestMatch,
}

impl FromStr for AncestorPolicy {
    type Err = NpmspecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared-prefix" => Ok(Self::SharedPrefix),
            "deepest-match" => Ok(Self::DeepestMatch),
            other => Err(NpmspecError::Config {
                message: format!(
                    "unknown ancestor policy `{other}` (expected `shared-prefix` or `deepest-match`)"
                ),
            }),
        }
    }
}

impl fmt::Display for AncestorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SharedPrefix => "shared-prefix",
            Self::DeepestMatch => "deepest-match",
        })
    }
}

/// Index of the deepest link `low` and `high` have in common.
///
/// Only links above `low`'s own placement are compared, since the last link
/// is the key itself. Returns 0 when nothing but the top is shared.
pub fn common_ancestor_depth(low: &Parents, high: &Parents, policy: AncestorPolicy) -> usize {
    let comparable = low.len().saturating_sub(1).min(high.len());
    let same = |i: usize| low.0[i].name == high.0[i].name;
    match policy {
        AncestorPolicy::SharedPrefix => (0..comparable)
            .find(|&i| !same(i))
            .unwrap_or(comparable)
            .saturating_sub(1),
        AncestorPolicy::DeepestMatch => (0..comparable).rev().find(|&i| same(i)).unwrap_or(0),
    }
}

/// Merge the chain `old` a key was placed with and the chain `new` it is now
/// requested with into one placement visible to both consumers.
///
/// The shorter chain (`new` on a tie) is cut to the shared depth and the key
/// is appended with every key already living at that level as brothers.
pub fn unify(old: &Parents, new: &Parents, tree: &Tree, policy: AncestorPolicy) -> Parents {
    let (low, high) = if old.len() >= new.len() {
        (new, old)
    } else {
        (old, new)
    };
    if low.len() < 2 {
        return low.clone();
    }

    let idx = common_ancestor_depth(low, high, policy);
    let shared = &low.0[..=idx];
    let brothers: BTreeSet<String> = tree
        .level(&shared.iter().map(|l| l.name.as_str()).collect::<Vec<_>>())
        .map(|level| level.keys().map(str::to_string).collect())
        .unwrap_or_default();

    let mut links = shared.to_vec();
    if let Some(last) = low.0.last() {
        links.push(ParentLink::new(last.name.clone(), brothers));
    }
    Parents(links)
}
