//! The hoisted dependency tree.
//!
//! A [`Tree`] maps `name:version` keys to [`Node`]s and every node owns the
//! nested tree of dependencies that could not be hoisted above it. Levels are
//! addressed by a path of keys from the top.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::package::PackageId;

/// One placed package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, skip_serializing_if = "Tree::is_empty")]
    pub child: Tree,
}

impl Node {
    /// Every key nested anywhere below this node, depth first.
    pub fn descendant_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.child.collect_keys(&mut keys);
        keys
    }
}

/// A level of the dependency tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tree {
    nodes: BTreeMap<String, Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes at every depth.
    pub fn len(&self) -> usize {
        self.nodes.values().map(|n| 1 + n.child.len()).sum()
    }

    /// Keys directly at this level.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// The level reached by descending through `path`, if it exists.
    pub fn level<S: AsRef<str>>(&self, path: &[S]) -> Option<&Tree> {
        path.iter()
            .try_fold(self, |tree, key| tree.nodes.get(key.as_ref()).map(|n| &n.child))
    }

    /// The level reached by descending through `path`, creating any missing
    /// node on the way.
    pub fn level_mut<S: AsRef<str>>(&mut self, path: &[S]) -> &mut Tree {
        path.iter().fold(self, |tree, key| {
            &mut tree.nodes.entry(key.as_ref().to_string()).or_default().child
        })
    }

    /// Place an empty node for `key` below `path`, returning the level it
    /// landed in.
    pub fn insert<S: AsRef<str>>(&mut self, path: &[S], key: &str) -> &mut Tree {
        let level = self.level_mut(path);
        level.nodes.insert(key.to_string(), Node::default());
        level
    }

    /// Detach the node for `key` below `path`, with its whole subtree.
    pub fn remove<S: AsRef<str>>(&mut self, path: &[S], key: &str) -> Option<Node> {
        let mut tree = self;
        for step in path {
            tree = &mut tree.nodes.get_mut(step.as_ref())?.child;
        }
        tree.nodes.remove(key)
    }

    fn collect_keys(&self, out: &mut Vec<String>) {
        for (key, node) in &self.nodes {
            out.push(key.clone());
            node.child.collect_keys(out);
        }
    }

    /// Visit every node depth first with the path of keys above it.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&[&'a str], &'a str)) {
        let mut path = Vec::new();
        self.walk_inner(&mut path, f);
    }

    fn walk_inner<'a>(&'a self, path: &mut Vec<&'a str>, f: &mut impl FnMut(&[&'a str], &'a str)) {
        for (key, node) in &self.nodes {
            f(path.as_slice(), key.as_str());
            path.push(key.as_str());
            node.child.walk_inner(path, f);
            path.pop();
        }
    }

    /// Path of keys from the top to the shallowest placement of `target`.
    ///
    /// `target` is either a full `name:version` key or a bare package name.
    pub fn find_path(&self, target: &str) -> Option<Vec<String>> {
        let matches = |key: &str| key == target || PackageId::name_of(key) == target;
        let mut best: Option<Vec<String>> = None;
        self.walk(&mut |path, key| {
            if matches(key) && best.as_ref().map_or(true, |b| path.len() + 1 < b.len()) {
                let mut full: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                full.push(key.to_string());
                best = Some(full);
            }
        });
        best
    }

    /// Render with box-drawing connectors, one key per line.
    pub fn render(&self) -> String {
        let mut output = String::new();
        for (key, node) in &self.nodes {
            output.push_str(&format!("{key}\n"));
            node.child.render_level(&mut output, "");
        }
        output
    }

    fn render_level(&self, output: &mut String, prefix: &str) {
        let count = self.nodes.len();
        for (i, (key, node)) in self.nodes.iter().enumerate() {
            let is_last = i == count - 1;
            let connector = if is_last { "└── " } else { "├── " };
            output.push_str(&format!("{prefix}{connector}{key}\n"));
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            node.child.render_level(output, &child_prefix);
        }
    }

    /// Tab-indented JSON: `{"key": {"child": {...}}}`, `child` omitted when
    /// a node has no nested dependencies.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        let mut tree = Tree::new();
        tree.insert::<&str>(&[], "app:1.0.0");
        tree.insert(&["app:1.0.0"], "a:1.0.0");
        tree.insert(&["app:1.0.0"], "b:2.0.0");
        tree.insert(&["app:1.0.0", "b:2.0.0"], "a:2.0.0");
        tree
    }

    #[test]
    fn insert_and_level() {
        let tree = sample();
        assert_eq!(tree.len(), 4);
        let top = tree.level(&["app:1.0.0"]).unwrap();
        assert_eq!(top.keys().collect::<Vec<_>>(), ["a:1.0.0", "b:2.0.0"]);
        assert!(tree.level(&["app:1.0.0", "missing:1.0.0"]).is_none());
    }

    #[test]
    fn level_mut_creates_missing_nodes() {
        let mut tree = Tree::new();
        tree.insert(&["x:1.0.0", "y:1.0.0"], "z:1.0.0");
        assert!(tree.contains_key("x:1.0.0"));
        assert!(tree.level(&["x:1.0.0", "y:1.0.0"]).unwrap().contains_key("z:1.0.0"));
    }

    #[test]
    fn remove_detaches_subtree() {
        let mut tree = sample();
        let removed = tree.remove(&["app:1.0.0"], "b:2.0.0").unwrap();
        assert_eq!(removed.descendant_keys(), ["a:2.0.0"]);
        assert_eq!(tree.len(), 2);
        assert!(tree.remove(&["nope:1.0.0"], "b:2.0.0").is_none());
    }

    #[test]
    fn find_path_by_key_and_name() {
        let tree = sample();
        assert_eq!(
            tree.find_path("a:2.0.0").unwrap(),
            ["app:1.0.0", "b:2.0.0", "a:2.0.0"]
        );
        // The shallowest placement wins for a bare name.
        assert_eq!(tree.find_path("a").unwrap(), ["app:1.0.0", "a:1.0.0"]);
        assert!(tree.find_path("zzz").is_none());
    }

    #[test]
    fn render_uses_connectors() {
        let out = sample().render();
        let expected = "app:1.0.0\n├── a:1.0.0\n└── b:2.0.0\n    └── a:2.0.0\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn json_omits_empty_children() {
        let json = sample().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let app = &value["app:1.0.0"]["child"];
        assert!(app["a:1.0.0"].as_object().unwrap().is_empty());
        assert!(app["b:2.0.0"]["child"]["a:2.0.0"].is_object());
        assert!(json.contains("\n\t\"app:1.0.0\""));
    }

    #[test]
    fn json_round_trip() {
        let tree = sample();
        let back: Tree = serde_json::from_str(&tree.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, tree);
    }
}
