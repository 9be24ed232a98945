use npmspec_resolver::ancestor::AncestorPolicy;
use npmspec_resolver::exclusion::ExclusionSet;
use npmspec_resolver::package::MemoryRegistry;
use npmspec_resolver::resolver::{resolve, DependencyOrder, Resolution, ResolveOptions};
use npmspec_util::errors::NpmspecError;

type Entry<'a> = (&'a str, &'a str, &'a str, &'a [(&'a str, &'a str)]);

fn registry(entries: &[Entry]) -> MemoryRegistry {
    let mut reg = MemoryRegistry::new();
    for (name, version, license, deps) in entries {
        reg.publish(name, version, license, deps).unwrap();
    }
    reg
}

fn resolve_with(reg: &mut MemoryRegistry, exclude: &str, options: &ResolveOptions) -> Resolution {
    let exclusions = ExclusionSet::parse(exclude).unwrap();
    resolve(reg, "a", "latest", &exclusions, options).unwrap()
}

fn level_keys(res: &Resolution, path: &[&str]) -> Vec<String> {
    res.tree
        .level(path)
        .map(|l| l.keys().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Every tracked key sits in the tree exactly where its chain says, and
/// every node in the tree is tracked.
fn assert_tracker_consistent(res: &Resolution) {
    for (key, chain) in res.ancestors.iter() {
        assert_eq!(chain.direct_parents().last().copied(), Some(key));
        let level = res
            .tree
            .level(&chain.placement_path())
            .unwrap_or_else(|| panic!("{key}: level {chain} is missing"));
        assert!(level.contains_key(key), "{key} is not at {chain}");
    }
    assert_eq!(res.ancestors.len(), res.tree.len(), "stale or untracked nodes");
}

fn diamond() -> MemoryRegistry {
    registry(&[
        ("a", "1.0.0", "MIT", &[("b", "^1"), ("c", "^1")]),
        ("b", "1.0.0", "MIT", &[("d", "^1")]),
        ("c", "1.0.0", "MIT", &[("d", "^1"), ("x", "^1")]),
        ("d", "1.0.0", "MIT", &[("x", "^1")]),
        ("x", "1.0.0", "MIT", &[]),
    ])
}

#[test]
fn shared_dependency_placed_once_at_top() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("b", "^1"), ("c", "^1")]),
        ("b", "1.0.0", "MIT", &[("d", "^1.0.0")]),
        ("c", "1.0.0", "MIT", &[("d", ">=1.1.0 <2")]),
        ("d", "1.0.0", "MIT", &[]),
        ("d", "1.4.0", "MIT", &[]),
    ]);
    let res = resolve_with(&mut reg, "", &ResolveOptions::default());

    assert_eq!(level_keys(&res, &["a:1.0.0"]), ["b:1.0.0", "c:1.0.0", "d:1.4.0"]);
    assert!(level_keys(&res, &["a:1.0.0", "b:1.0.0"]).is_empty());
    assert!(level_keys(&res, &["a:1.0.0", "c:1.0.0"]).is_empty());
    assert!(res.conflicts().is_empty());
    assert_tracker_consistent(&res);
}

#[test]
fn conflicting_versions_stay_nested() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("b", "^1"), ("c", "^1")]),
        ("b", "1.0.0", "MIT", &[("d", "^1")]),
        ("c", "1.0.0", "MIT", &[("d", "^2")]),
        ("d", "1.0.0", "MIT", &[]),
        ("d", "2.0.0", "MIT", &[]),
    ]);
    let res = resolve_with(&mut reg, "", &ResolveOptions::default());

    assert_eq!(level_keys(&res, &["a:1.0.0"]), ["b:1.0.0", "c:1.0.0"]);
    assert_eq!(level_keys(&res, &["a:1.0.0", "b:1.0.0"]), ["d:1.0.0"]);
    assert_eq!(level_keys(&res, &["a:1.0.0", "c:1.0.0"]), ["d:2.0.0"]);
    assert_eq!(res.conflicts().len(), 1);
    assert_tracker_consistent(&res);
}

#[test]
fn conflicting_version_nests_under_its_dependent() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("b", "^1"), ("d", "^2")]),
        ("b", "1.0.0", "MIT", &[("d", "^1")]),
        ("d", "1.0.0", "MIT", &[]),
        ("d", "2.0.0", "MIT", &[]),
    ]);
    let res = resolve_with(&mut reg, "", &ResolveOptions::default());

    assert_eq!(level_keys(&res, &["a:1.0.0"]), ["b:1.0.0", "d:2.0.0"]);
    assert_eq!(level_keys(&res, &["a:1.0.0", "b:1.0.0"]), ["d:1.0.0"]);
    assert_tracker_consistent(&res);
}

#[test]
fn sibling_provided_dependency_is_not_duplicated() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("b", "^1"), ("c", "^1")]),
        ("b", "1.0.0", "MIT", &[("c", "^1")]),
        ("c", "1.0.0", "MIT", &[]),
    ]);
    let res = resolve_with(&mut reg, "", &ResolveOptions::default());

    assert_eq!(level_keys(&res, &["a:1.0.0"]), ["b:1.0.0", "c:1.0.0"]);
    assert_eq!(res.tree.len(), 3);
    assert_eq!(res.stats.visible, 1);
    assert_eq!(res.stats.relocated, 0);
}

#[test]
fn relocation_drops_nested_placements() {
    let mut reg = diamond();
    let res = resolve_with(&mut reg, "", &ResolveOptions::default());

    assert_eq!(
        level_keys(&res, &["a:1.0.0"]),
        ["b:1.0.0", "c:1.0.0", "d:1.0.0", "x:1.0.0"]
    );
    assert_eq!(res.tree.len(), 5);
    assert!(res.stats.relocated >= 2);
    assert_tracker_consistent(&res);
}

#[test]
fn final_tree_independent_of_dependency_order() {
    for policy in [AncestorPolicy::SharedPrefix, AncestorPolicy::DeepestMatch] {
        let lexical = resolve_with(
            &mut diamond(),
            "",
            &ResolveOptions {
                policy,
                order: DependencyOrder::Lexical,
                ..ResolveOptions::default()
            },
        );
        let reverse = resolve_with(
            &mut diamond(),
            "",
            &ResolveOptions {
                policy,
                order: DependencyOrder::Reverse,
                ..ResolveOptions::default()
            },
        );
        assert_eq!(lexical.tree, reverse.tree, "{policy}");
        assert_tracker_consistent(&reverse);
    }
}

#[test]
fn resolving_twice_is_identical() {
    let mut reg = diamond();
    let first = resolve_with(&mut reg, "", &ResolveOptions::default());
    let second = resolve_with(&mut reg, "", &ResolveOptions::default());
    assert_eq!(first.tree, second.tree);
    assert_eq!(first.tarballs.urls(), second.tarballs.urls());
}

#[test]
fn license_aggregate_expands_or_and_dedupes() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("b", "^1")]),
        ("b", "1.0.0", "ISC OR Apache-2.0", &[("c", "^1")]),
        ("c", "1.0.0", "MIT", &[]),
    ]);
    let res = resolve_with(&mut reg, "", &ResolveOptions::default());
    assert_eq!(res.licenses.to_string(), "MIT AND ISC AND Apache-2.0");
}

#[test]
fn tarballs_collected_in_visit_order() {
    let mut reg = diamond();
    let res = resolve_with(&mut reg, "", &ResolveOptions::default());
    let urls = res.tarballs.urls();
    assert_eq!(urls.len(), 5);
    assert_eq!(urls[0], "https://registry.npmjs.org/a/-/a-1.0.0.tgz");
}

#[test]
fn excluded_version_is_dropped_with_its_dependencies() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("b", "^1"), ("c", "^1")]),
        ("b", "1.0.0", "MIT", &[]),
        ("c", "1.0.0", "MIT", &[("e", "^1")]),
        ("e", "1.0.0", "MIT", &[]),
    ]);
    let res = resolve_with(&mut reg, "c:1.0.0", &ResolveOptions::default());

    assert_eq!(level_keys(&res, &["a:1.0.0"]), ["b:1.0.0"]);
    assert_eq!(res.stats.excluded, 1);
    assert!(reg.requests().iter().any(|r| r == "c"));
    assert!(!reg.requests().iter().any(|r| r == "e"));
}

#[test]
fn excluded_name_is_never_fetched() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("fsevents", "^2")]),
        ("fsevents", "2.3.3", "MIT", &[]),
    ]);
    let res = resolve_with(&mut reg, "fsevents", &ResolveOptions::default());
    assert_eq!(res.tree.len(), 1);
    assert_eq!(reg.requests(), ["a"]);
}

#[test]
fn unresolvable_excluded_edge_is_ignored() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("z", "^5")]),
        ("z", "1.0.0", "MIT", &[]),
    ]);
    let res = resolve_with(&mut reg, "z:1.0.0", &ResolveOptions::default());
    assert_eq!(res.tree.len(), 1);
}

#[test]
fn unresolvable_edge_aborts() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("z", "^5")]),
        ("z", "1.0.0", "MIT", &[]),
    ]);
    let err = resolve(
        &mut reg,
        "a",
        "latest",
        &ExclusionSet::new(),
        &ResolveOptions::default(),
    )
    .unwrap_err();
    match err {
        NpmspecError::Resolution {
            package,
            constraint,
            ..
        } => {
            assert_eq!(package, "z");
            assert_eq!(constraint, "^5");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn prerelease_only_dependency_resolves() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("b", "*")]),
        ("b", "1.0.0-beta.1", "MIT", &[]),
    ]);
    let res = resolve_with(&mut reg, "", &ResolveOptions::default());
    assert_eq!(level_keys(&res, &["a:1.0.0"]), ["b:1.0.0-beta.1"]);
}

#[test]
fn malformed_constraint_aborts() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[("z", "not a range")]),
        ("z", "1.0.0", "MIT", &[]),
    ]);
    let err = resolve(
        &mut reg,
        "a",
        "latest",
        &ExclusionSet::new(),
        &ResolveOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, NpmspecError::Constraint { .. }), "got {err:?}");
}

#[test]
fn explicit_root_range() {
    let mut reg = registry(&[
        ("a", "1.0.0", "MIT", &[]),
        ("a", "1.5.0", "MIT", &[]),
        ("a", "2.0.0", "MIT", &[]),
    ]);
    let res = resolve(
        &mut reg,
        "a",
        "^1",
        &ExclusionSet::new(),
        &ResolveOptions::default(),
    )
    .unwrap();
    assert_eq!(res.root.key(), "a:1.5.0");
}

#[test]
fn tree_json_mirrors_hoisting() {
    let mut reg = diamond();
    let res = resolve_with(&mut reg, "", &ResolveOptions::default());
    let json: serde_json::Value = serde_json::from_str(&res.tree.to_json_pretty().unwrap()).unwrap();
    let top = json["a:1.0.0"]["child"].as_object().unwrap();
    assert_eq!(top.len(), 4);
    assert!(top.values().all(|node| node.as_object().unwrap().is_empty()));
}
