use std::path::PathBuf;

use npmspec_core::config::GlobalConfig;
use npmspec_ops::ops_resolve::{self, ResolveRequest};
use npmspec_ops::ops_tree::{render, TreeOptions};
use npmspec_resolver::ancestor::AncestorPolicy;
use npmspec_resolver::resolver::Resolution;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/registry.json")
}

fn request() -> ResolveRequest {
    ResolveRequest {
        registry_file: Some(fixture()),
        ..ResolveRequest::new("app", "latest")
    }
}

fn resolve(request: &ResolveRequest) -> Resolution {
    ops_resolve::resolve(&GlobalConfig::default(), request).unwrap()
}

#[test]
fn test_default_view_is_rendered_tree() {
    let out = render(&resolve(&request()), &TreeOptions::default()).unwrap();
    assert_eq!(
        out,
        "app:1.0.0\n\
         ├── fsevents:2.3.3\n\
         ├── left:1.0.0\n\
         │   └── shared:1.2.0\n\
         └── right:1.0.0\n    \
         └── shared:2.0.1\n"
    );
}

#[test]
fn test_exclusion_from_request_and_config() {
    let mut req = request();
    req.exclude = vec!["fsevents".to_string()];
    let res = resolve(&req);
    assert_eq!(res.tree.len(), 5);
    assert!(res.tree.find_path("fsevents").is_none());

    let mut config = GlobalConfig::default();
    config.resolve.exclude = vec!["fsevents, shared:1.2.0".to_string()];
    let res = ops_resolve::resolve(&config, &request()).unwrap();
    assert_eq!(res.tree.len(), 4);
    assert_eq!(res.tarballs.len(), 4);
}

#[test]
fn test_why_shows_path() {
    let opts = TreeOptions {
        why: Some("shared:2.0.1".to_string()),
        ..TreeOptions::default()
    };
    let out = render(&resolve(&request()), &opts).unwrap();
    assert_eq!(
        out,
        "Path to shared:2.0.1:\napp:1.0.0\n  right:1.0.0\n    shared:2.0.1\n"
    );
}

#[test]
fn test_why_unknown_package() {
    let opts = TreeOptions {
        why: Some("nope".to_string()),
        ..TreeOptions::default()
    };
    let out = render(&resolve(&request()), &opts).unwrap();
    assert!(out.contains("Dependency 'nope' not found"));
}

#[test]
fn test_conflicts_view() {
    let opts = TreeOptions {
        conflicts: true,
        ..TreeOptions::default()
    };
    let out = render(&resolve(&request()), &opts).unwrap();
    assert!(out.contains("Version conflicts (1):"), "got: {out}");
    assert!(out.contains("shared: 1.2.0 under app > left, 2.0.1 under app > right"));
}

#[test]
fn test_licenses_view() {
    let opts = TreeOptions {
        licenses: true,
        ..TreeOptions::default()
    };
    let out = render(&resolve(&request()), &opts).unwrap();
    assert_eq!(out, "MIT AND ISC AND Apache-2.0\n");
}

#[test]
fn test_sources_view() {
    let opts = TreeOptions {
        sources: true,
        ..TreeOptions::default()
    };
    let out = render(&resolve(&request()), &opts).unwrap();
    assert!(out.starts_with("Source0:\thttps://registry.npmjs.org/app/-/app-1.0.0.tgz\n"));
    assert_eq!(out.lines().count(), 6);
}

#[test]
fn test_json_view() {
    let opts = TreeOptions {
        json: true,
        ..TreeOptions::default()
    };
    let out = render(&resolve(&request()), &opts).unwrap();
    assert!(out.starts_with("{\n\t\"app:1.0.0\": {"));
}

#[test]
fn test_root_only() {
    let mut req = request();
    req.root_only = true;
    let res = resolve(&req);
    assert_eq!(res.tree.len(), 1);
    assert_eq!(res.tarballs.len(), 1);
}

#[test]
fn test_policy_override_and_bad_config_policy() {
    let mut req = request();
    req.policy = Some(AncestorPolicy::DeepestMatch);
    assert_eq!(resolve(&req).tree.len(), 6);

    let mut config = GlobalConfig::default();
    config.resolve.policy = "sideways".to_string();
    let err = ops_resolve::resolve(&config, &request()).unwrap_err();
    assert!(err.to_string().contains("unknown ancestor policy"));
}

#[test]
fn test_unsatisfiable_version_fails() {
    let req = ResolveRequest {
        registry_file: Some(fixture()),
        ..ResolveRequest::new("app", "^9")
    };
    let err = ops_resolve::resolve(&GlobalConfig::default(), &req).unwrap_err();
    assert!(err.to_string().contains("Dependency resolution failed for app@^9"));
}
