use npmspec_core::license::LicenseSet;
use npmspec_core::specfile::{interpolate, SpecContext, Specfile, BUILTIN_TEMPLATE};
use npmspec_core::tarball::TarballSet;
use tempfile::TempDir;

fn aggregates() -> (LicenseSet, TarballSet) {
    let mut licenses = LicenseSet::new();
    licenses.insert("MIT");
    licenses.insert("ISC");
    let mut tarballs = TarballSet::new();
    tarballs.insert("https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz");
    tarballs.insert("https://registry.npmjs.org/ms/-/ms-2.1.3.tgz");
    (licenses, tarballs)
}

#[test]
fn test_interpolate_unknown_placeholder_left_intact() {
    let ctx = SpecContext::new("left-pad", "1.3.0");
    assert_eq!(
        interpolate("<PACKAGE>-<VERSION> <OTHER>", &ctx),
        "left-pad-1.3.0 <OTHER>"
    );
}

#[test]
fn test_builtin_template_has_placeholders() {
    for p in ["<PACKAGE>", "<VERSION>", "<LICENSE>", "<SOURCE>"] {
        assert!(BUILTIN_TEMPLATE.contains(p), "missing {p}");
    }
}

#[test]
fn test_fill_builtin_template() {
    let tmp = TempDir::new().unwrap();
    let (licenses, tarballs) = aggregates();
    let mut spec = Specfile::open(tmp.path(), "left-pad", None).unwrap();
    assert!(spec.is_templated());
    spec.fill("left-pad", "1.3.0", &licenses, &tarballs);

    let out = spec.contents();
    assert!(out.contains("Name:           nodejs-left-pad\n"));
    assert!(out.contains("Version:        1.3.0\n"));
    assert!(out.contains("License:        MIT AND ISC\n"));
    assert!(out.contains(
        "Source0:\thttps://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz\n\
         Source1:\thttps://registry.npmjs.org/ms/-/ms-2.1.3.tgz\n"
    ));
    assert!(!out.contains('<'), "unfilled placeholder in:\n{out}");
}

#[test]
fn test_fill_custom_template() {
    let tmp = TempDir::new().unwrap();
    let template = tmp.path().join("custom.spec");
    std::fs::write(&template, "Name: <PACKAGE>\nLicense: <LICENSE>\n<SOURCE>\n").unwrap();
    let (licenses, tarballs) = aggregates();

    let mut spec = Specfile::open(tmp.path(), "left-pad", Some(&template)).unwrap();
    spec.fill("left-pad", "1.3.0", &licenses, &tarballs);
    assert!(spec.contents().starts_with("Name: left-pad\nLicense: MIT AND ISC\nSource0:"));
}

#[test]
fn test_missing_template_is_config_error() {
    let tmp = TempDir::new().unwrap();
    let err = Specfile::open(tmp.path(), "x", Some(&tmp.path().join("nope.spec"))).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_update_existing_spec_in_place() {
    let tmp = TempDir::new().unwrap();
    let existing = "Name:           nodejs-left-pad\n\
                    Version:        1.1.0\n\
                    License:        WTFPL\n\
                    Source0:        https://registry.npmjs.org/left-pad/-/left-pad-1.1.0.tgz\n\
                    Source1:        https://example.org/stale.tgz\n\
                    Source2:        https://example.org/stale2.tgz\n\
                    BuildArch:      noarch\n\
                    \n\
                    %changelog\n\
                    * keep this\n";
    std::fs::write(tmp.path().join("left-pad.spec"), existing).unwrap();
    let (licenses, tarballs) = aggregates();

    let mut spec = Specfile::open(tmp.path(), "left-pad", None).unwrap();
    assert!(!spec.is_templated());
    spec.fill("left-pad", "1.3.0", &licenses, &tarballs);
    spec.save().unwrap();

    let written = std::fs::read_to_string(tmp.path().join("left-pad.spec")).unwrap();
    assert_eq!(
        written,
        "Name:           nodejs-left-pad\n\
         Version:        1.3.0\n\
         License:        MIT AND ISC\n\
         Source0:\thttps://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz\n\
         Source1:\thttps://registry.npmjs.org/ms/-/ms-2.1.3.tgz\n\
         BuildArch:      noarch\n\
         \n\
         %changelog\n\
         * keep this\n"
    );
}

#[test]
fn test_save_writes_scoped_name_flat() {
    let tmp = TempDir::new().unwrap();
    let (licenses, tarballs) = aggregates();
    let mut spec = Specfile::open(tmp.path(), "@scope/pkg", None).unwrap();
    spec.fill("@scope/pkg", "0.1.0", &licenses, &tarballs);
    spec.save().unwrap();
    assert!(tmp.path().join("scope-pkg.spec").is_file());
}
