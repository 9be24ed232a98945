//! RPM spec file for a bundled npm package.
//!
//! A package without a spec file gets one rendered from a template: the
//! built-in one compiled into the binary via `include_str!`, or a file the
//! user points at. `<PACKAGE>`, `<VERSION>`, `<LICENSE>` and `<SOURCE>`
//! placeholders are substituted at render time.
//!
//! When `<name>.spec` already exists it is updated in place instead: the
//! `Version:` and `License:` tag values are rewritten and the run of
//! `SourceN:` tags is replaced by the freshly numbered list. Everything else
//! the packager wrote is left untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use npmspec_util::errors::NpmspecError;
use npmspec_util::fs::{read_optional, write_atomic};

use crate::license::LicenseSet;
use crate::tarball::TarballSet;

/// The template used when neither the command line nor config names one.
pub const BUILTIN_TEMPLATE: &str = include_str!("../templates/nodejs.spec");

/// Values for `<KEY>` placeholders.
pub struct SpecContext {
    vars: BTreeMap<String, String>,
}

impl SpecContext {
    /// Create a context with the package name and version set.
    pub fn new(package: &str, version: &str) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("PACKAGE".to_string(), package.to_string());
        vars.insert("VERSION".to_string(), version.to_string());
        Self { vars }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

/// Replace all `<KEY>` placeholders in `input` with values from `ctx`.
/// Unknown keys are left intact.
pub fn interpolate(input: &str, ctx: &SpecContext) -> String {
    let mut result = input.to_string();
    for (key, value) in &ctx.vars {
        result = result.replace(&format!("<{key}>"), value);
    }
    result
}

#[derive(Debug, Clone)]
pub struct Specfile {
    path: PathBuf,
    raw: String,
    templated: bool,
}

impl Specfile {
    /// Open `<dir>/<name>.spec`, falling back to `template` (or the built-in
    /// template) when it does not exist yet.
    pub fn open(dir: &Path, name: &str, template: Option<&Path>) -> Result<Self, NpmspecError> {
        let path = dir.join(format!("{}.spec", spec_basename(name)));
        if let Some(raw) = read_optional(&path)? {
            tracing::debug!("Updating existing {}", path.display());
            return Ok(Self {
                path,
                raw,
                templated: false,
            });
        }

        let raw = match template {
            Some(t) => read_optional(t)?.ok_or_else(|| NpmspecError::Config {
                message: format!("Spec template {} does not exist", t.display()),
            })?,
            None => BUILTIN_TEMPLATE.to_string(),
        };
        Ok(Self {
            path,
            raw,
            templated: true,
        })
    }

    /// Whether the content came from a template rather than an existing spec.
    pub fn is_templated(&self) -> bool {
        self.templated
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.raw
    }

    pub fn fill(&mut self, package: &str, version: &str, licenses: &LicenseSet, tarballs: &TarballSet) {
        let sources = tarballs.source_lines();
        let sources = sources.trim_end_matches('\n');
        if self.templated {
            let mut ctx = SpecContext::new(package, version);
            ctx.set("LICENSE", licenses.to_string());
            ctx.set("SOURCE", sources);
            self.raw = interpolate(&self.raw, &ctx);
        } else {
            self.raw = update_tag(&self.raw, "Version", version);
            self.raw = update_tag(&self.raw, "License", &licenses.to_string());
            self.raw = replace_sources(&self.raw, sources);
        }
    }

    pub fn save(&self) -> Result<(), NpmspecError> {
        write_atomic(&self.path, self.raw.as_bytes())
    }
}

/// Scoped packages are stored flat: `@types/node` becomes `types-node`.
pub fn spec_basename(name: &str) -> String {
    name.trim_start_matches('@').replace('/', "-")
}

/// Byte offset of the value of `tag:` on `line`, keeping the alignment
/// whitespace after the colon.
fn tag_value_offset(line: &str, tag: &str) -> Option<usize> {
    let head = line.get(..tag.len())?;
    if !head.eq_ignore_ascii_case(tag) || !line[tag.len()..].starts_with(':') {
        return None;
    }
    let after = &line[tag.len() + 1..];
    Some(line.len() - after.trim_start().len())
}

fn update_tag(raw: &str, tag: &str, value: &str) -> String {
    let mut found = false;
    let lines: Vec<String> = raw
        .lines()
        .map(|line| match tag_value_offset(line, tag) {
            Some(offset) if !found => {
                found = true;
                format!("{}{value}", &line[..offset])
            }
            _ => line.to_string(),
        })
        .collect();
    if !found {
        tracing::warn!("No `{tag}:` tag in the existing spec, left unchanged");
    }
    rejoin(raw, lines)
}

fn is_source_tag(line: &str) -> bool {
    let Some(head) = line.get(..6) else {
        return false;
    };
    if !head.eq_ignore_ascii_case("source") {
        return false;
    }
    let rest = line[6..].trim_start_matches(|c: char| c.is_ascii_digit());
    rest.starts_with(':')
}

/// Drop every `SourceN:` line and put `sources` where the first one was.
fn replace_sources(raw: &str, sources: &str) -> String {
    let mut lines = Vec::new();
    let mut inserted = false;
    for line in raw.lines() {
        if is_source_tag(line) {
            if !inserted {
                lines.extend(sources.lines().map(str::to_string));
                inserted = true;
            }
            continue;
        }
        lines.push(line.to_string());
    }
    if !inserted {
        tracing::warn!("No `Source:` tags in the existing spec, left unchanged");
    }
    rejoin(raw, lines)
}

fn rejoin(original: &str, lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    if original.ends_with('\n') {
        out.push('\n');
    }
    out
}
