//! The aggregate `License:` expression of a resolved tree.

use std::fmt;

/// Licenses that put no requirement on the package and are left out of the
/// aggregate.
const WAIVED: &[&str] = &["Unlicense"];

/// Normalize a license string as published in a packument.
///
/// Parentheses are dropped. A single license keeps no inner spaces
/// (`Apache License 2.0` becomes `Apache-License-2.0`) while an `OR` list is
/// left as is so [`LicenseSet::insert`] can split it.
pub fn normalize_expression(raw: &str) -> String {
    let raw = raw.trim();
    let spaced = if raw.contains(" OR ") {
        raw.to_string()
    } else {
        raw.replace(' ', "-")
    };
    spaced.replace(['(', ')'], "")
}

/// Distinct license identifiers in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseSet {
    tokens: Vec<String>,
}

impl LicenseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one package's license. `X OR Y` contributes both identifiers;
    /// an empty string contributes nothing.
    pub fn insert(&mut self, expression: &str) {
        for token in expression.split(" OR ") {
            let token = token.trim();
            if token.is_empty() || WAIVED.contains(&token) {
                continue;
            }
            if !self.tokens.iter().any(|t| t == token) {
                self.tokens.push(token.to_string());
            }
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

impl fmt::Display for LicenseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" AND "))
    }
}
