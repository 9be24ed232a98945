//! node-semver range expressions.
//!
//! A [`Range`] is an OR of [`ComparatorSet`]s, each an AND of
//! [`Comparator`]s. Shorthands are expanded at parse time:
//!
//! | input            | expansion                |
//! |------------------|--------------------------|
//! | `1.2.3`          | `=1.2.3`                 |
//! | `1.2` / `1.2.x`  | `>=1.2.0 <1.3.0`         |
//! | `*` / `x` / ``   | `>=0.0.0`                |
//! | `~1.2.3`         | `>=1.2.3 <1.3.0`         |
//! | `^0.2.3`         | `>=0.2.3 <0.3.0`         |
//! | `1.2.3 - 2.3`    | `>=1.2.3 <2.4.0`         |
//!
//! Every set is intersected down to at most one lower bound, one upper bound,
//! or a single fixed `=` comparator.

use std::fmt;
use std::str::FromStr;

use npmspec_util::errors::NpmspecError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::version::{Identifier, Version};

/// Comparison operator of a single [`Comparator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn is_lower(self) -> bool {
        matches!(self, Op::Gt | Op::Ge)
    }

    fn is_upper(self) -> bool {
        matches!(self, Op::Lt | Op::Le)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        })
    }
}

/// A single version test such as `>=1.2.3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub op: Op,
    pub version: Version,
}

impl Comparator {
    pub fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    /// Numeric test plus the prerelease guard: a comparator carrying a
    /// prerelease never matches a prerelease of another `major.minor.patch`,
    /// unless it is an exact `=`.
    pub fn satisfies(&self, v: &Version) -> bool {
        if self.op != Op::Eq
            && self.version.is_prerelease()
            && v.is_prerelease()
            && !self.version.main_eq(v)
        {
            return false;
        }
        match self.op {
            Op::Eq => v == &self.version,
            Op::Lt => v < &self.version,
            Op::Le => v <= &self.version,
            Op::Gt => v > &self.version,
            Op::Ge => v >= &self.version,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// An intersected conjunction of comparators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparatorSet {
    comparators: Vec<Comparator>,
}

impl ComparatorSet {
    /// Reduce `comparators` to the tightest lower bound, the tightest upper
    /// bound, or the single fixed comparator they imply.
    ///
    /// Fails when two different `=` comparators are present, or when the
    /// fixed value falls outside the reduced bounds.
    pub fn intersect(comparators: Vec<Comparator>) -> Result<Self, NpmspecError> {
        let mut lower: Option<Comparator> = None;
        let mut upper: Option<Comparator> = None;
        let mut fixed: Option<Comparator> = None;

        for c in comparators {
            if c.op.is_lower() {
                lower = Some(match lower {
                    Some(cur) if tighter_lower(&cur, &c) => cur,
                    _ => c,
                });
            } else if c.op.is_upper() {
                upper = Some(match upper {
                    Some(cur) if tighter_upper(&cur, &c) => cur,
                    _ => c,
                });
            } else {
                match &fixed {
                    Some(f) if f.version != c.version => {
                        return Err(NpmspecError::Invariant {
                            message: format!("conflicting fixed versions {f} and {c} in one clause"),
                        });
                    }
                    Some(_) => {}
                    None => fixed = Some(c),
                }
            }
        }

        if let Some(f) = fixed {
            for bound in lower.iter().chain(upper.iter()) {
                if !bound.satisfies(&f.version) {
                    return Err(NpmspecError::Invariant {
                        message: format!("fixed version {f} is outside its own bound {bound}"),
                    });
                }
            }
            return Ok(Self {
                comparators: vec![f],
            });
        }

        Ok(Self {
            comparators: lower.into_iter().chain(upper).collect(),
        })
    }

    pub fn comparators(&self) -> &[Comparator] {
        &self.comparators
    }

    pub fn satisfies(&self, v: &Version) -> bool {
        self.comparators.iter().all(|c| c.satisfies(v))
    }
}

/// `cur` stays when it is strictly higher, or equal and already exclusive.
fn tighter_lower(cur: &Comparator, new: &Comparator) -> bool {
    cur.version > new.version || (cur.version == new.version && cur.op == Op::Gt)
}

/// `cur` stays when it is strictly lower, or equal and already exclusive.
fn tighter_upper(cur: &Comparator, new: &Comparator) -> bool {
    cur.version < new.version || (cur.version == new.version && cur.op == Op::Lt)
}

impl fmt::Display for ComparatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.comparators.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" "))
    }
}

/// A parsed version range: a disjunction of comparator sets.
#[derive(Debug, Clone)]
pub struct Range {
    raw: String,
    sets: Vec<ComparatorSet>,
}

impl Range {
    pub fn parse(expr: &str) -> Result<Self, NpmspecError> {
        let sets = expr
            .split("||")
            .map(|clause| parse_clause(expr, clause))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: expr.to_string(),
            sets,
        })
    }

    /// The range matching every release, `>=0.0.0`.
    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            sets: vec![ComparatorSet {
                comparators: vec![Comparator::new(Op::Ge, Version::new(0, 0, 0))],
            }],
        }
    }

    /// The expression this range was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn sets(&self) -> &[ComparatorSet] {
        &self.sets
    }

    pub fn satisfies(&self, v: &Version) -> bool {
        self.sets.iter().any(|set| set.satisfies(v))
    }
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.sets == other.sets
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.sets.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" || "))
    }
}

impl FromStr for Range {
    type Err = NpmspecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Range {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Range::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// The first (highest, given a descending list) version satisfying `range`.
pub fn resolve<'a>(versions: &'a [Version], range: &Range) -> Option<&'a Version> {
    versions.iter().find(|v| range.satisfies(v))
}

fn parse_clause(expr: &str, clause: &str) -> Result<ComparatorSet, NpmspecError> {
    let error = |reason: String| NpmspecError::Constraint {
        constraint: expr.to_string(),
        reason,
    };

    let normalized = clause.replace(',', " ");
    let tokens = join_operators(normalized.split_whitespace());

    let mut comparators = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens.get(i + 1).map(String::as_str) == Some("-") {
            let upper = tokens
                .get(i + 2)
                .ok_or_else(|| error(format!("hyphen range `{} -` has no upper end", tokens[i])))?;
            let from = Partial::parse(&tokens[i]).ok_or_else(|| error(unrecognized(&tokens[i])))?;
            let to = Partial::parse(upper).ok_or_else(|| error(unrecognized(upper)))?;
            expand_hyphen(&from, &to, &mut comparators).map_err(error)?;
            i += 3;
            continue;
        }

        let (op, rest) = split_operator(&tokens[i]);
        let partial = Partial::parse(rest).ok_or_else(|| error(unrecognized(&tokens[i])))?;
        expand(op, &partial, &mut comparators).map_err(error)?;
        i += 1;
    }

    if comparators.is_empty() {
        comparators.push(Comparator::new(Op::Ge, Version::new(0, 0, 0)));
    }
    ComparatorSet::intersect(comparators)
}

fn unrecognized(token: &str) -> String {
    format!("unrecognized comparator `{token}`")
}

/// Glue a bare operator token onto the version that follows it, so
/// `>= 2.1.2` and `>=2.1.2` tokenize the same way.
fn join_operators<'a>(words: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending = String::new();
    for word in words {
        if !word.is_empty() && word.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
            pending.push_str(word);
            continue;
        }
        tokens.push(format!("{pending}{word}"));
        pending.clear();
    }
    if !pending.is_empty() {
        tokens.push(pending);
    }
    tokens
}

/// Range operators as written, including the shorthands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeOp {
    Exact,
    Cmp(Op),
    Tilde,
    Caret,
}

fn split_operator(token: &str) -> (RangeOp, &str) {
    const OPERATORS: [(&str, RangeOp); 8] = [
        (">=", RangeOp::Cmp(Op::Ge)),
        ("<=", RangeOp::Cmp(Op::Le)),
        ("~>", RangeOp::Tilde),
        (">", RangeOp::Cmp(Op::Gt)),
        ("<", RangeOp::Cmp(Op::Lt)),
        ("=", RangeOp::Exact),
        ("~", RangeOp::Tilde),
        ("^", RangeOp::Caret),
    ];
    for (prefix, op) in OPERATORS {
        if let Some(rest) = token.strip_prefix(prefix) {
            return (op, rest);
        }
    }
    (RangeOp::Exact, token)
}

/// A possibly incomplete version such as `1`, `1.2.x` or `*`.
///
/// `None` marks a missing or wildcard component; everything after the first
/// wildcard is treated as a wildcard too.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Vec<Identifier>,
}

impl Partial {
    fn parse(token: &str) -> Option<Self> {
        let token = token.trim_start_matches(['v', 'V', '=']);
        if token.is_empty() {
            return Some(Self::wildcard());
        }
        let core_end = token.find(['-', '+']).unwrap_or(token.len());
        let core = &token[..core_end];

        let mut parts = core.split('.');
        let mut wild = false;
        let mut component = |part: Option<&str>| -> Option<Option<u64>> {
            match part {
                None => {
                    wild = true;
                    Some(None)
                }
                Some("x" | "X" | "*") => {
                    wild = true;
                    Some(None)
                }
                Some(p) if !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()) => {
                    let n = p.parse::<u64>().ok()?;
                    Some(if wild { None } else { Some(n) })
                }
                Some(_) => None,
            }
        };
        let major = component(parts.next())?;
        let minor = component(parts.next())?;
        let patch = component(parts.next())?;
        if parts.next().is_some() {
            return None;
        }

        let pre = if patch.is_some() && core_end < token.len() {
            Version::parse(token).ok()?.pre
        } else {
            Vec::new()
        };
        Some(Self {
            major,
            minor,
            patch,
            pre,
        })
    }

    fn wildcard() -> Self {
        Self {
            major: None,
            minor: None,
            patch: None,
            pre: Vec::new(),
        }
    }

    /// Missing components filled with zero; keeps the prerelease.
    fn floor(&self) -> Version {
        Version {
            pre: self.pre.clone(),
            ..Version::new(
                self.major.unwrap_or(0),
                self.minor.unwrap_or(0),
                self.patch.unwrap_or(0),
            )
        }
    }

    /// One unit above the last specified component, for partials only.
    fn next_excluded(&self) -> Result<Option<Version>, String> {
        Ok(match (self.major, self.minor, self.patch) {
            (Some(m), None, _) => Some(Version::new(bump(m)?, 0, 0)),
            (Some(m), Some(n), None) => Some(Version::new(m, bump(n)?, 0)),
            _ => None,
        })
    }
}

fn bump(n: u64) -> Result<u64, String> {
    n.checked_add(1)
        .ok_or_else(|| format!("version component {n} has no successor"))
}

fn any() -> Comparator {
    Comparator::new(Op::Ge, Version::new(0, 0, 0))
}

fn nothing() -> Comparator {
    Comparator::new(Op::Lt, Version::new(0, 0, 0))
}

fn expand(op: RangeOp, p: &Partial, out: &mut Vec<Comparator>) -> Result<(), String> {
    let Some(major) = p.major else {
        // `*`, `>=*`, `<=*`, `~*`, `^*` mean anything; `>*` and `<*` nothing.
        out.push(match op {
            RangeOp::Cmp(Op::Gt) | RangeOp::Cmp(Op::Lt) => nothing(),
            _ => any(),
        });
        return Ok(());
    };

    match op {
        RangeOp::Exact | RangeOp::Cmp(Op::Eq) => match p.next_excluded()? {
            Some(ceiling) => {
                out.push(Comparator::new(Op::Ge, p.floor()));
                out.push(Comparator::new(Op::Lt, ceiling));
            }
            None => out.push(Comparator::new(Op::Eq, p.floor())),
        },
        RangeOp::Cmp(Op::Gt) => match p.next_excluded()? {
            Some(next) => out.push(Comparator::new(Op::Ge, next)),
            None => out.push(Comparator::new(Op::Gt, p.floor())),
        },
        RangeOp::Cmp(Op::Le) => match p.next_excluded()? {
            Some(next) => out.push(Comparator::new(Op::Lt, next)),
            None => out.push(Comparator::new(Op::Le, p.floor())),
        },
        RangeOp::Cmp(op) => out.push(Comparator::new(op, p.floor())),
        RangeOp::Tilde => {
            let ceiling = match p.minor {
                Some(minor) => Version::new(major, bump(minor)?, 0),
                None => Version::new(bump(major)?, 0, 0),
            };
            out.push(Comparator::new(Op::Ge, p.floor()));
            out.push(Comparator::new(Op::Lt, ceiling));
        }
        RangeOp::Caret => {
            let ceiling = match (major, p.minor, p.patch) {
                (0, Some(0), Some(patch)) => Version::new(0, 0, bump(patch)?),
                (0, Some(minor), _) => Version::new(0, bump(minor)?, 0),
                _ => Version::new(bump(major)?, 0, 0),
            };
            out.push(Comparator::new(Op::Ge, p.floor()));
            out.push(Comparator::new(Op::Lt, ceiling));
        }
    }
    Ok(())
}

fn expand_hyphen(from: &Partial, to: &Partial, out: &mut Vec<Comparator>) -> Result<(), String> {
    out.push(Comparator::new(Op::Ge, from.floor()));
    if to.major.is_none() {
        return Ok(());
    }
    match to.next_excluded()? {
        Some(ceiling) => out.push(Comparator::new(Op::Lt, ceiling)),
        None => out.push(Comparator::new(Op::Le, to.floor())),
    }
    Ok(())
}
