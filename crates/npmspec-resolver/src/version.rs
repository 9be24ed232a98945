//! node-semver version values.
//!
//! Ordering follows semver 2.0.0 precedence:
//! - `major`, `minor`, `patch` compare numerically
//! - a release sorts above any prerelease of the same `major.minor.patch`
//! - prerelease identifiers compare pairwise: numeric < alphanumeric,
//!   numerics by value, alphanumerics lexically, longer list wins on a tie
//! - build metadata is ignored for ordering, equality and hashing

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use npmspec_util::errors::NpmspecError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One dot-separated prerelease identifier.
///
/// Variant order matters: the derived `Ord` ranks every numeric identifier
/// below every alphanumeric one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identifier {
    Numeric(u64),
    AlphaNumeric(String),
}

impl Identifier {
    fn parse(token: &str) -> Option<Self> {
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
        Some(match token.parse::<u64>() {
            Ok(n) => Identifier::Numeric(n),
            Err(_) => Identifier::AlphaNumeric(token.to_string()),
        })
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{n}"),
            Identifier::AlphaNumeric(s) => f.write_str(s),
        }
    }
}

/// A parsed, immutable semantic version.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Vec<Identifier>,
    pub build: String,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Vec::new(),
            build: String::new(),
        }
    }

    /// Parse a version leniently: a leading `v` or `=` is ignored and missing
    /// `minor` / `patch` components default to `0`.
    pub fn parse(input: &str) -> Result<Self, NpmspecError> {
        let invalid = |reason: &str| NpmspecError::InvalidVersion {
            version: input.to_string(),
            reason: reason.to_string(),
        };

        let s = input.trim();
        let s = s.strip_prefix('=').unwrap_or(s).trim_start();
        let s = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .unwrap_or(s);
        if s.is_empty() {
            return Err(invalid("empty version"));
        }

        let (s, build) = match s.split_once('+') {
            Some((rest, build)) => (rest, build),
            None => (s, ""),
        };
        if !build.is_empty() && build.split('.').any(|b| Identifier::parse(b).is_none()) {
            return Err(invalid("malformed build metadata"));
        }

        let (core, pre) = match s.split_once('-') {
            Some((core, pre)) => {
                let ids: Option<Vec<Identifier>> = pre.split('.').map(Identifier::parse).collect();
                (core, ids.ok_or_else(|| invalid("malformed prerelease"))?)
            }
            None => (s, Vec::new()),
        };

        let mut parts = core.split('.');
        let mut component = |name: &str, required: bool| -> Result<u64, NpmspecError> {
            match parts.next() {
                Some(p) if !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()) => p
                    .parse::<u64>()
                    .map_err(|_| invalid(&format!("{name} component out of range"))),
                Some(_) => Err(invalid(&format!("{name} component is not a number"))),
                None if required => Err(invalid(&format!("missing {name} component"))),
                None => Ok(0),
            }
        };
        let major = component("major", true)?;
        let minor = component("minor", false)?;
        let patch = component("patch", false)?;
        if parts.next().is_some() {
            return Err(invalid("too many components"));
        }

        Ok(Self {
            major,
            minor,
            patch,
            pre,
            build: build.to_string(),
        })
    }

    /// `true` when `major.minor.patch` match, ignoring prerelease and build.
    pub fn main_eq(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor && self.patch == other.patch
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// The same version stripped of prerelease and build metadata.
    pub fn release(&self) -> Self {
        Self::new(self.major, self.minor, self.patch)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.pre.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            let pre: Vec<String> = self.pre.iter().map(ToString::to_string).collect();
            write!(f, "-{}", pre.join("."))?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = NpmspecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}
