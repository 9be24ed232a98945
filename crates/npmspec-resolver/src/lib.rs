//! Dependency resolution engine: node-semver ranges, npm-style hoisting,
//! ancestor tracking and unify-and-relocate placement.

pub mod ancestor;
pub mod conflict;
pub mod exclusion;
pub mod package;
pub mod range;
pub mod resolver;
pub mod tree;
pub mod version;
