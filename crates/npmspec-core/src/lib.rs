//! Core data types for npmspec.
//!
//! This crate defines what the resolver collects and what gets written for a
//! package: user configuration, the license and tarball aggregates, and the
//! RPM spec file they are rendered into.
//!
//! This crate is intentionally free of async code and network I/O.

/// Public npm registry used when neither config nor environment name one.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

pub mod config;
pub mod license;
pub mod specfile;
pub mod tarball;
