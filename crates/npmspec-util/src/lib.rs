//! Shared utilities for npmspec.
//!
//! Cross-cutting concerns used by every other npmspec crate: the unified
//! error type, filesystem helpers and Cargo-style terminal output.

pub mod errors;
pub mod fs;
pub mod progress;
