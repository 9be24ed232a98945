//! npm registry protocol: URL layout, packument parsing, HTTP fetch with
//! retries, the response cache, and registries backed by the network or by a
//! local JSON file.

pub mod auth;
pub mod cache;
pub mod download;
pub mod http;
pub mod offline;
pub mod packument;
pub mod repository;
