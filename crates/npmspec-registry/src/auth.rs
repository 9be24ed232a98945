//! Registry authentication.
//!
//! A token set as `registry.token` in `~/.npmspec/config.toml` is sent as a
//! bearer token with every packument request.

use reqwest::RequestBuilder;

use crate::repository::NpmRegistry;

/// Apply authentication to a request if the registry has a token.
pub fn apply_auth(request: RequestBuilder, registry: &NpmRegistry) -> RequestBuilder {
    match &registry.token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}
