//! Handler for `npmspec tree`.

use miette::Result;

use npmspec_core::config::GlobalConfig;
use npmspec_ops::ops_tree::{self, TreeOptions};

use crate::cli::ResolveArgs;

pub fn exec(
    resolve: ResolveArgs,
    why: Option<String>,
    conflicts: bool,
    licenses: bool,
    sources: bool,
    json: bool,
) -> Result<()> {
    let config = GlobalConfig::load()?;
    tracing::debug!("Using registry {}", config.registry_url());
    let opts = TreeOptions {
        why,
        conflicts,
        licenses,
        sources,
        json,
    };
    ops_tree::tree(&config, &resolve.into(), &opts)
}
