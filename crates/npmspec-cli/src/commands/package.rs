//! Handler for `npmspec package`.

use std::path::PathBuf;

use miette::Result;

use npmspec_core::config::GlobalConfig;
use npmspec_ops::ops_package::{self, PackageOptions};
use npmspec_util::progress::status;

use crate::cli::ResolveArgs;

pub fn exec(resolve: ResolveArgs, dir: PathBuf, template: Option<PathBuf>, no_service: bool) -> Result<()> {
    let config = GlobalConfig::load()?;
    tracing::debug!("Using registry {}", config.registry_url());
    let opts = PackageOptions {
        dir,
        template,
        service: !no_service,
    };
    let summary = ops_package::package(&config, &resolve.into(), &opts)?;
    status("Finished", &format!("packaging files in {}", opts.dir.display()));
    tracing::debug!("Tree written to {}", summary.tree_json.display());
    Ok(())
}
