//! Command dispatch and handler modules.

mod package;
mod tree;

use miette::Result;
use npmspec_ops::ops_resolve::ResolveRequest;

use crate::cli::{Cli, Command, ResolveArgs};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Tree {
            resolve,
            why,
            conflicts,
            licenses,
            sources,
            json,
        } => tree::exec(resolve, why, conflicts, licenses, sources, json),
        Command::Package {
            resolve,
            dir,
            template,
            no_service,
        } => package::exec(resolve, dir, template, no_service),
    }
}

impl From<ResolveArgs> for ResolveRequest {
    fn from(args: ResolveArgs) -> Self {
        Self {
            name: args.package,
            version: args.version,
            exclude: args.exclude,
            registry_file: args.registry_file,
            policy: args.policy,
            root_only: args.no_bundle,
        }
    }
}
