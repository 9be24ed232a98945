//! CLI argument definitions for npmspec.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use npmspec_resolver::ancestor::AncestorPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "npmspec",
    version,
    about = "Bundle an npm package and its dependencies into an RPM spec file",
    long_about = "npmspec resolves an npm package the way npm would lay it out on disk, \
                  then writes an RPM spec file listing every tarball as a Source and an \
                  OSC _service file that downloads them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Arguments shared by every command that resolves a package.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Package name, or a registry URL ending in the name
    pub package: String,
    /// Dist-tag or version range to resolve
    #[arg(long, default_value = "latest")]
    pub version: String,
    /// Packages to leave out: `name`, `name:1.0.0` or `name:^2`, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Vec<String>,
    /// Read packuments from a JSON file instead of the registry
    #[arg(long, value_name = "FILE")]
    pub registry_file: Option<PathBuf>,
    /// How a relocated package's shared ancestor is chosen
    #[arg(long, value_parser = parse_policy)]
    pub policy: Option<AncestorPolicy>,
    /// Resolve the package alone, without bundling its dependencies
    #[arg(long)]
    pub no_bundle: bool,
}

fn parse_policy(s: &str) -> Result<AncestorPolicy, String> {
    s.parse().map_err(|e| format!("{e}"))
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a package and print its hoisted dependency tree
    Tree {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Explain why a package is included
        #[arg(long)]
        why: Option<String>,
        /// Show packages placed at more than one version
        #[arg(long)]
        conflicts: bool,
        /// Show the aggregate license expression
        #[arg(long)]
        licenses: bool,
        /// Show RPM Source lines
        #[arg(long)]
        sources: bool,
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a package and write its JSON tree, spec file and _service
    Package {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// Spec template used when no spec file exists yet
        #[arg(short, long)]
        template: Option<PathBuf>,
        /// Do not write _service
        #[arg(long)]
        no_service: bool,
    },
}

/// Parse CLI arguments from `std::env::args`.
pub fn parse() -> Cli {
    Cli::parse()
}
