//! Operation: display the dependency tree.

use npmspec_core::config::GlobalConfig;
use npmspec_resolver::resolver::Resolution;
use npmspec_util::errors::{NpmspecError, NpmspecResult};

use crate::ops_resolve::{self, ResolveRequest};

/// Options for `npmspec tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Show the path from the root to a package (`name` or `name:version`).
    pub why: Option<String>,
    /// Show packages placed at more than one version.
    pub conflicts: bool,
    /// Show the aggregate license expression.
    pub licenses: bool,
    /// Show the RPM `SourceN:` lines.
    pub sources: bool,
    /// Print the tree as JSON.
    pub json: bool,
}

/// Resolve and print the tree, or the view `opts` selects.
pub fn tree(config: &GlobalConfig, request: &ResolveRequest, opts: &TreeOptions) -> NpmspecResult<()> {
    let resolution = ops_resolve::resolve(config, request)?;
    print!("{}", render(&resolution, opts)?);
    Ok(())
}

/// Text for the view `opts` selects, newline-terminated.
pub fn render(resolution: &Resolution, opts: &TreeOptions) -> NpmspecResult<String> {
    if let Some(ref target) = opts.why {
        let Some(path) = resolution.tree.find_path(target) else {
            return Ok(format!("Dependency '{target}' not found in the tree.\n"));
        };
        let mut out = format!("Path to {target}:\n");
        for (i, node) in path.iter().enumerate() {
            out.push_str(&format!("{}{node}\n", "  ".repeat(i)));
        }
        return Ok(out);
    }

    if opts.conflicts {
        let report = resolution.conflicts();
        return Ok(if report.is_empty() {
            format!("{report}\n")
        } else {
            report.to_string()
        });
    }

    if opts.licenses {
        if resolution.licenses.is_empty() {
            return Ok("No licenses declared.\n".to_string());
        }
        return Ok(format!("{}\n", resolution.licenses));
    }

    if opts.sources {
        return Ok(resolution.tarballs.source_lines());
    }

    if opts.json {
        let json = resolution.tree.to_json_pretty().map_err(|e| NpmspecError::Generic {
            message: format!("Failed to serialize tree: {e}"),
        })?;
        return Ok(format!("{json}\n"));
    }

    Ok(resolution.tree.render())
}
