use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all npmspec operations.
///
/// Every variant is terminal for a resolution run: nothing is retried at this
/// level and no partial output is written.
#[derive(Debug, Error, Diagnostic)]
pub enum NpmspecError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A version string that is not valid semver.
    #[error("Invalid version `{version}`: {reason}")]
    InvalidVersion { version: String, reason: String },

    /// A malformed version range expression.
    #[error("Invalid version constraint `{constraint}`: {reason}")]
    #[diagnostic(help(
        "npm ranges look like `^1.2.3`, `~1.2`, `>=1.0.0 <2.0.0`, `1.x` or `1.2.3 - 2.0.0`"
    ))]
    Constraint { constraint: String, reason: String },

    /// No published version of a package satisfies the requested range.
    #[error("Dependency resolution failed for {package}@{constraint}: {message}")]
    #[diagnostic(help("Exclude the package with `--exclude {package}` if it is provided elsewhere"))]
    Resolution {
        package: String,
        constraint: String,
        message: String,
    },

    /// Registry transport failure, non-success status or unreadable body.
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// An internal contradiction in the engine or its input.
    #[error("Invariant violated: {message}")]
    Invariant { message: String },

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.npmspec/config.toml for syntax errors"))]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type NpmspecResult<T> = miette::Result<T>;
