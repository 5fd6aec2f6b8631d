//! Error types for the catalog linter

use std::path::PathBuf;

use thiserror::Error;

/// Result type for lint operations
pub type Result<T> = std::result::Result<T, LintError>;

/// Catalog linter errors
///
/// Only `RootNotFound` and a failed directory walk abort a run. Every other
/// variant is captured per file or downgraded to a logged warning.
#[derive(Error, Debug)]
pub enum LintError {
    #[error("Catalog root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk catalog directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid frontmatter in {}: {message}", path.display())]
    Frontmatter {
        path: PathBuf,
        message: String,
        line: Option<usize>,
    },

    #[error("Invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        line: Option<usize>,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Frontmatter in {} must be a mapping, found {found}", path.display())]
    InvalidHeader { path: PathBuf, found: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },
}

impl LintError {
    /// Line within the source file the error points at, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Frontmatter { line, .. } | Self::Yaml { line, .. } => *line,
            _ => None,
        }
    }
}
