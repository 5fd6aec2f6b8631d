//! Catalog Scanner
//!
//! Discovers resource files by path convention and derives each file's
//! `(resourceType, resourceId, version?)` from where it sits in the tree.
//!
//! ```text
//! domains/
//! ├── Orders/
//! │   ├── index.mdx                      domain  Orders
//! │   ├── versioned/0.0.1/index.mdx      domain  Orders@0.0.1
//! │   ├── subdomains/Billing/index.mdx   domain  Orders/subdomains/Billing
//! │   └── services/InventoryService/
//! │       └── index.mdx                  service InventoryService
//! events/
//! └── OrderPlaced/
//!     ├── index.mdx                      event   OrderPlaced
//!     └── versioned/1.0.0/index.mdx      event   OrderPlaced@1.0.0
//! users/
//! └── jdoe.mdx                           user    jdoe
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{LintError, Result};
use crate::resource::ResourceType;

/// A file discovered under the catalog root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the catalog root, always `/`-separated
    pub relative_path: String,
    pub resource_type: ResourceType,
    /// Identifier derived from the path (the header `id` may override it)
    pub resource_id: String,
    /// Version derived from a `versioned/<ver>/` segment, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl CatalogFile {
    /// Build a catalog file from a path relative to `root`
    pub fn new(root: &Path, relative_path: &str, resource_type: ResourceType) -> Self {
        let relative_path = relative_path.replace('\\', "/");
        let info = extract_resource_info(&relative_path, resource_type);
        Self {
            path: root.join(&relative_path),
            relative_path,
            resource_type,
            resource_id: info.id,
            version: info.version,
        }
    }
}

/// Identity derived from a file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    pub id: String,
    pub version: Option<String>,
}

impl ResourceInfo {
    fn unversioned(id: impl Into<String>) -> Self {
        Self { id: id.into(), version: None }
    }
}

/// Derive `(id, version?)` from a catalog-relative path.
///
/// Never fails: unexpected layouts degrade to a best-effort id.
pub fn extract_resource_info(relative_path: &str, resource_type: ResourceType) -> ResourceInfo {
    let normalized = relative_path.replace('\\', "/");
    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

    if resource_type.is_directory_less() {
        let stem = Path::new(&normalized)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");
        return ResourceInfo::unversioned(stem);
    }

    let Some(type_index) = segments.iter().position(|s| *s == resource_type.dir_name()) else {
        // No `<type>s/` segment: take the directory holding the file
        let id = segments
            .len()
            .checked_sub(2)
            .and_then(|i| segments.get(i))
            .copied()
            .unwrap_or("unknown");
        return ResourceInfo::unversioned(id);
    };

    let end = segments.len().saturating_sub(1);
    let tail: &[&str] = if type_index + 1 < end {
        &segments[type_index + 1..end]
    } else {
        &[]
    };

    if tail.is_empty() {
        return ResourceInfo::unversioned("unknown");
    }

    // <id...>/versioned/<version>
    if tail.len() >= 3 && tail[tail.len() - 2] == "versioned" {
        return with_fallback_id(tail[..tail.len() - 2].join("/"), Some(tail[tail.len() - 1]));
    }

    // Domains may nest `versioned` under subdomains
    if resource_type == ResourceType::Domain {
        if let Some(at) = tail.iter().position(|s| *s == "versioned") {
            if at + 1 < tail.len() {
                return with_fallback_id(tail[..at].join("/"), Some(tail[at + 1]));
            }
        }
    }

    ResourceInfo::unversioned(tail.join("/"))
}

fn with_fallback_id(id: String, version: Option<&str>) -> ResourceInfo {
    ResourceInfo {
        id: if id.is_empty() { "unknown".to_string() } else { id },
        version: version.map(String::from),
    }
}

/// Path patterns for a resource type, relative to the catalog root
pub fn default_patterns(resource_type: ResourceType) -> Vec<String> {
    match resource_type {
        ResourceType::Domain => vec![
            "domains/*/index.{md,mdx}".to_string(),
            "domains/*/versioned/*/index.{md,mdx}".to_string(),
            "domains/*/subdomains/*/index.{md,mdx}".to_string(),
            "domains/*/subdomains/*/versioned/*/index.{md,mdx}".to_string(),
        ],
        ResourceType::Service => vec![
            "domains/*/services/*/index.{md,mdx}".to_string(),
            "domains/*/services/*/versioned/*/index.{md,mdx}".to_string(),
            "domains/*/subdomains/*/services/*/index.{md,mdx}".to_string(),
            "domains/*/subdomains/*/services/*/versioned/*/index.{md,mdx}".to_string(),
            "services/*/index.{md,mdx}".to_string(),
            "services/*/versioned/*/index.{md,mdx}".to_string(),
        ],
        ResourceType::User | ResourceType::Team => {
            vec![format!("{}/*.{{md,mdx}}", resource_type.dir_name())]
        }
        other => vec![
            format!("**/{}/*/index.{{md,mdx}}", other.dir_name()),
            format!("**/{}/*/versioned/*/index.{{md,mdx}}", other.dir_name()),
        ],
    }
}

/// Walks a catalog root and classifies files by resource type
pub struct Scanner {
    root: PathBuf,
    matchers: Vec<(ResourceType, GlobSet)>,
    /// Directory names never descended into
    skip_dirs: Vec<String>,
}

impl Scanner {
    /// Scanner using the standard catalog layout
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let patterns: Vec<_> = ResourceType::ALL
            .iter()
            .map(|rt| (*rt, default_patterns(*rt)))
            .collect();
        Self::with_patterns(root, &patterns)
    }

    /// Scanner with custom patterns; order of `patterns` is the output order
    pub fn with_patterns(
        root: impl AsRef<Path>,
        patterns: &[(ResourceType, Vec<String>)],
    ) -> Result<Self> {
        let mut matchers = Vec::with_capacity(patterns.len());
        for (resource_type, globs) in patterns {
            matchers.push((*resource_type, compile_globset(globs)?));
        }

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            matchers,
            skip_dirs: vec!["node_modules".to_string(), ".git".to_string()],
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discover all catalog files, grouped by type then sorted by path
    pub fn scan(&self) -> Result<Vec<CatalogFile>> {
        if !self.root.is_dir() {
            return Err(LintError::RootNotFound(self.root.clone()));
        }
        let root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());

        let mut relative_paths = Vec::new();
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !self.skip_dirs.iter().any(|d| e.file_name() == d.as_str())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(err.into()),
                Err(err) => {
                    tracing::warn!("Skipping unreadable catalog entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else { continue };
            relative_paths.push(relative.to_string_lossy().replace('\\', "/"));
        }

        let mut files = Vec::new();
        for (resource_type, globs) in &self.matchers {
            let before = files.len();
            for relative in &relative_paths {
                if globs.is_match(relative.as_str()) {
                    files.push(CatalogFile::new(&root, relative, *resource_type));
                }
            }
            tracing::trace!("Matched {} {} file(s)", files.len() - before, resource_type);
        }

        tracing::debug!("Scanned {} catalog file(s) under {}", files.len(), root.display());
        Ok(files)
    }
}

/// Scan a catalog root with the standard layout
pub fn scan_catalog(root: impl AsRef<Path>) -> Result<Vec<CatalogFile>> {
    Scanner::new(root)?.scan()
}

fn compile_globset(globs: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in globs {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| LintError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| LintError::InvalidGlob {
        pattern: globs.join(", "),
        message: e.to_string(),
    })
}
