//! Catalog Graph Analyses
//!
//! Whole-catalog passes over the parsed files that look at how resources
//! relate to each other rather than at any single header:
//!
//! - [`orphans`]: messages nobody produces or consumes
//! - [`deprecated`]: references that point at deprecated resources
//! - [`duplicates`]: more than one file claiming the same identity
//!
//! Every pass is a pure function of the parsed files (and the dependency
//! manifest where relevant) and stamps its findings with its rule id.

pub mod deprecated;
pub mod duplicates;
pub mod orphans;

pub use deprecated::{find_deprecated_references, DeprecatedIndex};
pub use duplicates::find_duplicate_ids;
pub use orphans::find_orphan_messages;

use crate::config::DependencyManifest;
use crate::finding::Finding;
use crate::parser::ParsedFile;

/// Run every graph analysis, in a fixed order
pub fn analyze(files: &[ParsedFile], manifest: &DependencyManifest) -> Vec<Finding> {
    let mut findings = find_orphan_messages(files, manifest);
    findings.extend(find_deprecated_references(files));
    findings.extend(find_duplicate_ids(files));
    tracing::debug!("Graph analyses produced {} finding(s)", findings.len());
    findings
}
