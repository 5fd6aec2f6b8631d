//! Deprecated reference detection

use std::collections::{BTreeMap, BTreeSet};

use crate::finding::{rule, Finding, FindingKind, Severity};
use crate::parser::ParsedFile;
use crate::references::extract_references;
use crate::resource::ResourceType;
use crate::schema::Deprecation;
use crate::version::LATEST;

/// Marker for "every version is deprecated"
const ALL_VERSIONS: &str = "*";

/// Deprecated resources keyed by `(type, id)`, holding the deprecated
/// versions or `*` when the deprecated file declares no version
#[derive(Debug, Clone, Default)]
pub struct DeprecatedIndex {
    entries: BTreeMap<(ResourceType, String), BTreeSet<String>>,
}

impl DeprecatedIndex {
    pub fn build(files: &[ParsedFile]) -> Self {
        let mut entries: BTreeMap<(ResourceType, String), BTreeSet<String>> = BTreeMap::new();
        for file in files {
            let active = Deprecation::from_header(&file.header).is_some_and(|d| d.is_active());
            if !active {
                continue;
            }
            let version = file.declared_version().unwrap_or(ALL_VERSIONS);
            entries
                .entry((file.resource_type(), file.canonical_id().to_string()))
                .or_default()
                .insert(version.to_string());
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Is `id` deprecated as `resource_type` at the requested version?
    ///
    /// A request without a version, or for `latest`, hits any deprecated
    /// version of the id.
    pub fn is_deprecated(&self, resource_type: ResourceType, id: &str, version: Option<&str>) -> bool {
        let Some(versions) = self.entries.get(&(resource_type, id.to_string())) else {
            return false;
        };
        if versions.contains(ALL_VERSIONS) {
            return true;
        }
        match version {
            None | Some(LATEST) => !versions.is_empty(),
            Some(v) => versions.contains(v),
        }
    }
}

/// Warnings for references to deprecated resources.
///
/// Owner and member links are exempt. A reference is reported at most once,
/// under the first candidate type found deprecated.
pub fn find_deprecated_references(files: &[ParsedFile]) -> Vec<Finding> {
    let index = DeprecatedIndex::build(files);
    if index.is_empty() {
        return Vec::new();
    }

    let mut findings = Vec::new();
    for parsed in files {
        for reference in extract_references(parsed) {
            if reference.is_membership() {
                continue;
            }
            let hit = reference.candidate_types.iter().find(|rt| {
                index.is_deprecated(**rt, &reference.target_id, reference.version.as_deref())
            });
            let Some(resource_type) = hit else { continue };

            let message = format!(
                "Referenced {} \"{}\"{} is deprecated",
                resource_type,
                reference.target_id,
                reference.version_suffix()
            );
            findings.push(
                Finding::for_file(FindingKind::Reference, parsed, message)
                    .with_field(reference.field.clone())
                    .with_rule(rule::NO_DEPRECATED_REFERENCES)
                    .with_severity(Severity::Warning),
            );
        }
    }

    tracing::debug!("Found {} deprecated reference(s)", findings.len());
    findings
}
