//! Orphan message detection

use std::collections::HashSet;

use serde_json::Value;

use crate::config::DependencyManifest;
use crate::finding::{rule, Finding, FindingKind, Severity};
use crate::parser::ParsedFile;
use crate::references::pointer_target;
use crate::resource::ResourceType;

fn non_empty_list(value: Option<&Value>) -> bool {
    value.and_then(Value::as_array).is_some_and(|list| !list.is_empty())
}

/// Messages whose id is neither produced nor consumed anywhere.
///
/// A message counts as produced when a service or domain `sends` it or its
/// own `producers` list is non-empty, and symmetrically for consumed.
/// Messages from the dependency manifest are treated as fully connected.
pub fn find_orphan_messages(files: &[ParsedFile], manifest: &DependencyManifest) -> Vec<Finding> {
    let messages: Vec<&ParsedFile> = files
        .iter()
        .filter(|f| f.resource_type().is_message())
        .collect();
    if messages.is_empty() {
        return Vec::new();
    }

    let mut produced: HashSet<&str> = HashSet::new();
    let mut consumed: HashSet<&str> = HashSet::new();

    for file in files {
        let header = &file.header;
        match file.resource_type() {
            ResourceType::Service | ResourceType::Domain => {
                let pointers = |key: &str| {
                    header
                        .get(key)
                        .and_then(Value::as_array)
                        .into_iter()
                        .flatten()
                        .filter_map(pointer_target)
                        .map(|(id, _)| id)
                };
                produced.extend(pointers("sends"));
                consumed.extend(pointers("receives"));
            }
            rt if rt.is_message() => {
                if non_empty_list(header.get("producers")) {
                    produced.insert(file.canonical_id());
                }
                if non_empty_list(header.get("consumers")) {
                    consumed.insert(file.canonical_id());
                }
            }
            _ => {}
        }
    }

    for rt in ResourceType::MESSAGES {
        for entry in manifest.entries_of(rt) {
            produced.insert(&entry.id);
            consumed.insert(&entry.id);
        }
    }

    let findings: Vec<Finding> = messages
        .into_iter()
        .filter(|m| !produced.contains(m.canonical_id()) && !consumed.contains(m.canonical_id()))
        .map(|m| {
            let message = format!(
                "{} \"{}\" has no producer and no consumer",
                m.resource_type(),
                m.canonical_id()
            );
            Finding::for_file(FindingKind::Reference, m, message)
                .with_field("id")
                .with_rule(rule::ORPHAN_MESSAGES)
                .with_severity(Severity::Warning)
        })
        .collect();

    tracing::debug!("Found {} orphan message(s)", findings.len());
    findings
}
