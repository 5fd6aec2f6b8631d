//! Duplicate identity detection

use std::collections::HashMap;

use crate::finding::{rule, Finding, FindingKind};
use crate::parser::ParsedFile;
use crate::resource::ResourceType;

/// Files claiming an identity already claimed earlier in `files`.
///
/// Identity is `(type, canonical id, version or latest)`; the first file in
/// input order is the original and every later one is reported against it.
pub fn find_duplicate_ids(files: &[ParsedFile]) -> Vec<Finding> {
    let mut seen: HashMap<(ResourceType, &str, &str), &str> = HashMap::new();
    let mut findings = Vec::new();

    for file in files {
        let key = (file.resource_type(), file.canonical_id(), file.version_or_latest());
        match seen.get(&key) {
            Some(original) => {
                let message = format!(
                    "Duplicate {} \"{}\" (version: {}) - also defined in {}",
                    key.0, key.1, key.2, original
                );
                findings.push(
                    Finding::for_file(FindingKind::Reference, file, message)
                        .with_field("id")
                        .with_rule(rule::DUPLICATE_RESOURCE_IDS),
                );
            }
            None => {
                seen.insert(key, &file.file.relative_path);
            }
        }
    }

    tracing::debug!("Found {} duplicate identities", findings.len());
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::CatalogFile;
    use serde_json::{json, Value};
    use std::path::Path;

    fn parsed(rel: &str, rt: ResourceType, header: Value) -> ParsedFile {
        ParsedFile::from_header(CatalogFile::new(Path::new("/catalog"), rel, rt), header, "")
    }

    #[test]
    fn test_header_override_duplicate() {
        let files = vec![
            parsed(
                "services/order-service/index.mdx",
                ResourceType::Service,
                json!({ "version": "1.0.0" }),
            ),
            parsed(
                "domains/Orders/services/Orders/index.mdx",
                ResourceType::Service,
                json!({ "id": "order-service", "version": "1.0.0" }),
            ),
        ];
        let findings = find_duplicate_ids(&files);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Duplicate service \"order-service\" (version: 1.0.0) - also defined in services/order-service/index.mdx"
        );
        assert_eq!(findings[0].file, "domains/Orders/services/Orders/index.mdx");
    }

    #[test]
    fn test_original_follows_input_order() {
        let a = parsed("events/A/index.mdx", ResourceType::Event, json!({ "id": "E" }));
        let b = parsed("events/B/index.mdx", ResourceType::Event, json!({ "id": "E" }));

        let forward = find_duplicate_ids(&[a.clone(), b.clone()]);
        let reverse = find_duplicate_ids(&[b, a]);
        assert_eq!(forward.len(), 1);
        assert_eq!(reverse.len(), 1);
        assert_eq!(forward[0].file, "events/B/index.mdx");
        assert_eq!(reverse[0].file, "events/A/index.mdx");
        assert!(forward[0].message.contains("(version: latest)"));
    }

    #[test]
    fn test_distinct_versions_and_types_are_not_duplicates() {
        let files = vec![
            parsed("events/E/index.mdx", ResourceType::Event, json!({ "id": "E", "version": "1.0.0" })),
            parsed("events/E/versioned/0.9.0/index.mdx", ResourceType::Event, json!({ "id": "E", "version": "0.9.0" })),
            parsed("commands/E/index.mdx", ResourceType::Command, json!({ "id": "E", "version": "1.0.0" })),
        ];
        assert!(find_duplicate_ids(&files).is_empty());
    }
}
