//! Schema Validation
//!
//! Validates a parsed header against the field contract for its resource
//! type. Every violation becomes its own finding; validation never stops at
//! the first problem.
//!
//! ## Rule assignment
//!
//! Each violation is stamped with a rule at creation, in priority order:
//!
//! 1. field `summary` -> `best-practices/summary-required`
//! 2. field `owners` -> `best-practices/owner-required`
//! 3. email format -> `schema/valid-email`
//! 4. version format, or any violation on a `version` key -> `schema/valid-semver`
//! 5. anything else -> `schema/required-fields`

pub mod contracts;
pub mod shape;

use std::collections::BTreeMap;

pub use contracts::{Contract, Deprecation, ResourceSchema};
pub use shape::{Field, Formats, Shape, Violation, ViolationCode};

use crate::finding::{rule, Finding, FindingKind};
use crate::parser::ParsedFile;
use crate::resource::ResourceType;
use shape::Checker;

/// Rule a schema violation is governed by
pub fn rule_for_violation(violation: &Violation) -> &'static str {
    match violation.field().as_deref() {
        Some("summary") => return rule::SUMMARY_REQUIRED,
        Some("owners") => return rule::OWNER_REQUIRED,
        _ => {}
    }
    match violation.code {
        ViolationCode::InvalidEmail => rule::VALID_EMAIL,
        ViolationCode::InvalidVersion { .. } => rule::VALID_SEMVER,
        _ if violation.leaf_key() == Some("version") => rule::VALID_SEMVER,
        _ => rule::REQUIRED_FIELDS,
    }
}

/// Validates headers against per-type contracts
pub struct SchemaValidator {
    schemas: BTreeMap<ResourceType, ResourceSchema>,
    formats: Formats,
}

impl SchemaValidator {
    pub fn new() -> Self {
        let schemas = ResourceType::ALL
            .iter()
            .map(|rt| (*rt, ResourceSchema::for_type(*rt)))
            .collect();
        Self {
            schemas,
            formats: Formats::new(),
        }
    }

    /// Structural violations for a file, in contract order
    pub fn violations(&self, parsed: &ParsedFile) -> Vec<Violation> {
        let Some(schema) = self.schemas.get(&parsed.resource_type()) else {
            return Vec::new();
        };
        let mut checker = Checker::new(&self.formats);
        checker.check_fields(&schema.contract().fields, &parsed.header);
        checker.into_violations()
    }

    /// Validate one file, one finding per violation
    pub fn validate(&self, parsed: &ParsedFile) -> Vec<Finding> {
        let findings: Vec<Finding> = self
            .violations(parsed)
            .into_iter()
            .map(|violation| {
                let mut finding = Finding::for_file(FindingKind::Schema, parsed, violation.message())
                    .with_rule(rule_for_violation(&violation))
                    .with_line(violation.top_level_key().and_then(|k| parsed.line_of(k)));
                finding.field = violation.field();
                finding
            })
            .collect();

        if !findings.is_empty() {
            tracing::trace!(
                "{} schema violation(s) in {}",
                findings.len(),
                parsed.file.relative_path
            );
        }
        findings
    }

    /// Validate a batch of files
    pub fn validate_all(&self, files: &[ParsedFile]) -> Vec<Finding> {
        let findings: Vec<Finding> = files.iter().flat_map(|f| self.validate(f)).collect();
        tracing::debug!("Schema validation produced {} finding(s)", findings.len());
        findings
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_content;
    use crate::scanner::CatalogFile;
    use serde_json::{json, Value};
    use std::path::Path;

    fn parsed(rt: ResourceType, header: Value) -> ParsedFile {
        let rel = match rt {
            ResourceType::User | ResourceType::Team => format!("{}/sample.mdx", rt.dir_name()),
            _ => format!("{}/sample/index.mdx", rt.dir_name()),
        };
        ParsedFile::from_header(CatalogFile::new(Path::new("/catalog"), &rel, rt), header, "body")
    }

    fn validate(rt: ResourceType, header: Value) -> Vec<Finding> {
        SchemaValidator::new().validate(&parsed(rt, header))
    }

    #[test]
    fn test_valid_domain() {
        let findings = validate(
            ResourceType::Domain,
            json!({ "id": "orders", "name": "Orders", "version": "1.0.0", "summary": "Orders domain" }),
        );
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_missing_required_fields() {
        let findings = validate(ResourceType::Domain, json!({ "id": "orders" }));
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.kind == FindingKind::Schema));
        assert_eq!(findings[0].message, "Required field \"name\" is missing");
        assert_eq!(findings[0].rule.as_deref(), Some(rule::REQUIRED_FIELDS));
        assert_eq!(findings[1].field.as_deref(), Some("version"));
        assert_eq!(findings[1].rule.as_deref(), Some(rule::VALID_SEMVER));
    }

    #[test]
    fn test_invalid_version_format() {
        let findings = validate(
            ResourceType::Domain,
            json!({ "id": "orders", "name": "Orders", "version": "invalid-version" }),
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("semantic version"));
        assert_eq!(findings[0].rule.as_deref(), Some(rule::VALID_SEMVER));
    }

    #[test]
    fn test_service_with_deprecation_notice() {
        let findings = validate(
            ResourceType::Service,
            json!({
                "id": "user-service",
                "name": "User Service",
                "version": "2.1.0",
                "receives": [{ "id": "create-user", "version": "1.0.0" }],
                "deprecated": { "message": "Use new-user-service instead", "date": "2025-01-01" }
            }),
        );
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_event_with_draft_notice() {
        let findings = validate(
            ResourceType::Event,
            json!({
                "id": "user-created",
                "name": "User Created",
                "version": "1.0.0",
                "draft": { "title": "WIP", "message": "This event is still being designed" }
            }),
        );
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_flow_steps() {
        let header = json!({
            "id": "user-registration",
            "name": "User Registration Flow",
            "version": "1.0.0",
            "steps": [
                { "id": "step1", "title": "User submits form", "actor": { "name": "User" }, "next_step": "step2" },
                { "id": "step2", "title": "Service creates user", "service": { "id": "user-service", "version": "1.0.0" } }
            ]
        });
        assert!(validate(ResourceType::Flow, header).is_empty());

        let findings = validate(
            ResourceType::Flow,
            json!({ "id": "f", "name": "F", "version": "1.0.0", "steps": [{ "id": 1 }] }),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].field.as_deref(), Some("steps.0.title"));

        let findings = validate(ResourceType::Flow, json!({ "id": "f", "name": "F", "version": "1.0.0" }));
        assert_eq!(findings[0].message, "Required field \"steps\" is missing");
    }

    #[test]
    fn test_entity_properties() {
        let findings = validate(
            ResourceType::Entity,
            json!({
                "id": "user",
                "name": "User",
                "version": "1.0.0",
                "aggregateRoot": true,
                "identifier": "userId",
                "properties": [
                    { "name": "userId", "type": "string", "required": true, "description": "Unique identifier" },
                    { "name": "orders", "type": "Order[]", "references": "order", "relationType": "one-to-many" }
                ]
            }),
        );
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_users_and_teams() {
        assert!(validate(ResourceType::User, json!({ "id": "jane-doe", "name": "Jane Doe" })).is_empty());
        assert!(validate(
            ResourceType::Team,
            json!({ "id": "platform", "name": "Platform", "members": ["john-doe", "jane-doe"] })
        )
        .is_empty());

        for rt in [ResourceType::User, ResourceType::Team] {
            for email in ["invalid-email-format", ""] {
                let findings = validate(rt, json!({ "id": "x", "name": "X", "email": email }));
                assert_eq!(findings.len(), 1);
                assert_eq!(findings[0].field.as_deref(), Some("email"));
                assert!(findings[0].message.contains("Invalid email"));
                assert_eq!(findings[0].rule.as_deref(), Some(rule::VALID_EMAIL));
            }
        }
    }

    #[test]
    fn test_data_store_container_type() {
        let ok = validate(
            ResourceType::DataStore,
            json!({
                "id": "user-data-store",
                "name": "User Data Store",
                "version": "1.0.0",
                "container_type": "database",
                "technology": "PostgreSQL",
                "authoritative": true,
                "access_mode": "readWrite",
                "classification": "public",
                "residency": "US",
                "retention": "1 year"
            }),
        );
        assert!(ok.is_empty(), "{:?}", ok);

        let findings = validate(
            ResourceType::DataStore,
            json!({ "id": "s", "name": "S", "version": "1.0.0", "container_type": "invalid-container-type" }),
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Invalid value \"invalid-container-type\""));
    }

    #[test]
    fn test_type_mismatch_and_summary_rule() {
        let findings = validate(
            ResourceType::Event,
            json!({ "id": "e", "name": 5, "version": "1.0.0", "summary": 7, "owners": "dboyne" }),
        );
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].message, "Expected string, received number");
        assert_eq!(findings[0].rule.as_deref(), Some(rule::REQUIRED_FIELDS));
        assert_eq!(findings[1].rule.as_deref(), Some(rule::SUMMARY_REQUIRED));
        assert_eq!(findings[2].rule.as_deref(), Some(rule::OWNER_REQUIRED));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let findings = validate(
            ResourceType::Query,
            json!({ "id": "q", "name": "Q", "version": "0.0.1", "somethingCustom": { "a": 1 } }),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_findings_carry_lines() {
        let raw = "---\nid: e\nname: E\nversion: nope\n---\nBody\n".to_string();
        let file = CatalogFile::new(Path::new("/catalog"), "events/e/index.mdx", ResourceType::Event);
        let parsed = parse_content(file, raw).unwrap();
        let findings = SchemaValidator::new().validate(&parsed);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(4));
        assert_eq!(findings[0].resource, "event/e");
        assert_eq!(findings[0].file, "events/e/index.mdx");
    }
}
