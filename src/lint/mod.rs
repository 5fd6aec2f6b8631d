//! Best-Practice Linting
//!
//! Checks that go beyond structural validity and describe what a useful
//! catalog entry looks like. Users and teams are exempt.
//!
//! ## Lints
//! 1. **Summary**: every resource carries a non-blank `summary`
//! 2. **Ownership**: every resource lists at least one owner
//! 3. **Description**: the markdown body is not blank
//! 4. **Message schema**: events, commands and queries point at a `schemaPath`
//!
//! A `summary` or `owners` value of the wrong type is left to the schema
//! validator, which reports it under the same rule.

use serde_json::Value;

use crate::finding::{rule, Finding, FindingKind, Severity};
use crate::parser::ParsedFile;

/// The best-practice linter
pub struct BestPracticeLinter {
    /// Require `schemaPath` on message types
    require_message_schema: bool,
}

impl Default for BestPracticeLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl BestPracticeLinter {
    pub fn new() -> Self {
        Self {
            require_message_schema: true,
        }
    }

    /// Disable the `schemaPath` requirement for messages
    pub fn without_message_schema(mut self) -> Self {
        self.require_message_schema = false;
        self
    }

    /// Lint a single file
    pub fn lint(&self, parsed: &ParsedFile) -> Vec<Finding> {
        let mut findings = Vec::new();
        let rt = parsed.resource_type();
        if rt.is_directory_less() {
            return findings;
        }

        let header = &parsed.header;

        // 1. Summary
        let summary_missing = match header.get("summary") {
            None => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if summary_missing {
            findings.push(
                Finding::for_file(FindingKind::Schema, parsed, format!("{} is missing a summary", rt))
                    .with_field("summary")
                    .with_rule(rule::SUMMARY_REQUIRED)
                    .with_line(parsed.line_of("summary")),
            );
        }

        // 2. Ownership
        let owners_missing = match header.get("owners") {
            None => true,
            Some(Value::Array(list)) => list.is_empty(),
            Some(_) => false,
        };
        if owners_missing {
            findings.push(
                Finding::for_file(
                    FindingKind::Schema,
                    parsed,
                    format!("{} must have at least one owner", rt),
                )
                .with_field("owners")
                .with_rule(rule::OWNER_REQUIRED)
                .with_line(parsed.line_of("owners")),
            );
        }

        // 3. Description body
        if parsed.body.trim().is_empty() {
            findings.push(
                Finding::for_file(
                    FindingKind::Schema,
                    parsed,
                    format!("{} has no description in its markdown body", rt),
                )
                .with_field("description")
                .with_rule(rule::DESCRIPTION_REQUIRED)
                .with_severity(Severity::Warning),
            );
        }

        // 4. Message schema
        if self.require_message_schema
            && rt.is_message()
            && !header.get("schemaPath").is_some_and(Value::is_string)
        {
            findings.push(
                Finding::for_file(
                    FindingKind::Schema,
                    parsed,
                    format!("{} should define a schemaPath", rt),
                )
                .with_field("schemaPath")
                .with_rule(rule::SCHEMA_REQUIRED)
                .with_severity(Severity::Warning),
            );
        }

        findings
    }

    /// Lint every file
    pub fn lint_all(&self, files: &[ParsedFile]) -> Vec<Finding> {
        let findings: Vec<Finding> = files.iter().flat_map(|f| self.lint(f)).collect();
        tracing::debug!("Best-practice checks produced {} finding(s)", findings.len());
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;
    use crate::scanner::CatalogFile;
    use serde_json::json;
    use std::path::Path;

    fn parsed(rt: ResourceType, header: Value, body: &str) -> ParsedFile {
        let rel = match rt {
            ResourceType::User | ResourceType::Team => format!("{}/x.mdx", rt.dir_name()),
            _ => format!("{}/x/index.mdx", rt.dir_name()),
        };
        ParsedFile::from_header(CatalogFile::new(Path::new("/catalog"), &rel, rt), header, body)
    }

    fn rules(findings: &[Finding]) -> Vec<&str> {
        findings.iter().filter_map(|f| f.rule.as_deref()).collect()
    }

    #[test]
    fn test_complete_service_is_clean() {
        let linter = BestPracticeLinter::new();
        let findings = linter.lint(&parsed(
            ResourceType::Service,
            json!({ "id": "order-service", "summary": "A service", "owners": ["team-a"] }),
            "\n## Overview\n\nThis service handles orders.",
        ));
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_blank_body_requires_description() {
        let linter = BestPracticeLinter::new();
        for body in ["", "   \n  \n  "] {
            let findings = linter.lint(&parsed(
                ResourceType::Service,
                json!({ "summary": "A service", "owners": ["team-a"] }),
                body,
            ));
            assert_eq!(rules(&findings), vec![rule::DESCRIPTION_REQUIRED]);
            assert_eq!(findings[0].field.as_deref(), Some("description"));
        }
    }

    #[test]
    fn test_messages_require_schema_path() {
        let linter = BestPracticeLinter::new();
        for rt in ResourceType::MESSAGES {
            let findings = linter.lint(&parsed(
                rt,
                json!({ "summary": "A message", "owners": ["team-a"] }),
                "Some content",
            ));
            assert_eq!(rules(&findings), vec![rule::SCHEMA_REQUIRED]);
            assert!(findings[0].message.contains("schemaPath"));
        }

        let findings = linter.lint(&parsed(
            ResourceType::Event,
            json!({ "summary": "An event", "owners": ["team-a"], "schemaPath": "schema.json" }),
            "Some content",
        ));
        assert!(findings.is_empty());

        let relaxed = BestPracticeLinter::new().without_message_schema();
        let findings = relaxed.lint(&parsed(
            ResourceType::Event,
            json!({ "summary": "An event", "owners": ["team-a"] }),
            "Some content",
        ));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_summary_and_owners() {
        let linter = BestPracticeLinter::new();
        let findings = linter.lint(&parsed(
            ResourceType::Domain,
            json!({ "summary": "  ", "owners": [] }),
            "Body",
        ));
        assert_eq!(rules(&findings), vec![rule::SUMMARY_REQUIRED, rule::OWNER_REQUIRED]);

        // Wrong types belong to the schema validator
        let findings = linter.lint(&parsed(
            ResourceType::Domain,
            json!({ "summary": 7, "owners": "team-a" }),
            "Body",
        ));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_users_and_teams_are_exempt() {
        let linter = BestPracticeLinter::new();
        assert!(linter.lint(&parsed(ResourceType::User, json!({ "id": "jdoe" }), "")).is_empty());
        assert!(linter.lint(&parsed(ResourceType::Team, json!({ "id": "core" }), "")).is_empty());
    }
}
