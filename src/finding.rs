//! Findings
//!
//! A finding is one reportable validation outcome. Validators stamp every
//! finding with a canonical rule id at creation; the rule engine may then
//! re-label its severity or drop it, but never rewrites its text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parser::{ParseFailure, ParsedFile};

/// Canonical rule ids
pub mod rule {
    pub const REQUIRED_FIELDS: &str = "schema/required-fields";
    pub const VALID_SEMVER: &str = "schema/valid-semver";
    pub const VALID_EMAIL: &str = "schema/valid-email";
    pub const OWNER_EXISTS: &str = "refs/owner-exists";
    pub const VALID_VERSION_RANGE: &str = "refs/valid-version-range";
    pub const RESOURCE_EXISTS: &str = "refs/resource-exists";
    pub const CHANNEL_EXISTS: &str = "refs/channel-exists";
    pub const CONTAINER_EXISTS: &str = "refs/container-exists";
    pub const ORPHAN_MESSAGES: &str = "refs/orphan-messages";
    pub const SUMMARY_REQUIRED: &str = "best-practices/summary-required";
    pub const OWNER_REQUIRED: &str = "best-practices/owner-required";
    pub const DESCRIPTION_REQUIRED: &str = "best-practices/description-required";
    pub const SCHEMA_REQUIRED: &str = "best-practices/schema-required";
    pub const SERVICE_ID_FORMAT: &str = "naming/service-id-format";
    pub const EVENT_ID_FORMAT: &str = "naming/event-id-format";
    pub const CONSISTENT_VERSION_FORMAT: &str = "versions/consistent-format";
    pub const NO_DEPRECATED: &str = "versions/no-deprecated";
    pub const NO_DEPRECATED_REFERENCES: &str = "versions/no-deprecated-references";
    pub const DUPLICATE_RESOURCE_IDS: &str = "structure/duplicate-resource-ids";
}

/// Which stage produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Schema,
    Reference,
    Parse,
}

/// Reported severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single validation outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// `type/id` of the resource the finding is about
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    /// Catalog-relative path of the offending file
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Finding {
    pub fn new(
        kind: FindingKind,
        resource: impl Into<String>,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            resource: resource.into(),
            field: None,
            message: message.into(),
            file: file.into(),
            line: None,
            severity: Severity::Error,
            rule: None,
        }
    }

    /// Finding about a parsed file
    pub fn for_file(kind: FindingKind, parsed: &ParsedFile, message: impl Into<String>) -> Self {
        Self::new(kind, parsed.resource_label(), parsed.file.relative_path.clone(), message)
    }

    /// Parse failures are always errors and carry no rule
    pub fn from_parse_failure(failure: &ParseFailure) -> Self {
        let mut finding = Self::new(
            FindingKind::Parse,
            format!("{}/{}", failure.file.resource_type, failure.file.resource_id),
            failure.file.relative_path.clone(),
            format!("Parse error: {}", failure.error),
        );
        finding.line = failure.error.line();
        finding
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_rule(mut self, rule: &str) -> Self {
        self.rule = Some(rule.to_string());
        self
    }

    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Rule this finding is governed by.
    ///
    /// Findings built without an explicit rule are classified from their kind,
    /// field and message text. Parse findings have no rule.
    pub fn canonical_rule(&self) -> Option<&str> {
        if let Some(rule) = &self.rule {
            return Some(rule.as_str());
        }

        let rule = match self.kind {
            FindingKind::Parse => return None,
            FindingKind::Schema => match self.field.as_deref() {
                Some("summary") => rule::SUMMARY_REQUIRED,
                Some("owners") => rule::OWNER_REQUIRED,
                _ if self.message.contains("email") => rule::VALID_EMAIL,
                _ if self.message.contains("version") || self.message.contains("semantic") => {
                    rule::VALID_SEMVER
                }
                _ => rule::REQUIRED_FIELDS,
            },
            FindingKind::Reference => {
                if self.message.contains("user") || self.message.contains("team") {
                    rule::OWNER_EXISTS
                } else if self.message.contains("version") {
                    rule::VALID_VERSION_RANGE
                } else {
                    rule::RESOURCE_EXISTS
                }
            }
        };
        Some(rule)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{}:1", line)?;
        }
        write!(f, " {} {}", self.severity, self.message)?;
        if let Some(field) = &self.field {
            write!(f, " [{}]", field)?;
        }
        if let Some(rule) = &self.rule {
            write!(f, " ({})", rule)?;
        }
        Ok(())
    }
}
