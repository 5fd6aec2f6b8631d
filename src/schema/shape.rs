//! Field shapes and the structural checker that walks a header against them

use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

use crate::version::VersionFormat;

/// Expected shape of a header value
#[derive(Debug, Clone)]
pub enum Shape {
    String,
    Number,
    Bool,
    /// String holding `local@domain.tld`
    Email,
    /// String in the catalog version vocabulary
    Version,
    /// String parseable as an absolute URL
    Url,
    /// String restricted to a fixed set of values
    Enum(&'static [&'static str]),
    Array(Box<Shape>),
    Object(Vec<Field>),
    /// Object with arbitrary keys, every value of the same shape
    Record(Box<Shape>),
    /// First alternative whose JSON kind matches the value is checked
    OneOf(Vec<Shape>),
    Any,
}

/// A named key of an object shape
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, shape: Shape) -> Self {
        Self { name, shape, required: true }
    }

    pub fn optional(name: &'static str, shape: Shape) -> Self {
        Self { name, shape, required: false }
    }
}

/// Shorthand constructors used by the contract tables
impl Shape {
    pub fn array(item: Shape) -> Self {
        Shape::Array(Box::new(item))
    }

    pub fn record(value: Shape) -> Self {
        Shape::Record(Box::new(value))
    }

    pub fn one_of(options: impl IntoIterator<Item = Shape>) -> Self {
        Shape::OneOf(options.into_iter().collect())
    }

    pub fn object(fields: impl IntoIterator<Item = Field>) -> Self {
        Shape::Object(fields.into_iter().collect())
    }

    /// Name used in `Expected <x>` messages
    pub fn expected_name(&self) -> String {
        match self {
            Shape::String | Shape::Email | Shape::Version | Shape::Url | Shape::Enum(_) => {
                "string".to_string()
            }
            Shape::Number => "number".to_string(),
            Shape::Bool => "boolean".to_string(),
            Shape::Array(_) => "array".to_string(),
            Shape::Object(_) | Shape::Record(_) => "object".to_string(),
            Shape::OneOf(options) => options
                .iter()
                .map(Shape::expected_name)
                .collect::<Vec<_>>()
                .join(" | "),
            Shape::Any => "any".to_string(),
        }
    }

    /// Whether the value's JSON kind is the one this shape expects
    fn accepts_kind(&self, value: &Value) -> bool {
        match self {
            Shape::String | Shape::Email | Shape::Version | Shape::Url | Shape::Enum(_) => {
                value.is_string()
            }
            Shape::Number => value.is_number(),
            Shape::Bool => value.is_boolean(),
            Shape::Array(_) => value.is_array(),
            Shape::Object(_) | Shape::Record(_) => value.is_object(),
            Shape::OneOf(options) => options.iter().any(|o| o.accepts_kind(value)),
            Shape::Any => true,
        }
    }
}

/// One step into a header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Why a value does not fit its shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationCode {
    Required { key: String },
    InvalidType { expected: String, received: &'static str },
    InvalidEmail,
    InvalidVersion { value: String },
    InvalidEnum { value: String, options: &'static [&'static str] },
    InvalidUrl,
}

/// A single structural violation at a location in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: Vec<PathSegment>,
    pub code: ViolationCode,
}

impl Violation {
    /// Dotted path of the offending key, `None` at the header root
    pub fn field(&self) -> Option<String> {
        if self.path.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .path
            .iter()
            .map(|seg| match seg {
                PathSegment::Key(k) => k.clone(),
                PathSegment::Index(i) => i.to_string(),
            })
            .collect();
        Some(parts.join("."))
    }

    /// Top-level header key the violation sits under
    pub fn top_level_key(&self) -> Option<&str> {
        match self.path.first() {
            Some(PathSegment::Key(k)) => Some(k.as_str()),
            _ => None,
        }
    }

    /// Innermost key name, skipping array indices
    pub fn leaf_key(&self) -> Option<&str> {
        self.path.iter().rev().find_map(|seg| match seg {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    pub fn message(&self) -> String {
        match &self.code {
            ViolationCode::Required { key } => format!("Required field \"{}\" is missing", key),
            ViolationCode::InvalidType { expected, received } => {
                format!("Expected {}, received {}", expected, received)
            }
            ViolationCode::InvalidEmail => "Invalid email address".to_string(),
            ViolationCode::InvalidVersion { value } => {
                format!("Invalid semantic version format: \"{}\"", value)
            }
            ViolationCode::InvalidEnum { value, options } => {
                format!("Invalid value \"{}\", expected one of: {}", value, options.join(" | "))
            }
            ViolationCode::InvalidUrl => "Invalid url".to_string(),
        }
    }
}

/// JSON kind name used in `received <x>` messages
pub fn received_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compiled string formats shared by every check
#[derive(Debug, Clone)]
pub struct Formats {
    versions: VersionFormat,
    /// `local@domain.tld`, no whitespace
    email: Regex,
}

impl Default for Formats {
    fn default() -> Self {
        Self::new()
    }
}

impl Formats {
    pub fn new() -> Self {
        Self {
            versions: VersionFormat::new(),
            email: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap(),
        }
    }

    pub fn is_email(&self, s: &str) -> bool {
        self.email.is_match(s)
    }

    pub fn is_version(&self, s: &str) -> bool {
        self.versions.is_valid(s)
    }
}

/// Walks values against shapes, accumulating every violation
#[derive(Debug)]
pub struct Checker<'a> {
    formats: &'a Formats,
    path: Vec<PathSegment>,
    violations: Vec<Violation>,
}

impl<'a> Checker<'a> {
    pub fn new(formats: &'a Formats) -> Self {
        Self {
            formats,
            path: Vec::new(),
            violations: Vec::new(),
        }
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    fn push(&mut self, code: ViolationCode) {
        self.violations.push(Violation {
            path: self.path.clone(),
            code,
        });
    }

    fn mismatch(&mut self, shape: &Shape, value: &Value) {
        self.push(ViolationCode::InvalidType {
            expected: shape.expected_name(),
            received: received_name(value),
        });
    }

    /// Check the fields of an object; unknown keys are accepted
    pub fn check_fields(&mut self, fields: &[Field], map: &Map<String, Value>) {
        for field in fields {
            match map.get(field.name) {
                None if field.required => {
                    self.path.push(PathSegment::Key(field.name.to_string()));
                    self.push(ViolationCode::Required {
                        key: field.name.to_string(),
                    });
                    self.path.pop();
                }
                None => {}
                Some(value) => {
                    self.path.push(PathSegment::Key(field.name.to_string()));
                    self.check(&field.shape, value);
                    self.path.pop();
                }
            }
        }
    }

    pub fn check(&mut self, shape: &Shape, value: &Value) {
        match shape {
            Shape::Any => {}
            Shape::OneOf(options) => match options.iter().find(|o| o.accepts_kind(value)) {
                Some(option) => self.check(option, value),
                None => self.mismatch(shape, value),
            },
            _ if !shape.accepts_kind(value) => match (shape, value) {
                (Shape::Enum(options), other) => self.push(ViolationCode::InvalidEnum {
                    value: other.to_string(),
                    options: *options,
                }),
                _ => self.mismatch(shape, value),
            },
            Shape::String | Shape::Number | Shape::Bool => {}
            Shape::Email => {
                if !value.as_str().is_some_and(|s| self.formats.is_email(s)) {
                    self.push(ViolationCode::InvalidEmail);
                }
            }
            Shape::Version => {
                let raw = value.as_str().unwrap_or_default();
                if !self.formats.is_version(raw) {
                    self.push(ViolationCode::InvalidVersion { value: raw.to_string() });
                }
            }
            Shape::Url => {
                if !value.as_str().is_some_and(|s| Url::parse(s).is_ok()) {
                    self.push(ViolationCode::InvalidUrl);
                }
            }
            Shape::Enum(options) => {
                let raw = value.as_str().unwrap_or_default();
                if !options.contains(&raw) {
                    self.push(ViolationCode::InvalidEnum {
                        value: raw.to_string(),
                        options: *options,
                    });
                }
            }
            Shape::Array(item) => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                for (idx, element) in items.iter().enumerate() {
                    self.path.push(PathSegment::Index(idx));
                    self.check(item, element);
                    self.path.pop();
                }
            }
            Shape::Object(fields) => {
                if let Some(map) = value.as_object() {
                    self.check_fields(fields, map);
                }
            }
            Shape::Record(inner) => {
                if let Some(map) = value.as_object() {
                    for (key, element) in map {
                        self.path.push(PathSegment::Key(key.clone()));
                        self.check(inner, element);
                        self.path.pop();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violations(shape: &Shape, value: Value) -> Vec<Violation> {
        let formats = Formats::new();
        let mut checker = Checker::new(&formats);
        checker.check(shape, &value);
        checker.into_violations()
    }

    #[test]
    fn test_type_mismatch_message() {
        let found = violations(&Shape::String, json!(42));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message(), "Expected string, received number");
        assert_eq!(found[0].field(), None);
    }

    #[test]
    fn test_nested_paths() {
        let shape = Shape::object([Field::required(
            "steps",
            Shape::array(Shape::object([Field::required("title", Shape::String)])),
        )]);
        let found = violations(&shape, json!({ "steps": [{ "title": "ok" }, {}] }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].field().as_deref(), Some("steps.1.title"));
        assert_eq!(found[0].top_level_key(), Some("steps"));
        assert_eq!(found[0].leaf_key(), Some("title"));
        assert_eq!(found[0].message(), "Required field \"title\" is missing");
    }

    #[test]
    fn test_union_picks_matching_branch() {
        let owner = Shape::one_of([
            Shape::String,
            Shape::object([
                Field::required("id", Shape::String),
                Field::required("collection", Shape::Enum(&["users", "teams"])),
            ]),
        ]);
        assert!(violations(&owner, json!("jdoe")).is_empty());
        assert!(violations(&owner, json!({ "id": "jdoe", "collection": "users" })).is_empty());

        let found = violations(&owner, json!({ "id": "jdoe", "collection": "robots" }));
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].message(),
            "Invalid value \"robots\", expected one of: users | teams"
        );

        let found = violations(&owner, json!(3));
        assert_eq!(found[0].message(), "Expected string | object, received number");
    }

    #[test]
    fn test_collects_every_violation() {
        let shape = Shape::object([
            Field::required("id", Shape::String),
            Field::required("name", Shape::String),
            Field::optional("email", Shape::Email),
        ]);
        let found = violations(&shape, json!({ "email": "nope" }));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_emails() {
        let formats = Formats::new();
        assert!(formats.is_email("john.doe@example.com"));
        assert!(!formats.is_email(""));
        assert!(!formats.is_email("invalid-email-format"));
        assert!(!formats.is_email("a b@example.com"));
        assert!(!formats.is_email("a@localhost"));
        assert!(!formats.is_email("a@@example.com"));
    }

    #[test]
    fn test_version_shape() {
        assert!(violations(&Shape::Version, json!("1.x")).is_empty());
        let found = violations(&Shape::Version, json!("v1.0.0"));
        assert_eq!(found.len(), 1);
        assert!(matches!(found[0].code, ViolationCode::InvalidVersion { .. }));
    }

    #[test]
    fn test_record_and_url() {
        let shape = Shape::record(Shape::Url);
        let found = violations(&shape, json!({ "docs": "https://example.com", "bad": "not a url" }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].field().as_deref(), Some("bad"));
        assert_eq!(found[0].message(), "Invalid url");
    }
}
