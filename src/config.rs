//! Configuration for the catalog linter
//!
//! Two inputs are read from the catalog root:
//!
//! - Rule configuration, from the first existing of `.cataloglintrc.toml`,
//!   `.cataloglintrc.json` or `.cataloglintrc.yaml` (or an explicit path),
//!   layered over a user-global `lint.toml` and under `CATALOG_LINT__*`
//!   environment variables.
//! - The dependency manifest, from the `dependencies` table of
//!   `catalog.config.{toml,json,yaml}`.
//!
//! ## Example rule file (.cataloglintrc.toml):
//! ```toml
//! ignore_patterns = ["drafts/**"]
//!
//! [rules]
//! "refs/orphan-messages" = "off"
//! "best-practices/summary-required" = "warn"
//!
//! [[overrides]]
//! files = ["domains/Legacy/**"]
//! rules = { "best-practices/owner-required" = "off" }
//! ```
//!
//! Neither input is allowed to abort a run: a malformed source is logged and
//! replaced by defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::finding::rule;
use crate::resource::ResourceType;

/// Rule configuration file names, in lookup order
pub const RULE_FILES: &[&str] = &[
    ".cataloglintrc.toml",
    ".cataloglintrc.json",
    ".cataloglintrc.yaml",
];

/// Catalog configuration file names holding the dependency manifest
pub const CATALOG_CONFIG_FILES: &[&str] = &[
    "catalog.config.toml",
    "catalog.config.json",
    "catalog.config.yaml",
];

/// Paths never linted
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["dependencies/**"];

/// Built-in severity for every known rule
pub const DEFAULT_RULES: &[(&str, RuleSeverity)] = &[
    (rule::REQUIRED_FIELDS, RuleSeverity::Error),
    (rule::VALID_SEMVER, RuleSeverity::Error),
    (rule::VALID_EMAIL, RuleSeverity::Error),
    (rule::OWNER_EXISTS, RuleSeverity::Error),
    (rule::VALID_VERSION_RANGE, RuleSeverity::Error),
    (rule::RESOURCE_EXISTS, RuleSeverity::Error),
    (rule::CHANNEL_EXISTS, RuleSeverity::Error),
    (rule::CONTAINER_EXISTS, RuleSeverity::Error),
    (rule::ORPHAN_MESSAGES, RuleSeverity::Warn),
    (rule::SUMMARY_REQUIRED, RuleSeverity::Error),
    (rule::OWNER_REQUIRED, RuleSeverity::Error),
    (rule::DESCRIPTION_REQUIRED, RuleSeverity::Warn),
    (rule::SCHEMA_REQUIRED, RuleSeverity::Warn),
    (rule::SERVICE_ID_FORMAT, RuleSeverity::Error),
    (rule::EVENT_ID_FORMAT, RuleSeverity::Error),
    (rule::CONSISTENT_VERSION_FORMAT, RuleSeverity::Error),
    (rule::NO_DEPRECATED, RuleSeverity::Error),
    (rule::NO_DEPRECATED_REFERENCES, RuleSeverity::Warn),
    (rule::DUPLICATE_RESOURCE_IDS, RuleSeverity::Error),
];

// ============================================================================
// Rule configuration
// ============================================================================

/// Configured severity of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Error,
    Warn,
    Off,
}

/// A rule entry: a bare severity or `[severity, options]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    Severity(RuleSeverity),
    WithOptions(RuleSeverity, Value),
}

impl RuleSetting {
    pub fn severity(&self) -> RuleSeverity {
        match self {
            Self::Severity(severity) | Self::WithOptions(severity, _) => *severity,
        }
    }

    pub fn options(&self) -> Option<&Value> {
        match self {
            Self::Severity(_) => None,
            Self::WithOptions(_, options) => Some(options),
        }
    }
}

impl From<RuleSeverity> for RuleSetting {
    fn from(severity: RuleSeverity) -> Self {
        Self::Severity(severity)
    }
}

/// Rule table keyed by rule id
pub type RuleMap = BTreeMap<String, RuleSetting>;

/// Rules applied only to files matching `files`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideBlock {
    pub files: Vec<String>,
    #[serde(default)]
    pub rules: RuleMap,
}

/// Rule configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintConfig {
    /// Rule id -> severity
    #[serde(default)]
    pub rules: RuleMap,

    /// Globs of catalog-relative paths to skip
    #[serde(default, alias = "ignorePatterns", alias = "ignorepatterns")]
    pub ignore_patterns: Vec<String>,

    /// Path-scoped rule tables, applied in order
    #[serde(default)]
    pub overrides: Vec<OverrideBlock>,
}

/// The built-in rule table
pub fn default_rules() -> RuleMap {
    DEFAULT_RULES
        .iter()
        .map(|(id, severity)| (id.to_string(), RuleSetting::from(*severity)))
        .collect()
}

fn default_ignore_patterns() -> Vec<String> {
    DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl LintConfig {
    /// Built-in rules and ignore list with no user settings
    pub fn defaults() -> Self {
        Self {
            rules: default_rules(),
            ignore_patterns: default_ignore_patterns(),
            overrides: Vec::new(),
        }
    }

    /// Merge user settings over the built-in defaults.
    ///
    /// User rules win per key; user ignore patterns are appended to the
    /// default list; overrides are taken as given.
    pub fn with_defaults(self) -> Self {
        let mut rules = default_rules();
        rules.extend(self.rules);

        let mut ignore_patterns = default_ignore_patterns();
        for pattern in self.ignore_patterns {
            if !ignore_patterns.contains(&pattern) {
                ignore_patterns.push(pattern);
            }
        }

        Self {
            rules,
            ignore_patterns,
            overrides: self.overrides,
        }
    }

    /// First rule file present in `root`
    pub fn find_rule_file(root: &Path) -> Option<PathBuf> {
        RULE_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// User-global rule file location
    pub fn global_rule_file() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "eventcatalog", "catalog-lint")
            .map(|dirs| dirs.config_dir().join("lint.toml"))
    }

    /// Load user settings without applying defaults.
    ///
    /// `explicit` replaces the rule file lookup in `root` and must exist.
    pub fn load_from(root: &Path, explicit: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(global) = Self::global_rule_file() {
            if global.is_file() {
                builder = builder.add_source(File::from(global).required(false));
            }
        }

        match explicit {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(path) = Self::find_rule_file(root) {
                    tracing::debug!("Using rule configuration {}", path.display());
                    builder = builder.add_source(File::from(path).required(false));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CATALOG_LINT")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load settings for a catalog and merge them over the defaults.
    ///
    /// Never fails: a malformed source is logged and the defaults are used.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Self {
        match Self::load_from(root, explicit) {
            Ok(user) => user.with_defaults(),
            Err(e) => {
                tracing::warn!("Ignoring invalid lint configuration: {}", e);
                Self::defaults()
            }
        }
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = self
            .to_toml()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

// ============================================================================
// Dependency manifest
// ============================================================================

/// A resource declared to exist outside the scanned catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// External resources grouped by type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyManifest {
    entries: BTreeMap<ResourceType, Vec<DependencyEntry>>,
}

impl DependencyManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a `{ events: [{id, version?}], ... }` table.
    ///
    /// Unknown keys and entries without a string id are dropped.
    pub fn from_value(value: &Value) -> Self {
        let mut manifest = Self::new();
        let Some(table) = value.as_object() else {
            return manifest;
        };

        for (key, list) in table {
            let Some(resource_type) = ResourceType::from_manifest_key(key) else {
                tracing::trace!("Ignoring unknown dependency group '{}'", key);
                continue;
            };
            let Some(list) = list.as_array() else { continue };
            for entry in list {
                let Some(id) = entry.get("id").and_then(Value::as_str) else {
                    continue;
                };
                let version = entry.get("version").and_then(Value::as_str).map(String::from);
                manifest.add(resource_type, id, version);
            }
        }
        manifest
    }

    pub fn add(&mut self, resource_type: ResourceType, id: impl Into<String>, version: Option<String>) {
        self.entries.entry(resource_type).or_default().push(DependencyEntry {
            id: id.into(),
            version,
        });
    }

    /// Every entry with its type
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, &DependencyEntry)> {
        self.entries
            .iter()
            .flat_map(|(rt, list)| list.iter().map(move |entry| (*rt, entry)))
    }

    /// Entries of one type
    pub fn entries_of(&self, resource_type: ResourceType) -> &[DependencyEntry] {
        self.entries
            .get(&resource_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the manifest from a catalog configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?;
        match config.get::<Value>("dependencies") {
            Ok(value) => Ok(Self::from_value(&value)),
            Err(ConfigError::NotFound(_)) => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Manifest for a catalog root; empty when absent or unreadable
    pub fn load(root: &Path) -> Self {
        let Some(path) = CATALOG_CONFIG_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
        else {
            return Self::new();
        };

        match Self::load_from(&path) {
            Ok(manifest) => {
                tracing::debug!("Loaded {} dependency entries from {}", manifest.len(), path.display());
                manifest
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid dependency manifest {}: {}", path.display(), e);
                Self::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = LintConfig::defaults();
        assert_eq!(config.rules.len(), DEFAULT_RULES.len());
        assert_eq!(
            config.rules.get(rule::ORPHAN_MESSAGES).map(RuleSetting::severity),
            Some(RuleSeverity::Warn)
        );
        assert_eq!(config.ignore_patterns, vec!["dependencies/**".to_string()]);
    }

    #[test]
    fn test_user_rules_win() {
        let mut user = LintConfig::default();
        user.rules.insert(rule::REQUIRED_FIELDS.to_string(), RuleSeverity::Off.into());
        user.rules.insert("custom/rule".to_string(), RuleSeverity::Warn.into());
        user.ignore_patterns.push("drafts/**".to_string());

        let merged = user.with_defaults();
        assert_eq!(merged.rules[rule::REQUIRED_FIELDS].severity(), RuleSeverity::Off);
        assert_eq!(merged.rules["custom/rule"].severity(), RuleSeverity::Warn);
        assert_eq!(merged.rules.len(), DEFAULT_RULES.len() + 1);
        assert_eq!(merged.ignore_patterns, vec!["dependencies/**", "drafts/**"]);
    }

    #[test]
    fn test_rule_setting_forms() {
        let rules: RuleMap = serde_json::from_value(json!({
            "a": "warn",
            "b": ["error", { "max": 3 }]
        }))
        .unwrap();
        assert_eq!(rules["a"], RuleSetting::Severity(RuleSeverity::Warn));
        assert_eq!(rules["b"].severity(), RuleSeverity::Error);
        assert_eq!(rules["b"].options(), Some(&json!({ "max": 3 })));
    }

    #[test]
    fn test_load_json_rule_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(".cataloglintrc.json"),
            r#"{
                "rules": { "refs/orphan-messages": "off" },
                "ignorePatterns": ["drafts/**"],
                "overrides": [{ "files": ["domains/**"], "rules": { "best-practices/summary-required": "warn" } }]
            }"#,
        )
        .unwrap();

        let config = LintConfig::load(dir.path(), None);
        assert_eq!(config.rules[rule::ORPHAN_MESSAGES].severity(), RuleSeverity::Off);
        assert!(config.ignore_patterns.contains(&"drafts/**".to_string()));
        assert_eq!(config.overrides.len(), 1);
        assert_eq!(config.overrides[0].files, vec!["domains/**"]);
    }

    #[test]
    fn test_malformed_rule_file_falls_back() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".cataloglintrc.json"), "{ not json").unwrap();
        let config = LintConfig::load(dir.path(), None);
        assert_eq!(config, LintConfig::defaults());
    }

    #[test]
    fn test_missing_explicit_file_falls_back() {
        let dir = tempdir().unwrap();
        let config = LintConfig::load(dir.path(), Some(&dir.path().join("nope.toml")));
        assert_eq!(config, LintConfig::defaults());
    }

    #[test]
    fn test_serialize_config() {
        let toml_str = LintConfig::defaults().to_toml().unwrap();
        assert!(toml_str.contains("[rules]"));
        assert!(toml_str.contains("dependencies/**"));
    }

    #[test]
    fn test_manifest_from_value() {
        let manifest = DependencyManifest::from_value(&json!({
            "events": [{ "id": "PaymentProcessed", "version": "1.0.0" }, { "id": 42 }, { "name": "x" }],
            "services": [{ "id": "BillingService" }],
            "widgets": [{ "id": "ignored" }]
        }));
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.entries_of(ResourceType::Event)[0].version.as_deref(), Some("1.0.0"));
        assert_eq!(manifest.entries_of(ResourceType::Service)[0].version, None);
        assert!(manifest.entries_of(ResourceType::Query).is_empty());
    }

    #[test]
    fn test_manifest_load() {
        let dir = tempdir().unwrap();
        assert!(DependencyManifest::load(dir.path()).is_empty());

        fs::write(
            dir.path().join("catalog.config.toml"),
            "[[dependencies.events]]\nid = \"PaymentProcessed\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();
        let manifest = DependencyManifest::load(dir.path());
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries_of(ResourceType::Event)[0].id, "PaymentProcessed");
    }
}
