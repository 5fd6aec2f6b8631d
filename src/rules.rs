//! Rule Engine
//!
//! Turns a [`LintConfig`] into per-file decisions: whether a file is linted
//! at all, which rule table applies to it, and what severity each finding
//! ends up with.
//!
//! Path patterns are globs matched against the whole catalog-relative path:
//! `**` crosses `/`, `*` and `?` stay within one segment, `{a,b}` is an
//! alternation. A pattern without any `/` matches the file name at any
//! depth, so `*.tmp` catches `services/temp.tmp`.

use std::borrow::Cow;

use globset::{GlobBuilder, GlobMatcher};

use crate::config::{LintConfig, RuleMap, RuleSeverity};
use crate::error::{LintError, Result};
use crate::finding::{Finding, FindingKind, Severity};

/// A compiled path glob
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    matcher: GlobMatcher,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let effective = if pattern.contains('/') {
            pattern.to_string()
        } else {
            format!("**/{}", pattern)
        };
        let glob = GlobBuilder::new(&effective)
            .literal_separator(true)
            .build()
            .map_err(|e| LintError::InvalidGlob {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            source: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path.replace('\\', "/"))
    }
}

fn compile_all(patterns: &[String]) -> Vec<PathPattern> {
    patterns
        .iter()
        .filter_map(|p| match PathPattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!("Skipping invalid path pattern: {}", e);
                None
            }
        })
        .collect()
}

struct CompiledOverride {
    files: Vec<PathPattern>,
    rules: RuleMap,
}

/// Per-file rule resolution and severity application
pub struct RuleEngine {
    rules: RuleMap,
    ignore: Vec<PathPattern>,
    overrides: Vec<CompiledOverride>,
}

impl RuleEngine {
    /// Build from an already merged configuration; invalid globs are skipped
    pub fn new(config: &LintConfig) -> Self {
        let overrides = config
            .overrides
            .iter()
            .map(|block| CompiledOverride {
                files: compile_all(&block.files),
                rules: block.rules.clone(),
            })
            .collect();

        Self {
            rules: config.rules.clone(),
            ignore: compile_all(&config.ignore_patterns),
            overrides,
        }
    }

    /// Is the file excluded from linting?
    pub fn should_ignore(&self, relative_path: &str) -> bool {
        self.ignore.iter().any(|p| p.matches(relative_path))
    }

    /// Base rules with every matching override merged on top, in order
    pub fn effective_rules(&self, relative_path: &str) -> Cow<'_, RuleMap> {
        let mut effective = Cow::Borrowed(&self.rules);
        for block in &self.overrides {
            if block.files.iter().any(|p| p.matches(relative_path)) {
                effective
                    .to_mut()
                    .extend(block.rules.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        effective
    }

    /// Re-label or drop findings according to the rules in effect for their file.
    ///
    /// Parse findings and findings whose rule is not in the table pass through
    /// unchanged. Text is never rewritten.
    pub fn apply(&self, findings: Vec<Finding>) -> Vec<Finding> {
        let mut out = Vec::with_capacity(findings.len());
        for mut finding in findings {
            if finding.kind == FindingKind::Parse {
                out.push(finding);
                continue;
            }
            let Some(rule) = finding.canonical_rule() else {
                out.push(finding);
                continue;
            };

            let rules = self.effective_rules(&finding.file);
            match rules.get(rule).map(|setting| setting.severity()) {
                Some(RuleSeverity::Off) => continue,
                Some(RuleSeverity::Warn) => finding.severity = Severity::Warning,
                Some(RuleSeverity::Error) => finding.severity = Severity::Error,
                None => {} // unconfigured rules keep their stamped severity
            }
            out.push(finding);
        }
        out
    }
}
