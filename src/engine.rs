//! Lint Engine
//!
//! Runs a full pass over a catalog root:
//!
//! ```text
//! scan -> parse (parallel) -> index
//!      -> schema -> best practices -> references -> graph analyses
//!      -> ignore filter -> rule engine -> findings sorted by file
//! ```
//!
//! Only a missing or unlistable root aborts a run. Unreadable files become
//! parse findings and bad configuration falls back to defaults.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{DependencyManifest, LintConfig};
use crate::error::Result;
use crate::finding::{Finding, Severity};
use crate::graph;
use crate::index::ResourceIndex;
use crate::lint::BestPracticeLinter;
use crate::parser::parse_files;
use crate::references::validate_references;
use crate::rules::RuleEngine;
use crate::scanner::Scanner;
use crate::schema::SchemaValidator;

/// Result of one lint run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintReport {
    /// Findings ordered by file path
    pub findings: Vec<Finding>,
    /// Catalog files considered after ignore patterns
    pub files_checked: usize,
    pub files_with_findings: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub parse_failures: usize,
    pub checked_at: DateTime<Utc>,
}

impl LintReport {
    fn new(findings: Vec<Finding>, files_checked: usize, parse_failures: usize) -> Self {
        let files_with_findings = findings
            .iter()
            .map(|f| f.file.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let error_count = findings.iter().filter(|f| f.severity == Severity::Error).count();
        let warning_count = findings.len() - error_count;

        Self {
            findings,
            files_checked,
            files_with_findings,
            error_count,
            warning_count,
            parse_failures,
            checked_at: Utc::now(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Lint runner for one catalog root
pub struct Linter {
    root: PathBuf,
    config_file: Option<PathBuf>,
    config: Option<LintConfig>,
    manifest: Option<DependencyManifest>,
    linter: BestPracticeLinter,
}

impl Linter {
    /// Linter for `root`; configuration is discovered in the root at run time
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config_file: None,
            config: None,
            manifest: None,
            linter: BestPracticeLinter::new(),
        }
    }

    /// Read rules from this file instead of the catalog's own rule file
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use an already merged configuration and skip discovery
    pub fn with_config(mut self, config: LintConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use this manifest instead of the catalog configuration file
    pub fn with_manifest(mut self, manifest: DependencyManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_best_practices(mut self, linter: BestPracticeLinter) -> Self {
        self.linter = linter;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration this run will use
    pub fn resolved_config(&self) -> LintConfig {
        match &self.config {
            Some(config) => config.clone(),
            None => LintConfig::load(&self.root, self.config_file.as_deref()),
        }
    }

    /// Lint the catalog
    pub fn run(&self) -> Result<LintReport> {
        let config = self.resolved_config();
        let manifest = match &self.manifest {
            Some(manifest) => manifest.clone(),
            None => DependencyManifest::load(&self.root),
        };
        let engine = RuleEngine::new(&config);

        // 1. Discover files. Ignored files are still parsed and indexed so
        //    references into them resolve; only their own findings are dropped.
        let files = Scanner::new(&self.root)?.scan()?;
        let total = files.len();
        let files_checked = files
            .iter()
            .filter(|f| !engine.should_ignore(&f.relative_path))
            .count();
        tracing::debug!("Ignoring {} of {} file(s)", total - files_checked, total);

        // 2. Parse
        let outcome = parse_files(files);
        let parsed = outcome.parsed;
        let parse_failures = outcome
            .failures
            .iter()
            .filter(|f| !engine.should_ignore(&f.file.relative_path))
            .count();

        // 3. Validate
        let index = ResourceIndex::build(&parsed, &manifest);
        tracing::debug!("Indexed {} resource identities", index.len());

        let mut findings = SchemaValidator::new().validate_all(&parsed);
        findings.extend(self.linter.lint_all(&parsed));
        findings.extend(validate_references(&parsed, &index));
        findings.extend(graph::analyze(&parsed, &manifest));
        findings.extend(outcome.failures.iter().map(Finding::from_parse_failure));
        findings.retain(|f| !engine.should_ignore(&f.file));

        // 4. Apply rule severities
        let before = findings.len();
        let mut findings = engine.apply(findings);
        tracing::debug!("Rule engine kept {} of {} finding(s)", findings.len(), before);

        findings.sort_by(|a, b| a.file.cmp(&b.file));

        let report = LintReport::new(findings, files_checked, parse_failures);
        tracing::info!(
            "Checked {} file(s): {} error(s), {} warning(s)",
            report.files_checked,
            report.error_count,
            report.warning_count
        );
        Ok(report)
    }
}

/// Lint a catalog root with discovered configuration
pub fn lint_catalog(root: impl AsRef<Path>) -> Result<LintReport> {
    Linter::new(root).run()
}
