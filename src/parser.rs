//! Frontmatter Parsing
//!
//! Splits each catalog file into a YAML header block fenced by `---` lines and
//! the markdown body that follows. Files are parsed independently and in
//! parallel; a failure is captured per file and never aborts the run.

use std::fs;

use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::error::LintError;
use crate::resource::ResourceType;
use crate::scanner::CatalogFile;

const FENCE: &str = "---";

/// A catalog file with its header and body separated
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub file: CatalogFile,
    /// Header key/values
    pub header: Map<String, Value>,
    /// Everything after the closing fence
    pub body: String,
    /// Original file content
    pub raw: String,
}

impl ParsedFile {
    /// Build a parsed file directly from a header value (mainly for tests and
    /// callers that already hold decoded frontmatter)
    pub fn from_header(file: CatalogFile, header: Value, body: impl Into<String>) -> Self {
        let header = match header {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            file,
            header,
            body: body.into(),
            raw: String::new(),
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.file.resource_type
    }

    /// Canonical id: the header `id` when it is a non-empty string, else the
    /// id derived from the path
    pub fn canonical_id(&self) -> &str {
        match self.header.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id,
            _ => &self.file.resource_id,
        }
    }

    /// Declared header version, if it is a non-empty string
    pub fn declared_version(&self) -> Option<&str> {
        self.header
            .get("version")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Declared version with the `latest` default applied
    pub fn version_or_latest(&self) -> &str {
        self.declared_version().unwrap_or("latest")
    }

    /// `type/id` label used in findings
    pub fn resource_label(&self) -> String {
        format!("{}/{}", self.file.resource_type, self.canonical_id())
    }

    /// 1-based line of a top-level header key in the raw file
    pub fn line_of(&self, key: &str) -> Option<usize> {
        let mut lines = self.raw.lines().enumerate();
        match lines.next() {
            Some((_, first)) if first.trim_end().trim_start_matches('\u{feff}') == FENCE => {}
            _ => return None,
        }
        for (idx, line) in lines {
            if line.trim_end() == FENCE {
                break;
            }
            let Some(rest) = line.strip_prefix(key) else { continue };
            if rest.trim_start().starts_with(':') {
                return Some(idx + 1);
            }
        }
        None
    }
}

/// A file that could not be read or whose header could not be decoded
#[derive(Debug)]
pub struct ParseFailure {
    pub file: CatalogFile,
    pub error: LintError,
}

/// Outcome of parsing a batch of files; together the two lists cover every input
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub parsed: Vec<ParsedFile>,
    pub failures: Vec<ParseFailure>,
}

/// Split raw content into `(header_yaml, body)`.
///
/// Content without a leading fence has no header. An opening fence without a
/// closing one is an error.
fn split_frontmatter(raw: &str) -> Result<(Option<&str>, &str), String> {
    let content = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut offset = 0;
    let mut lines = content.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == FENCE => offset += first.len(),
        _ => return Ok((None, content)),
    }

    let header_start = offset;
    for line in lines {
        if line.trim_end() == FENCE {
            let header = &content[header_start..offset];
            let body = &content[offset + line.len()..];
            return Ok((Some(header), body));
        }
        offset += line.len();
    }

    Err("unterminated frontmatter block (missing closing '---')".to_string())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse already-loaded content for a catalog file
pub fn parse_content(file: CatalogFile, raw: String) -> Result<ParsedFile, ParseFailure> {
    let (header_yaml, body) = match split_frontmatter(&raw) {
        Ok(parts) => parts,
        Err(message) => {
            let error = LintError::Frontmatter {
                path: file.path.clone(),
                message,
                line: Some(1),
            };
            return Err(ParseFailure { file, error });
        }
    };
    let body = body.to_string();

    let header = match header_yaml {
        None => Map::new(),
        Some(yaml) if yaml.trim().is_empty() => Map::new(),
        Some(yaml) => match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                let error = LintError::InvalidHeader {
                    path: file.path.clone(),
                    found: value_kind(&other),
                };
                return Err(ParseFailure { file, error });
            }
            Err(source) => {
                // +1 for the opening fence
                let line = source.location().map(|loc| loc.line() + 1);
                let error = LintError::Yaml {
                    path: file.path.clone(),
                    line,
                    source,
                };
                return Err(ParseFailure { file, error });
            }
        },
    };

    Ok(ParsedFile { file, header, body, raw })
}

/// Read and parse a single catalog file
pub fn parse_file(file: CatalogFile) -> Result<ParsedFile, ParseFailure> {
    tracing::trace!("Parsing {}", file.relative_path);
    match fs::read_to_string(&file.path) {
        Ok(raw) => parse_content(file, raw),
        Err(source) => {
            let error = LintError::Io {
                path: file.path.clone(),
                source,
            };
            Err(ParseFailure { file, error })
        }
    }
}

/// Parse files in parallel, preserving input order within each partition
pub fn parse_files(files: Vec<CatalogFile>) -> ParseOutcome {
    let results: Vec<_> = files.into_par_iter().map(parse_file).collect();

    let mut outcome = ParseOutcome::default();
    for result in results {
        match result {
            Ok(parsed) => outcome.parsed.push(parsed),
            Err(failure) => outcome.failures.push(failure),
        }
    }

    tracing::debug!(
        "Parsed {} file(s), {} failure(s)",
        outcome.parsed.len(),
        outcome.failures.len()
    );
    outcome
}
