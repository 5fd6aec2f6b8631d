//! Event Catalog Linter
//!
//! Validation engine for event catalogs: markdown files with YAML
//! frontmatter describing domains, services, messages, channels, flows,
//! entities, data stores, users and teams.
//!
//! ## Features
//!
//! - **Typed Contracts**: every resource type has its own frontmatter contract
//! - **Versioned References**: exact, `x`-pattern and `^`/`~` range resolution
//! - **Graph Analyses**: orphan messages, deprecated references, duplicate ids
//! - **Configurable Rules**: per-rule severity, ignore globs, path overrides
//!
//! ## Catalog layout
//!
//! ```text
//! catalog/
//! ├── domains/Orders/
//! │   ├── index.mdx
//! │   ├── services/OrderService/index.mdx
//! │   └── versioned/0.9.0/index.mdx
//! ├── events/OrderPlaced/index.mdx
//! ├── channels/orders.{env}.events/index.mdx
//! ├── users/jdoe.mdx
//! ├── teams/order-team.mdx
//! ├── .cataloglintrc.toml
//! └── catalog.config.toml
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod finding;
pub mod graph;
pub mod index;
pub mod lint;
pub mod parser;
pub mod references;
pub mod resource;
pub mod rules;
pub mod scanner;
pub mod schema;
pub mod version;

pub use config::{DependencyManifest, LintConfig, RuleSetting, RuleSeverity};
pub use engine::{lint_catalog, LintReport, Linter};
pub use error::{LintError, Result};
pub use finding::{Finding, FindingKind, Severity};
pub use index::ResourceIndex;
pub use parser::{ParseFailure, ParsedFile};
pub use resource::ResourceType;
pub use rules::{PathPattern, RuleEngine};
pub use scanner::{scan_catalog, CatalogFile, Scanner};
pub use schema::SchemaValidator;
