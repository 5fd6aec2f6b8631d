//! Catalog Lint CLI
//!
//! Lints an event catalog and prints findings grouped by file.
//!
//! Exit status: 0 when no errors remain, 1 when error findings remain,
//! 2 when the run itself failed.

use std::path::PathBuf;

use anyhow::Context;
use catalog_lint::{LintReport, Linter, Severity};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catalog-lint")]
#[command(about = "Validate an event catalog's frontmatter and references")]
struct Cli {
    /// Path to the catalog root
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Rule configuration file (defaults to .cataloglintrc.* in the root)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print the effective rule configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => std::process::exit(1),
        Ok(false) => {}
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Returns whether error findings remain
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut linter = Linter::new(&cli.root);
    if let Some(config) = &cli.config {
        linter = linter.with_config_file(config);
    }

    if cli.print_config {
        let config = linter.resolved_config();
        print!("{}", config.to_toml().context("Failed to render configuration")?);
        return Ok(false);
    }

    let report = linter
        .run()
        .with_context(|| format!("Failed to lint {}", cli.root.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, cli.quiet);
    }

    Ok(report.has_errors())
}

fn print_report(report: &LintReport, quiet: bool) {
    let mut current_file: Option<&str> = None;
    for finding in &report.findings {
        if quiet && finding.severity != Severity::Error {
            continue;
        }
        if current_file != Some(finding.file.as_str()) {
            if current_file.is_some() {
                println!();
            }
            println!("{}", finding.file);
            current_file = Some(finding.file.as_str());
        }

        let icon = match finding.severity {
            Severity::Error => "❌",
            Severity::Warning => "⚠️ ",
        };
        let location = finding.line.map(|l| format!("{}:1", l)).unwrap_or_default();
        print!("  {} {:>6} {}", icon, location, finding.message);
        if let Some(rule) = &finding.rule {
            print!("  ({})", rule);
        }
        println!();
    }

    if !report.findings.is_empty() {
        println!();
    }
    println!(
        "{} file(s) checked, {} error(s), {} warning(s)",
        report.files_checked, report.error_count, report.warning_count
    );
    if report.parse_failures > 0 {
        println!("{} file(s) could not be parsed", report.parse_failures);
    }
    if report.is_clean() {
        println!("✅ No problems found");
    }
}
