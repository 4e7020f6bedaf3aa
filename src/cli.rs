//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// auditqa - aggregate analyzer audit artifacts into a QA verdict
///
/// Reads every analyzer artifact of one audit run, validates it, combines
/// the per-dimension scores into weighted composites and reports an overall
/// score, a verdict and the collated issues.
///
/// Examples:
///   auditqa --audit-id audit-20250115-103000
///   auditqa --latest --format json --output qa.json
///   auditqa --dir backlog/audit-outputs/audit-1 --fail-under 7 --fail-on-critical
///   auditqa --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Artifact directory to aggregate
    #[arg(short, long, value_name = "DIR", conflicts_with_all = ["audit_id", "latest"])]
    pub dir: Option<PathBuf>,

    /// Audit id; artifacts are read from <audit-root>/<audit-id>
    #[arg(short, long, value_name = "ID", conflicts_with = "latest")]
    pub audit_id: Option<String>,

    /// Aggregate the most recently modified audit under the audit root
    #[arg(long)]
    pub latest: bool,

    /// Root directory holding one directory per audit run
    #[arg(long, value_name = "DIR", env = "AUDITQA_ROOT")]
    pub audit_root: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Also write the aggregate as a schema-conformant artifact
    #[arg(long, value_name = "FILE")]
    pub emit_artifact: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .auditqa.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Schema version artifacts must declare
    #[arg(long, value_name = "VERSION")]
    pub schema_version: Option<String>,

    /// Abort on the first invalid artifact instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Fail (exit code 2) if the overall score is below this value
    #[arg(long, value_name = "SCORE")]
    pub fail_under: Option<f64>,

    /// Fail (exit code 2) if any critical issue was reported
    #[arg(long)]
    pub fail_on_critical: bool,

    /// Maximum number of issues listed in the Markdown report
    #[arg(long, value_name = "COUNT")]
    pub max_issues: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .auditqa.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }

    /// Parse a config file value, falling back to Markdown.
    pub fn from_config(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Markdown,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.dir.is_none() && self.audit_id.is_none() && !self.latest {
            return Err("One of --dir, --audit-id or --latest is required".to_string());
        }

        if let Some(ref id) = self.audit_id {
            if id.trim().is_empty() || id.contains(['/', '\\']) {
                return Err(format!("Invalid audit id: '{}'", id));
            }
        }

        if let Some(threshold) = self.fail_under {
            if !(0.0..=10.0).contains(&threshold) {
                return Err("--fail-under must be between 0 and 10".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
