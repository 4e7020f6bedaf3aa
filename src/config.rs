//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.auditqa.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name.
pub const CONFIG_FILE: &str = ".auditqa.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Artifact loading settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Quality gate settings.
    #[serde(default)]
    pub gate: GateConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default report format ("markdown" or "json").
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: default_format(),
        }
    }
}

fn default_output() -> String {
    "qa_report.md".to_string()
}

fn default_format() -> String {
    "markdown".to_string()
}

/// Artifact loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory holding one sub-directory per audit run.
    #[serde(default = "default_audit_root")]
    pub audit_root: PathBuf,

    /// Schema version artifacts must declare.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Abort on the first invalid artifact instead of skipping it.
    #[serde(default)]
    pub strict: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            audit_root: default_audit_root(),
            schema_version: default_schema_version(),
            strict: false,
        }
    }
}

fn default_audit_root() -> PathBuf {
    PathBuf::from("backlog/audit-outputs")
}

fn default_schema_version() -> String {
    crate::models::SCHEMA_VERSION.to_string()
}

/// Quality gate settings for CI use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Fail when the overall score is below this value.
    #[serde(default)]
    pub fail_under: Option<f64>,

    /// Fail when any critical issue was reported.
    #[serde(default)]
    pub fail_on_critical: bool,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the collated issue list.
    #[serde(default = "default_true")]
    pub include_issues: bool,

    /// Maximum issues listed in the Markdown report.
    #[serde(default)]
    pub max_issues: Option<usize>,

    /// Include the recommendation list.
    #[serde(default = "default_true")]
    pub include_recommendations: bool,

    /// Maximum recommendations listed.
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_issues: true,
            max_issues: None,
            include_recommendations: true,
            max_recommendations: default_max_recommendations(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_recommendations() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if let Some(threshold) = self.gate.fail_under {
            if !(0.0..=10.0).contains(&threshold) {
                bail!("gate.fail_under must be between 0 and 10, got {}", threshold);
            }
        }
        if !matches!(self.general.format.as_str(), "markdown" | "json") {
            bail!(
                "general.format must be \"markdown\" or \"json\", got \"{}\"",
                self.general.format
            );
        }
        if self.loader.schema_version.trim().is_empty() {
            bail!("loader.schema_version must not be empty");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format.as_str().to_string();
        }
        if let Some(ref root) = args.audit_root {
            self.loader.audit_root = root.clone();
        }
        if let Some(ref version) = args.schema_version {
            self.loader.schema_version = version.clone();
        }
        if let Some(threshold) = args.fail_under {
            self.gate.fail_under = Some(threshold);
        }
        if let Some(max) = args.max_issues {
            self.report.max_issues = Some(max);
        }

        // Flags always override
        if args.strict {
            self.loader.strict = true;
        }
        if args.fail_on_critical {
            self.gate.fail_on_critical = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
