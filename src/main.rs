//! auditqa - Audit Artifact Aggregator
//!
//! A CLI tool that reads the JSON artifacts written by analyzer agents,
//! scores every component and reports an overall verdict.
//!
//! Exit codes:
//!   0 - Success (quality gate passed, or no gate set)
//!   1 - Runtime error (config, unreadable directory, strict-mode failure, etc.)
//!   2 - Quality gate failed (--fail-under or --fail-on-critical)
//!   3 - Empty batch: nothing to aggregate, overall score undefined

mod analysis;
mod artifact;
mod cli;
mod config;
mod error;
mod models;
mod report;

use anyhow::{Context, Result};
use artifact::{BatchStatus, LoadOptions};
use cli::{Args, OutputFormat};
use config::Config;
use error::AuditError;
use report::{MarkdownOptions, QaReport};
use std::path::PathBuf;
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const EXIT_GATE_FAILED: i32 = 2;
const EXIT_EMPTY_BATCH: i32 = 3;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("auditqa v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Aggregation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .auditqa.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(args, rust_log.as_deref()))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// `RUST_LOG` directives apply unless `--verbose` or `--quiet` was given.
fn log_filter(args: &Args, rust_log: Option<&str>) -> EnvFilter {
    let from_env = rust_log
        .filter(|_| !args.verbose && !args.quiet)
        .and_then(|directives| EnvFilter::try_new(directives).ok());
    from_env.unwrap_or_else(|| EnvFilter::default().add_directive(LevelFilter::from_level(args.log_level()).into()))
}

/// Run the aggregation workflow. Returns the process exit code.
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let Some(audit_dir) = resolve_target(&args, &config)? else {
        eprintln!(
            "\n⚠️  No audit directories found under {}",
            config.loader.audit_root.display()
        );
        eprintln!("   Overall score is undefined.");
        return Ok(EXIT_EMPTY_BATCH);
    };
    println!("📂 Reading artifacts from {}", audit_dir.display());

    let load = artifact::load_dir(&audit_dir, &LoadOptions::from(&config.loader))?;
    match load.status {
        BatchStatus::DirectoryMissing => {
            eprintln!("\n⚠️  Audit directory not found: {}", audit_dir.display());
            eprintln!("   No artifacts to aggregate; overall score is undefined.");
            return Ok(EXIT_EMPTY_BATCH);
        }
        BatchStatus::NoArtifacts => {
            eprintln!("\n⚠️  No artifacts found in {}", audit_dir.display());
            eprintln!("   Overall score is undefined.");
            return Ok(EXIT_EMPTY_BATCH);
        }
        BatchStatus::Loaded => {}
    }

    for warning in load.warnings() {
        println!("   ⚠️  Excluded {}", warning);
    }

    let report = match report::build_qa_report(&load) {
        Ok(report) => report,
        Err(AuditError::EmptyBatch) => {
            eprintln!(
                "\n⚠️  {} artifact files found but no component could be aggregated.",
                load.entries.len()
            );
            eprintln!("   Overall score is undefined.");
            return Ok(EXIT_EMPTY_BATCH);
        }
        Err(e) => return Err(e.into()),
    };

    write_outputs(&args, &config, &report)?;
    print_summary(&report, start_time.elapsed().as_secs_f64());

    Ok(check_gate(&config, &report))
}

/// Work out which artifact directory to read. `None` when `--latest` finds
/// no audit directory under the root.
fn resolve_target(args: &Args, config: &Config) -> Result<Option<PathBuf>> {
    if let Some(ref dir) = args.dir {
        return Ok(Some(dir.clone()));
    }

    let root = &config.loader.audit_root;
    if let Some(ref id) = args.audit_id {
        return Ok(Some(artifact::resolve_audit_dir(root, id)));
    }

    let Some(latest) = artifact::latest_audit_id(root)? else {
        return Ok(None);
    };
    info!("Latest audit: {}", latest);
    Ok(Some(artifact::resolve_audit_dir(root, &latest)))
}

fn write_outputs(args: &Args, config: &Config, report: &QaReport) -> Result<()> {
    let output_path = PathBuf::from(&config.general.output);
    let output = match OutputFormat::from_config(&config.general.format) {
        OutputFormat::Json => report::generate_json_report(report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(report, &MarkdownOptions::from(&config.report))
        }
    };

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
    info!("Report written to {}", output_path.display());

    if let Some(ref artifact_path) = args.emit_artifact {
        let derived = report::to_artifact(report);
        let json = serde_json::to_string_pretty(&derived)?;
        std::fs::write(artifact_path, json).with_context(|| {
            format!("Failed to write artifact to {}", artifact_path.display())
        })?;
        info!("Aggregate artifact written to {}", artifact_path.display());
    }

    Ok(())
}

fn print_summary(report: &QaReport, duration: f64) {
    let counts = &report.issues.counts;

    println!("\n📊 Audit QA Summary:");
    println!(
        "   Artifacts: {} loaded, {} excluded",
        report.metadata.files_loaded, report.metadata.files_failed
    );
    println!("   Components: {}", report.components.len());
    let unscored = report.unscored();
    if unscored > 0 {
        println!("   Unscored components: {}", unscored);
    }
    match report.overall {
        Some(o) => println!("   Overall: {:.2}/10 {} {}", o.score, o.verdict.emoji(), o.verdict),
        None => println!("   Overall: undefined (no component carried a score)"),
    }
    println!(
        "   Issues: 🔴 Critical: {} | 🟡 Warning: {} | 🟢 Suggestion: {}",
        counts.critical, counts.warning, counts.suggestion
    );
    println!("   Duration: {:.2}s", duration);
}

/// Apply the configured quality gate.
fn check_gate(config: &Config, report: &QaReport) -> i32 {
    if let Some(threshold) = config.gate.fail_under {
        match report.overall {
            Some(o) if o.score < threshold => {
                eprintln!(
                    "\n⛔ Overall score {:.2} is below {:.2}. Failing (exit code 2).",
                    o.score, threshold
                );
                return EXIT_GATE_FAILED;
            }
            None => {
                eprintln!("\n⛔ Overall score is undefined; cannot pass --fail-under. Failing (exit code 2).");
                return EXIT_GATE_FAILED;
            }
            _ => {}
        }
    }

    if config.gate.fail_on_critical && report.critical_issues() > 0 {
        eprintln!(
            "\n⛔ {} critical issues reported. Failing (exit code 2).",
            report.critical_issues()
        );
        return EXIT_GATE_FAILED;
    }

    0
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
