//! Markdown and JSON report generation.
//!
//! This module renders a [`QaReport`] for humans (Markdown) or machines
//! (JSON).

use super::qa::{QaMetadata, QaReport};
use crate::analysis::{
    AnalyzerStats, AttributedRecommendation, CollatedIssues, DimensionAverage, ScoredComponent,
    SystemScore,
};
use crate::models::Severity;
use anyhow::Result;

/// Rendering options for the Markdown report.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    pub include_issues: bool,
    /// Maximum issues listed; `None` lists all.
    pub max_issues: Option<usize>,
    pub include_recommendations: bool,
    pub max_recommendations: usize,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            include_issues: true,
            max_issues: None,
            include_recommendations: true,
            max_recommendations: 10,
        }
    }
}

impl From<&crate::config::ReportConfig> for MarkdownOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            include_issues: config.include_issues,
            max_issues: config.max_issues,
            include_recommendations: config.include_recommendations,
            max_recommendations: config.max_recommendations,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &QaReport, options: &MarkdownOptions) -> String {
    let mut output = String::new();

    output.push_str("# Audit QA Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_verdict_section(report.overall.as_ref()));
    output.push_str(&generate_components_section(&report.components));
    output.push_str(&generate_dimensions_section(&report.dimensions));
    output.push_str(&generate_analyzers_section(&report.analyzers));

    if options.include_issues {
        output.push_str(&generate_issues_section(&report.issues, options.max_issues));
    }
    if options.include_recommendations {
        output.push_str(&generate_recommendations_section(
            &report.recommendations,
            options.max_recommendations,
        ));
    }
    output.push_str(&generate_warnings_section(&report.metadata.warnings));

    output.push_str("---\n\n");
    output.push_str("*Report generated by auditqa*\n");

    output
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.2}", s),
        None => "n/a".to_string(),
    }
}

fn generate_metadata_section(metadata: &QaMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Audit:** `{}`\n", metadata.audit_id));
    section.push_str(&format!("- **Directory:** {}\n", metadata.audit_dir));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Artifacts Loaded:** {}\n",
        metadata.files_loaded
    ));
    if metadata.files_failed > 0 {
        section.push_str(&format!(
            "- **Artifacts Excluded:** {}\n",
            metadata.files_failed
        ));
    }
    if !metadata.analyzers.is_empty() {
        section.push_str(&format!(
            "- **Analyzers:** {}\n",
            metadata.analyzers.join(", ")
        ));
    }
    section.push('\n');

    section
}

fn generate_verdict_section(overall: Option<&SystemScore>) -> String {
    let mut section = String::new();

    section.push_str("## Verdict\n\n");
    match overall {
        Some(o) => {
            section.push_str(&format!(
                "{} **{}** with an overall score of **{:.2}/10** across {} scored components.\n\n",
                o.verdict.emoji(),
                o.verdict,
                o.score,
                o.components
            ));
        }
        None => {
            section.push_str(
                "Overall score is **undefined**: no component carried any dimension score.\n\n",
            );
        }
    }

    section
}

fn generate_components_section(components: &[ScoredComponent]) -> String {
    let mut section = String::new();

    section.push_str("## Components\n\n");
    section.push_str("| Component | Analyzer | Composite | Verdict | Dimensions | Issues |\n");
    section.push_str("|:---|:---|:---:|:---:|:---:|:---:|\n");

    for c in components {
        let verdict = c
            .verdict
            .map(|v| v.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        section.push_str(&format!(
            "| `{}` | {} | {} | {} | {} | {} |\n",
            c.file_path,
            c.analyzer,
            format_score(c.composite),
            verdict,
            c.dimensions_scored,
            c.issue_count
        ));
    }
    section.push('\n');

    section
}

fn generate_dimensions_section(dimensions: &[DimensionAverage]) -> String {
    if dimensions.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("### Dimension Averages\n\n");
    section.push_str("| Dimension | Weight | Average | Components |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    for d in dimensions {
        section.push_str(&format!(
            "| {} | {:.2} | {:.2} | {} |\n",
            d.dimension,
            d.dimension.weight(),
            d.average,
            d.components
        ));
    }
    section.push('\n');

    section
}

fn generate_analyzers_section(analyzers: &[AnalyzerStats]) -> String {
    if analyzers.len() < 2 {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("### By Analyzer\n\n");
    section.push_str("| Analyzer | Components | Average Composite |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for a in analyzers {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            a.analyzer,
            a.components,
            format_score(a.average_composite)
        ));
    }
    section.push('\n');

    section
}

fn generate_issues_section(issues: &CollatedIssues, max: Option<usize>) -> String {
    let mut section = String::new();

    section.push_str("## Issues\n\n");
    section.push_str(&format!(
        "| {} Critical | {} Warning | {} Suggestion | **Total** |\n",
        Severity::Critical.emoji(),
        Severity::Warning.emoji(),
        Severity::Suggestion.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        issues.counts.critical,
        issues.counts.warning,
        issues.counts.suggestion,
        issues.counts.total()
    ));

    if issues.issues.is_empty() {
        section.push_str("No issues were reported. 🎉\n\n");
        return section;
    }

    let limit = max.unwrap_or(issues.issues.len());
    for issue in issues.issues.iter().take(limit) {
        section.push_str(&format!(
            "- {} **{}** `{}` ({}, {}): {}\n",
            issue.severity.emoji(),
            issue.severity,
            issue.file_path,
            issue.analyzer,
            issue.category,
            issue.description
        ));
    }
    if issues.issues.len() > limit {
        section.push_str(&format!(
            "- *... and {} more*\n",
            issues.issues.len() - limit
        ));
    }
    section.push('\n');

    section
}

fn generate_recommendations_section(recs: &[AttributedRecommendation], max: usize) -> String {
    if recs.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");
    for (i, rec) in recs.iter().take(max).enumerate() {
        section.push_str(&format!(
            "{}. **[P{}]** {} (`{}`, effort: {}): {}\n",
            i + 1,
            rec.priority,
            rec.action,
            rec.component,
            rec.effort,
            rec.impact
        ));
    }
    section.push('\n');

    section
}

fn generate_warnings_section(warnings: &[String]) -> String {
    if warnings.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Excluded Artifacts\n\n");
    for warning in warnings {
        section.push_str(&format!("- ⚠️ {}\n", warning));
    }
    section.push('\n');

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &QaReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AttributedIssue, SeverityCounts, Verdict};
    use chrono::Utc;

    fn create_test_report(overall: Option<SystemScore>) -> QaReport {
        let metadata = QaMetadata {
            audit_dir: "backlog/audit-outputs/audit-1".to_string(),
            audit_id: "audit-1".to_string(),
            generated_at: Utc::now(),
            files_loaded: 2,
            files_failed: 1,
            warnings: vec!["hook-analyzer.json: invalid JSON at line 1, column 3".to_string()],
            analyzers: vec!["command-analyzer".to_string()],
        };

        let issue = |severity, description: &str| AttributedIssue {
            analyzer: "command-analyzer".to_string(),
            component: "audit.md".to_string(),
            file_path: ".claude/commands/audit.md".to_string(),
            severity,
            category: "tool_security".to_string(),
            description: description.to_string(),
        };

        let component = ScoredComponent {
            analyzer: "command-analyzer".to_string(),
            name: "audit.md".to_string(),
            file_path: ".claude/commands/audit.md".to_string(),
            composite: Some(7.25),
            verdict: Some(Verdict::Good),
            dimensions_scored: 6,
            issue_count: 2,
        };
        let issues = CollatedIssues {
            issues: vec![
                issue(Severity::Critical, "Unrestricted Bash"),
                issue(Severity::Warning, "No error handling"),
            ],
            counts: SeverityCounts {
                critical: 1,
                warning: 1,
                suggestion: 0,
            },
        };

        let report_json = serde_json::json!({
            "metadata": metadata,
            "overall": overall,
            "components": [component],
            "dimensions": [],
            "analyzers": [],
            "issues": issues,
            "recommendations": [],
        });
        serde_json::from_value(report_json).unwrap()
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(Some(SystemScore {
            score: 7.25,
            verdict: Verdict::Good,
            components: 1,
        }));
        let markdown = generate_markdown_report(&report, &MarkdownOptions::default());

        assert!(markdown.contains("# Audit QA Report"));
        assert!(markdown.contains("## Verdict"));
        assert!(markdown.contains("**GOOD**"));
        assert!(markdown.contains("7.25/10"));
        assert!(markdown.contains("Unrestricted Bash"));
        assert!(markdown.contains("## Excluded Artifacts"));
        assert!(markdown.contains("Artifacts Excluded:** 1"));
    }

    #[test]
    fn test_undefined_overall_is_explicit() {
        let report = create_test_report(None);
        let markdown = generate_markdown_report(&report, &MarkdownOptions::default());
        assert!(markdown.contains("**undefined**"));
        assert!(!markdown.contains("/10"));
    }

    #[test]
    fn test_issue_limit() {
        let report = create_test_report(None);
        let options = MarkdownOptions {
            max_issues: Some(1),
            ..MarkdownOptions::default()
        };
        let markdown = generate_markdown_report(&report, &options);
        assert!(markdown.contains("Unrestricted Bash"));
        assert!(!markdown.contains("No error handling"));
        assert!(markdown.contains("and 1 more"));
    }

    #[test]
    fn test_issues_can_be_omitted() {
        let report = create_test_report(None);
        let options = MarkdownOptions {
            include_issues: false,
            ..MarkdownOptions::default()
        };
        let markdown = generate_markdown_report(&report, &options);
        assert!(!markdown.contains("## Issues"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(None);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"overall\": null"));
        assert!(json.contains("\"components\""));
        assert!(json.contains("\"issues\""));
    }
}
