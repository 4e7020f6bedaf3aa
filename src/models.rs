//! Data models for analyzer artifacts.
//!
//! This module contains the record types that analyzers write into the
//! audit artifact directory, one JSON document per analyzer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Schema version every artifact must carry.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Analyzer name used for artifacts derived by this tool.
pub const AGGREGATOR_NAME: &str = "audit-aggregator";

/// Severity level of an issue.
///
/// Declared from least to most severe so that `Ord` ranks critical highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Optional improvement
    Suggestion,
    /// Should be fixed
    Warning,
    /// Must be fixed
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Suggestion => "suggestion",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "suggestion" => Some(Severity::Suggestion),
            "warning" => Some(Severity::Warning),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Suggestion => "🟢",
            Severity::Warning => "🟡",
            Severity::Critical => "🔴",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Suggestion => write!(f, "Suggestion"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// Estimated effort of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Effort::Low),
            "medium" => Some(Effort::Medium),
            "high" => Some(Effort::High),
            _ => None,
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effort::Low => write!(f, "low"),
            Effort::Medium => write!(f, "medium"),
            Effort::High => write!(f, "high"),
        }
    }
}

/// A named quality axis scored 0-10 by an analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Structure,
    BestPractices,
    ToolSecurity,
    Completeness,
    Integration,
    DomainDepth,
    DependencyHealth,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Structure,
        Dimension::BestPractices,
        Dimension::ToolSecurity,
        Dimension::Completeness,
        Dimension::Integration,
        Dimension::DomainDepth,
        Dimension::DependencyHealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Structure => "structure",
            Dimension::BestPractices => "best_practices",
            Dimension::ToolSecurity => "tool_security",
            Dimension::Completeness => "completeness",
            Dimension::Integration => "integration",
            Dimension::DomainDepth => "domain_depth",
            Dimension::DependencyHealth => "dependency_health",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }

    /// Fixed aggregation weight. The weights of all dimensions sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            Dimension::Structure => 0.15,
            Dimension::BestPractices => 0.20,
            Dimension::ToolSecurity => 0.15,
            Dimension::Completeness => 0.15,
            Dimension::Integration => 0.10,
            Dimension::DomainDepth => 0.10,
            Dimension::DependencyHealth => 0.15,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dimension scores of one component. `None` means the analyzer did
/// not score that dimension (missing key or explicit `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionScores {
    #[serde(default)]
    pub structure: Option<f64>,
    #[serde(default)]
    pub best_practices: Option<f64>,
    #[serde(default)]
    pub tool_security: Option<f64>,
    #[serde(default)]
    pub completeness: Option<f64>,
    #[serde(default)]
    pub integration: Option<f64>,
    #[serde(default)]
    pub domain_depth: Option<f64>,
    #[serde(default)]
    pub dependency_health: Option<f64>,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Structure => self.structure,
            Dimension::BestPractices => self.best_practices,
            Dimension::ToolSecurity => self.tool_security,
            Dimension::Completeness => self.completeness,
            Dimension::Integration => self.integration,
            Dimension::DomainDepth => self.domain_depth,
            Dimension::DependencyHealth => self.dependency_health,
        }
    }

    /// Iterate over the dimensions that carry a score.
    pub fn present(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL
            .into_iter()
            .filter_map(|d| self.get(d).map(|score| (d, score)))
    }
}

/// A single issue reported for a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: String,
    pub description: String,
}

/// A suggested action for a component. Lower priority values come first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: u32,
    pub action: String,
    pub effort: Effort,
    pub impact: String,
}

/// The analysis result for one configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub name: String,
    pub file_path: String,
    pub scores: DimensionScores,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl ComponentResult {
    /// Returns the number of issues by severity.
    pub fn issue_count_by_severity(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .count()
    }
}

/// Aggregate counts stored alongside the components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_components: usize,
    pub components_with_issues: usize,
    pub critical_issues: usize,
    #[serde(default)]
    pub average_score: Option<f64>,
}

impl AnalysisSummary {
    /// Recompute the summary from a list of components.
    ///
    /// `average_score` is left to the caller since analyzers and the
    /// aggregator define it differently.
    pub fn from_components(components: &[ComponentResult], average_score: Option<f64>) -> Self {
        Self {
            total_components: components.len(),
            components_with_issues: components.iter().filter(|c| !c.issues.is_empty()).count(),
            critical_issues: components
                .iter()
                .map(|c| c.issue_count_by_severity(Severity::Critical))
                .sum(),
            average_score,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub components: Vec<ComponentResult>,
    pub summary: AnalysisSummary,
}

/// Free-form artifact metadata. The well-known keys are typed when they
/// carry the expected type; anything else an analyzer writes, including a
/// well-known key of another type, is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ArtifactMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for ArtifactMetadata {
    fn from(mut extra: Map<String, Value>) -> Self {
        let audit_id = take_typed(&mut extra, "audit_id", |v| v.as_str().map(str::to_string));
        let component_count = take_typed(&mut extra, "component_count", Value::as_u64);
        let scope = take_typed(&mut extra, "scope", |v| v.as_str().map(str::to_string));
        let duration = take_typed(&mut extra, "duration", |v| (!v.is_null()).then(|| v.clone()));
        Self {
            audit_id,
            component_count,
            scope,
            duration,
            extra,
        }
    }
}

/// Remove `key` from `map` only when `convert` accepts its value.
fn take_typed<T>(
    map: &mut Map<String, Value>,
    key: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = convert(map.get(key)?)?;
    map.remove(key);
    Some(value)
}

/// The JSON document one analyzer writes for an audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerArtifact {
    pub analyzer: String,
    pub timestamp: String,
    pub version: String,
    pub metadata: ArtifactMetadata,
    pub analysis: Analysis,
}

impl AnalyzerArtifact {
    pub fn components(&self) -> &[ComponentResult] {
        &self.analysis.components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Suggestion < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = Dimension::ALL.iter().map(|d| d.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_names_round_trip() {
        for dim in Dimension::ALL {
            assert_eq!(Dimension::parse(dim.as_str()), Some(dim));
        }
        assert_eq!(Dimension::parse("performance"), None);
    }

    #[test]
    fn test_null_and_missing_scores_are_absent() {
        let scores: DimensionScores =
            serde_json::from_str(r#"{"structure": 8.0, "integration": null}"#).unwrap();
        assert_eq!(scores.structure, Some(8.0));
        assert_eq!(scores.integration, None);
        assert_eq!(scores.domain_depth, None);
        assert_eq!(scores.present().count(), 1);
    }

    #[test]
    fn test_metadata_keeps_unknown_keys() {
        let meta: ArtifactMetadata = serde_json::from_str(
            r#"{"audit_id": "audit-1", "component_count": 2, "model": "x"}"#,
        )
        .unwrap();
        assert_eq!(meta.audit_id.as_deref(), Some("audit-1"));
        assert_eq!(meta.component_count, Some(2));
        assert_eq!(meta.extra.get("model"), Some(&Value::from("x")));
        assert!(!meta.extra.contains_key("audit_id"));
    }

    #[test]
    fn test_metadata_wrong_typed_key_kept_in_extra() {
        let meta: ArtifactMetadata =
            serde_json::from_str(r#"{"scope": ["commands", "agents"], "component_count": 3}"#)
                .unwrap();
        assert_eq!(meta.scope, None);
        assert_eq!(meta.component_count, Some(3));
        assert_eq!(
            meta.extra.get("scope"),
            Some(&serde_json::json!(["commands", "agents"]))
        );

        let text = serde_json::to_string(&meta).unwrap();
        let back: ArtifactMetadata = serde_json::from_str(&text).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_summary_from_components() {
        let component = |issues: Vec<Issue>| ComponentResult {
            name: "c".to_string(),
            file_path: "c.md".to_string(),
            scores: DimensionScores::default(),
            issues,
            recommendations: vec![],
        };
        let issue = |severity| Issue {
            severity,
            category: "structure".to_string(),
            description: "d".to_string(),
        };
        let components = vec![
            component(vec![issue(Severity::Critical), issue(Severity::Warning)]),
            component(vec![]),
            component(vec![issue(Severity::Critical)]),
        ];

        let summary = AnalysisSummary::from_components(&components, Some(6.5));
        assert_eq!(summary.total_components, 3);
        assert_eq!(summary.components_with_issues, 2);
        assert_eq!(summary.critical_issues, 2);
        assert_eq!(summary.average_score, Some(6.5));
    }
}
