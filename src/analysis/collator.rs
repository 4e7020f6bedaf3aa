//! Issue and recommendation collation across artifacts.

use crate::models::{AnalyzerArtifact, Effort, Issue, Recommendation, Severity};
use serde::{Deserialize, Serialize};

/// An issue together with the component that reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedIssue {
    pub analyzer: String,
    pub component: String,
    pub file_path: String,
    pub severity: Severity,
    pub category: String,
    pub description: String,
}

/// Number of issues per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub suggestion: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.critical + self.warning + self.suggestion
    }

    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Warning => self.warning += 1,
            Severity::Suggestion => self.suggestion += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollatedIssues {
    pub issues: Vec<AttributedIssue>,
    pub counts: SeverityCounts,
}

/// A recommendation together with the component it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedRecommendation {
    pub analyzer: String,
    pub component: String,
    pub priority: u32,
    pub action: String,
    pub effort: Effort,
    pub impact: String,
}

/// Merge every component's issues into one list ordered critical, warning,
/// suggestion. The sort is stable, so component order is kept within a
/// severity. Identical issues from different components are all kept.
pub fn collate_issues<'a, I>(artifacts: I) -> CollatedIssues
where
    I: IntoIterator<Item = &'a AnalyzerArtifact>,
{
    let mut issues: Vec<AttributedIssue> = artifacts
        .into_iter()
        .flat_map(|artifact| {
            artifact.components().iter().flat_map(move |component| {
                component.issues.iter().map(move |issue: &Issue| AttributedIssue {
                    analyzer: artifact.analyzer.clone(),
                    component: component.name.clone(),
                    file_path: component.file_path.clone(),
                    severity: issue.severity,
                    category: issue.category.clone(),
                    description: issue.description.clone(),
                })
            })
        })
        .collect();

    issues.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut counts = SeverityCounts::default();
    for issue in &issues {
        counts.record(issue.severity);
    }

    CollatedIssues { issues, counts }
}

/// Merge every component's recommendations, lowest priority value first.
pub fn collate_recommendations<'a, I>(artifacts: I) -> Vec<AttributedRecommendation>
where
    I: IntoIterator<Item = &'a AnalyzerArtifact>,
{
    let mut recs: Vec<AttributedRecommendation> = artifacts
        .into_iter()
        .flat_map(|artifact| {
            artifact.components().iter().flat_map(move |component| {
                component
                    .recommendations
                    .iter()
                    .map(move |rec: &Recommendation| AttributedRecommendation {
                        analyzer: artifact.analyzer.clone(),
                        component: component.name.clone(),
                        priority: rec.priority,
                        action: rec.action.clone(),
                        effort: rec.effort,
                        impact: rec.impact.clone(),
                    })
            })
        })
        .collect();

    recs.sort_by_key(|r| r.priority);
    recs
}
