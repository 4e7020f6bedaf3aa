//! Weighted score aggregation and verdicts.
//!
//! Each component's dimension scores are combined into one composite using
//! the fixed dimension weights. Dimensions an analyzer did not score are
//! left out and the remaining weights are renormalized, so a missing score
//! never counts as zero.

use crate::error::AuditError;
use crate::models::{AnalyzerArtifact, Dimension, DimensionScores};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete quality label derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
    Critical,
}

/// Tolerance for float rounding in weighted sums and means.
pub const SCORE_EPSILON: f64 = 1e-9;

impl Verdict {
    /// Map a score to its verdict. Lower bounds are inclusive, within
    /// [`SCORE_EPSILON`].
    pub fn from_score(score: f64) -> Self {
        let at_least = |bound: f64| score >= bound - SCORE_EPSILON;
        if at_least(8.0) {
            Verdict::Excellent
        } else if at_least(7.0) {
            Verdict::Good
        } else if at_least(5.0) {
            Verdict::NeedsImprovement
        } else if at_least(3.0) {
            Verdict::Poor
        } else {
            Verdict::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Excellent => "EXCELLENT",
            Verdict::Good => "GOOD",
            Verdict::NeedsImprovement => "NEEDS_IMPROVEMENT",
            Verdict::Poor => "POOR",
            Verdict::Critical => "CRITICAL",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Verdict::Excellent => "🏆",
            Verdict::Good => "✅",
            Verdict::NeedsImprovement => "🟡",
            Verdict::Poor => "🟠",
            Verdict::Critical => "🔴",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One component with its composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredComponent {
    /// Analyzer whose artifact reported the component.
    pub analyzer: String,
    pub name: String,
    pub file_path: String,
    /// `None` when the analyzer scored no dimension at all.
    pub composite: Option<f64>,
    pub verdict: Option<Verdict>,
    pub dimensions_scored: usize,
    pub issue_count: usize,
}

/// Overall system score and its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemScore {
    pub score: f64,
    pub verdict: Verdict,
    /// Number of composites that went into the mean.
    pub components: usize,
}

/// Result of aggregating a batch of artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub components: Vec<ScoredComponent>,
    /// `None` when no component carries any score.
    pub overall: Option<SystemScore>,
}

/// Mean score of one dimension across the components that scored it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionAverage {
    pub dimension: Dimension,
    pub average: f64,
    pub components: usize,
}

/// Per-analyzer rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerStats {
    pub analyzer: String,
    pub components: usize,
    pub average_composite: Option<f64>,
}

/// Weighted composite of the present dimension scores, renormalized over
/// the weights of those dimensions.
pub fn composite_score(scores: &DimensionScores) -> Option<f64> {
    let (weighted, total_weight) = scores
        .present()
        .fold((0.0, 0.0), |(sum, weight), (dim, score)| {
            (sum + dim.weight() * score, weight + dim.weight())
        });

    if total_weight > 0.0 {
        Some(weighted / total_weight)
    } else {
        None
    }
}

/// Arithmetic mean, `None` for an empty input.
fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Score every component of every artifact and compute the system score.
///
/// Components with the same name from different analyzers stay separate
/// entries. Returns [`AuditError::EmptyBatch`] when there is no component
/// at all.
pub fn aggregate<'a, I>(artifacts: I) -> Result<Aggregation, AuditError>
where
    I: IntoIterator<Item = &'a AnalyzerArtifact>,
{
    let components: Vec<ScoredComponent> = artifacts
        .into_iter()
        .flat_map(|artifact| {
            artifact.components().iter().map(move |c| {
                let composite = composite_score(&c.scores);
                ScoredComponent {
                    analyzer: artifact.analyzer.clone(),
                    name: c.name.clone(),
                    file_path: c.file_path.clone(),
                    composite,
                    verdict: composite.map(Verdict::from_score),
                    dimensions_scored: c.scores.present().count(),
                    issue_count: c.issues.len(),
                }
            })
        })
        .collect();

    if components.is_empty() {
        return Err(AuditError::EmptyBatch);
    }

    let scored = components.iter().filter_map(|c| c.composite).count();
    let overall = mean(components.iter().filter_map(|c| c.composite)).map(|score| SystemScore {
        score,
        verdict: Verdict::from_score(score),
        components: scored,
    });

    Ok(Aggregation {
        components,
        overall,
    })
}

/// Average of each dimension over the components that scored it, in
/// dimension order. Dimensions nobody scored are omitted.
pub fn dimension_averages<'a, I>(artifacts: I) -> Vec<DimensionAverage>
where
    I: IntoIterator<Item = &'a AnalyzerArtifact>,
{
    let all_scores: Vec<&DimensionScores> = artifacts
        .into_iter()
        .flat_map(|a| a.components().iter().map(|c| &c.scores))
        .collect();

    Dimension::ALL
        .into_iter()
        .filter_map(|dimension| {
            let values: Vec<f64> = all_scores.iter().filter_map(|s| s.get(dimension)).collect();
            mean(values.iter().copied()).map(|average| DimensionAverage {
                dimension,
                average,
                components: values.len(),
            })
        })
        .collect()
}

/// Component count and mean composite per analyzer, in first-seen order.
pub fn analyzer_breakdown(aggregation: &Aggregation) -> Vec<AnalyzerStats> {
    let mut order: Vec<&str> = Vec::new();
    for component in &aggregation.components {
        if !order.contains(&component.analyzer.as_str()) {
            order.push(&component.analyzer);
        }
    }

    order
        .into_iter()
        .map(|analyzer| {
            let own: Vec<&ScoredComponent> = aggregation
                .components
                .iter()
                .filter(|c| c.analyzer == analyzer)
                .collect();
            AnalyzerStats {
                analyzer: analyzer.to_string(),
                components: own.len(),
                average_composite: mean(own.iter().filter_map(|c| c.composite)),
            }
        })
        .collect()
}
