//! The QA report: everything derived from one audit directory.

use crate::analysis::{
    aggregate, analyzer_breakdown, collate_issues, collate_recommendations, dimension_averages,
    AnalyzerStats, AttributedRecommendation, CollatedIssues, DimensionAverage, ScoredComponent,
    SystemScore,
};
use crate::artifact::LoadReport;
use crate::error::AuditError;
use crate::models::{
    Analysis, AnalysisSummary, AnalyzerArtifact, ArtifactMetadata, ComponentResult,
    AGGREGATOR_NAME, SCHEMA_VERSION,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Metadata about the QA report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaMetadata {
    /// Directory the artifacts were read from.
    pub audit_dir: String,
    /// Audit id (the directory name).
    pub audit_id: String,
    pub generated_at: DateTime<Utc>,
    pub files_loaded: usize,
    pub files_failed: usize,
    /// One line per excluded artifact file.
    pub warnings: Vec<String>,
    /// Analyzers that contributed a valid artifact, in load order.
    pub analyzers: Vec<String>,
}

/// The aggregated QA report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaReport {
    pub metadata: QaMetadata,
    /// `None` when no component carries any score.
    pub overall: Option<SystemScore>,
    pub components: Vec<ScoredComponent>,
    pub dimensions: Vec<DimensionAverage>,
    pub analyzers: Vec<AnalyzerStats>,
    pub issues: CollatedIssues,
    pub recommendations: Vec<AttributedRecommendation>,
    /// Source components in aggregation order, kept for the derived artifact.
    #[serde(skip)]
    sources: Vec<ComponentResult>,
}

impl QaReport {
    pub fn critical_issues(&self) -> usize {
        self.issues.counts.critical
    }

    /// Components that carried no dimension score at all.
    pub fn unscored(&self) -> usize {
        self.components.iter().filter(|c| c.composite.is_none()).count()
    }
}

/// Aggregate a loaded batch into a QA report.
///
/// Returns [`AuditError::EmptyBatch`] when the batch holds no component.
pub fn build_qa_report(load: &LoadReport) -> Result<QaReport, AuditError> {
    let artifacts = load.artifacts();
    let aggregation = aggregate(artifacts.iter().copied())?;

    let audit_id = load
        .dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let metadata = QaMetadata {
        audit_dir: load.dir.display().to_string(),
        audit_id,
        generated_at: Utc::now(),
        files_loaded: load.loaded(),
        files_failed: load.failed(),
        warnings: load.warnings(),
        analyzers: artifacts.iter().map(|a| a.analyzer.clone()).collect(),
    };

    Ok(QaReport {
        metadata,
        analyzers: analyzer_breakdown(&aggregation),
        overall: aggregation.overall,
        components: aggregation.components,
        dimensions: dimension_averages(artifacts.iter().copied()),
        issues: collate_issues(artifacts.iter().copied()),
        recommendations: collate_recommendations(artifacts.iter().copied()),
        sources: artifacts
            .iter()
            .flat_map(|a| a.components().iter().cloned())
            .collect(),
    })
}

/// Express the report as a derived analyzer artifact.
///
/// The artifact carries the source components unchanged and records the
/// composite results in its metadata, so it validates against the same
/// schema as any analyzer output.
pub fn to_artifact(report: &QaReport) -> AnalyzerArtifact {
    let overall_score = report.overall.map(|o| o.score);

    let composites: Vec<Value> = report
        .components
        .iter()
        .map(|c| {
            json!({
                "analyzer": c.analyzer,
                "name": c.name,
                "file_path": c.file_path,
                "composite": c.composite,
                "verdict": c.verdict,
            })
        })
        .collect();

    let mut extra = Map::new();
    extra.insert("overall_score".to_string(), json!(overall_score));
    extra.insert(
        "verdict".to_string(),
        json!(report.overall.map(|o| o.verdict)),
    );
    extra.insert("composites".to_string(), Value::Array(composites));
    extra.insert("sources".to_string(), json!(report.metadata.analyzers));
    extra.insert(
        "files_failed".to_string(),
        json!(report.metadata.files_failed),
    );

    let metadata = ArtifactMetadata {
        audit_id: Some(report.metadata.audit_id.clone()),
        component_count: Some(report.sources.len() as u64),
        scope: Some("aggregate".to_string()),
        duration: None,
        extra,
    };

    AnalyzerArtifact {
        analyzer: AGGREGATOR_NAME.to_string(),
        timestamp: report.metadata.generated_at.to_rfc3339(),
        version: SCHEMA_VERSION.to_string(),
        metadata,
        analysis: Analysis {
            summary: AnalysisSummary::from_components(&report.sources, overall_score),
            components: report.sources.clone(),
        },
    }
}
