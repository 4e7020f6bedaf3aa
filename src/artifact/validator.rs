//! Structural validation of analyzer artifacts.
//!
//! Validation walks the raw JSON document so the first problem can be
//! reported with its exact path (e.g. `analysis.components[1].scores.structure`)
//! before the document is turned into typed records.

use crate::error::ArtifactError;
use crate::models::{AnalyzerArtifact, Dimension, Effort, Severity};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{Map, Value};

type Object = Map<String, Value>;

/// Parse raw artifact text and validate it.
///
/// A JSON syntax error is reported as [`ArtifactError::Parse`], never as a
/// schema problem.
pub fn parse_artifact(text: &str, expected_version: &str) -> Result<AnalyzerArtifact, ArtifactError> {
    let value: Value = serde_json::from_str(text)?;
    validate(&value, expected_version)
}

/// Validate a parsed JSON document against the artifact schema.
pub fn validate(value: &Value, expected_version: &str) -> Result<AnalyzerArtifact, ArtifactError> {
    let root = value
        .as_object()
        .ok_or_else(|| wrong_type("$", "object", value))?;

    // Version first: an artifact from another schema generation should be
    // reported as such, not as whatever shape difference it happens to have.
    let version = require_str(root, "", "version")?;
    if version != expected_version {
        return Err(ArtifactError::VersionMismatch {
            found: version.to_string(),
            expected: expected_version.to_string(),
        });
    }

    let analyzer = require_str(root, "", "analyzer")?;
    if analyzer.trim().is_empty() {
        return Err(ArtifactError::schema("analyzer", "must not be empty"));
    }

    let timestamp = require_str(root, "", "timestamp")?;
    if !is_iso8601(timestamp) {
        return Err(ArtifactError::schema(
            "timestamp",
            format!("'{}' is not an ISO-8601 timestamp", timestamp),
        ));
    }

    // Metadata is free-form; typed keys of the wrong type stay in `extra`.
    require_object(root, "", "metadata")?;

    let analysis = require_object(root, "", "analysis")?;
    let components = require_array(analysis, "analysis", "components")?;
    for (i, component) in components.iter().enumerate() {
        validate_component(component, &format!("analysis.components[{}]", i))?;
    }

    let summary = require_object(analysis, "analysis", "summary")?;
    validate_summary(summary, components)?;

    AnalyzerArtifact::deserialize(value).map_err(ArtifactError::from)
}

/// Accepts an offset timestamp, a local date-time without offset, or a
/// plain calendar date.
fn is_iso8601(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn validate_component(value: &Value, path: &str) -> Result<(), ArtifactError> {
    let component = value
        .as_object()
        .ok_or_else(|| wrong_type(path, "object", value))?;

    require_str(component, path, "name")?;
    require_str(component, path, "file_path")?;

    let scores_path = join(path, "scores");
    let scores = require_object(component, path, "scores")?;
    for (key, score) in scores {
        let score_path = join(&scores_path, key);
        if Dimension::parse(key).is_none() {
            return Err(ArtifactError::schema(score_path, "unknown score dimension"));
        }
        if score.is_null() {
            continue;
        }
        let n = score
            .as_f64()
            .ok_or_else(|| wrong_type(&score_path, "number or null", score))?;
        if !(0.0..=10.0).contains(&n) {
            return Err(ArtifactError::schema(
                score_path,
                format!("score {} outside [0, 10]", n),
            ));
        }
    }

    if let Some(issues) = optional_array(component, path, "issues")? {
        for (i, issue) in issues.iter().enumerate() {
            validate_issue(issue, &format!("{}.issues[{}]", path, i))?;
        }
    }

    if let Some(recommendations) = optional_array(component, path, "recommendations")? {
        for (i, rec) in recommendations.iter().enumerate() {
            validate_recommendation(rec, &format!("{}.recommendations[{}]", path, i))?;
        }
    }

    Ok(())
}

fn validate_issue(value: &Value, path: &str) -> Result<(), ArtifactError> {
    let issue = value
        .as_object()
        .ok_or_else(|| wrong_type(path, "object", value))?;

    let severity = require_str(issue, path, "severity")?;
    if Severity::parse(severity).is_none() {
        return Err(ArtifactError::schema(
            join(path, "severity"),
            format!(
                "unknown severity '{}' (expected critical, warning or suggestion)",
                severity
            ),
        ));
    }
    require_str(issue, path, "category")?;
    require_str(issue, path, "description")?;
    Ok(())
}

fn validate_recommendation(value: &Value, path: &str) -> Result<(), ArtifactError> {
    let rec = value
        .as_object()
        .ok_or_else(|| wrong_type(path, "object", value))?;

    let priority = require(rec, path, "priority")?;
    let in_range = priority
        .as_u64()
        .is_some_and(|p| u32::try_from(p).is_ok());
    if !in_range {
        return Err(wrong_type(
            &join(path, "priority"),
            "non-negative integer",
            priority,
        ));
    }

    require_str(rec, path, "action")?;
    let effort = require_str(rec, path, "effort")?;
    if Effort::parse(effort).is_none() {
        return Err(ArtifactError::schema(
            join(path, "effort"),
            format!("unknown effort '{}' (expected low, medium or high)", effort),
        ));
    }
    require_str(rec, path, "impact")?;
    Ok(())
}

fn validate_summary(summary: &Object, components: &[Value]) -> Result<(), ArtifactError> {
    let path = "analysis.summary";

    let total = require_count(summary, path, "total_components")?;
    if total != components.len() as u64 {
        return Err(ArtifactError::schema(
            join(path, "total_components"),
            format!(
                "declares {} components but {} are present",
                total,
                components.len()
            ),
        ));
    }

    let with_issues = require_count(summary, path, "components_with_issues")?;
    if with_issues > total {
        return Err(ArtifactError::schema(
            join(path, "components_with_issues"),
            format!("{} exceeds total_components ({})", with_issues, total),
        ));
    }

    let critical = require_count(summary, path, "critical_issues")?;
    let actual_critical = count_critical(components);
    if critical != actual_critical {
        return Err(ArtifactError::schema(
            join(path, "critical_issues"),
            format!(
                "declares {} critical issues but {} are present",
                critical, actual_critical
            ),
        ));
    }

    if let Some(avg) = summary.get("average_score") {
        if !avg.is_null() {
            let avg_path = join(path, "average_score");
            let n = avg
                .as_f64()
                .ok_or_else(|| wrong_type(&avg_path, "number or null", avg))?;
            if !(0.0..=10.0).contains(&n) {
                return Err(ArtifactError::schema(
                    avg_path,
                    format!("score {} outside [0, 10]", n),
                ));
            }
        }
    }

    Ok(())
}

/// Components were already validated, so issue shapes are known to be sound.
fn count_critical(components: &[Value]) -> u64 {
    components
        .iter()
        .filter_map(|c| c.get("issues").and_then(Value::as_array))
        .flatten()
        .filter(|issue| {
            issue.get("severity").and_then(Value::as_str) == Some(Severity::Critical.as_str())
        })
        .count() as u64
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn wrong_type(path: &str, expected: &str, found: &Value) -> ArtifactError {
    ArtifactError::schema(
        path,
        format!("expected {}, found {}", expected, type_name(found)),
    )
}

fn require<'a>(obj: &'a Object, parent: &str, key: &str) -> Result<&'a Value, ArtifactError> {
    obj.get(key)
        .ok_or_else(|| ArtifactError::schema(join(parent, key), "missing required field"))
}

fn require_str<'a>(obj: &'a Object, parent: &str, key: &str) -> Result<&'a str, ArtifactError> {
    let value = require(obj, parent, key)?;
    value
        .as_str()
        .ok_or_else(|| wrong_type(&join(parent, key), "string", value))
}

fn require_object<'a>(
    obj: &'a Object,
    parent: &str,
    key: &str,
) -> Result<&'a Object, ArtifactError> {
    let value = require(obj, parent, key)?;
    value
        .as_object()
        .ok_or_else(|| wrong_type(&join(parent, key), "object", value))
}

fn require_array<'a>(
    obj: &'a Object,
    parent: &str,
    key: &str,
) -> Result<&'a Vec<Value>, ArtifactError> {
    let value = require(obj, parent, key)?;
    value
        .as_array()
        .ok_or_else(|| wrong_type(&join(parent, key), "array", value))
}

fn require_count(obj: &Object, parent: &str, key: &str) -> Result<u64, ArtifactError> {
    let value = require(obj, parent, key)?;
    value
        .as_u64()
        .ok_or_else(|| wrong_type(&join(parent, key), "non-negative integer", value))
}

fn optional_array<'a>(
    obj: &'a Object,
    parent: &str,
    key: &str,
) -> Result<Option<&'a Vec<Value>>, ArtifactError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(wrong_type(&join(parent, key), "array", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::SCHEMA_VERSION;
    use serde_json::json;

    fn valid_doc() -> Value {
        json!({
            "analyzer": "command-analyzer",
            "timestamp": "2025-01-15T10:30:00Z",
            "version": "1.0.0",
            "metadata": {"audit_id": "audit-20250115", "component_count": 2, "scope": "commands"},
            "analysis": {
                "components": [
                    {
                        "name": "audit.md",
                        "file_path": ".claude/commands/audit.md",
                        "scores": {"structure": 8.0, "best_practices": 7.5, "tool_security": null},
                        "issues": [
                            {"severity": "critical", "category": "security", "description": "Bash(*) granted"}
                        ],
                        "recommendations": [
                            {"priority": 1, "action": "Restrict tools", "effort": "low", "impact": "high"}
                        ]
                    },
                    {
                        "name": "review.md",
                        "file_path": ".claude/commands/review.md",
                        "scores": {"completeness": 6.0},
                        "issues": [],
                        "recommendations": []
                    }
                ],
                "summary": {
                    "total_components": 2,
                    "components_with_issues": 1,
                    "critical_issues": 1,
                    "average_score": 7.1
                }
            }
        })
    }

    fn schema_path(err: ArtifactError) -> String {
        match err {
            ArtifactError::Schema { path, .. } => path,
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_document() {
        let artifact = validate(&valid_doc(), SCHEMA_VERSION).unwrap();
        assert_eq!(artifact.analyzer, "command-analyzer");
        assert_eq!(artifact.components().len(), 2);
        assert_eq!(artifact.components()[0].scores.structure, Some(8.0));
        assert_eq!(artifact.components()[0].scores.tool_security, None);
        assert_eq!(artifact.metadata.audit_id.as_deref(), Some("audit-20250115"));
    }

    #[test]
    fn test_missing_required_field() {
        let mut doc = valid_doc();
        doc.as_object_mut().unwrap().remove("analyzer");
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(schema_path(err), "analyzer");
    }

    #[test]
    fn test_wrong_type_reports_path() {
        let mut doc = valid_doc();
        doc["analysis"]["components"][1]["name"] = json!(42);
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(schema_path(err), "analysis.components[1].name");
    }

    #[test]
    fn test_version_mismatch() {
        let mut doc = valid_doc();
        doc["version"] = json!("2.0.0");
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VersionMismatch);
    }

    #[test]
    fn test_score_out_of_range() {
        let mut doc = valid_doc();
        doc["analysis"]["components"][0]["scores"]["structure"] = json!(10.5);
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(schema_path(err), "analysis.components[0].scores.structure");
    }

    #[test]
    fn test_boundary_scores_accepted() {
        let mut doc = valid_doc();
        doc["analysis"]["components"][0]["scores"]["structure"] = json!(0);
        doc["analysis"]["components"][0]["scores"]["best_practices"] = json!(10);
        assert!(validate(&doc, SCHEMA_VERSION).is_ok());
    }

    #[test]
    fn test_unknown_dimension_rejected() {
        let mut doc = valid_doc();
        doc["analysis"]["components"][1]["scores"]["performance"] = json!(5.0);
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(schema_path(err), "analysis.components[1].scores.performance");
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let mut doc = valid_doc();
        doc["analysis"]["components"][0]["issues"][0]["severity"] = json!("high");
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(
            schema_path(err),
            "analysis.components[0].issues[0].severity"
        );
    }

    #[test]
    fn test_total_components_must_match() {
        let mut doc = valid_doc();
        doc["analysis"]["summary"]["total_components"] = json!(3);
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(schema_path(err), "analysis.summary.total_components");
    }

    #[test]
    fn test_critical_count_must_match() {
        let mut doc = valid_doc();
        doc["analysis"]["summary"]["critical_issues"] = json!(0);
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(schema_path(err), "analysis.summary.critical_issues");
    }

    #[test]
    fn test_bad_timestamp() {
        let mut doc = valid_doc();
        doc["timestamp"] = json!("yesterday");
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(schema_path(err), "timestamp");
    }

    #[test]
    fn test_timestamp_without_offset_accepted() {
        for ts in ["2025-01-15T10:30:00", "2025-01-15T10:30:00.250", "2025-01-15"] {
            let mut doc = valid_doc();
            doc["timestamp"] = json!(ts);
            let artifact = validate(&doc, SCHEMA_VERSION).unwrap();
            assert_eq!(artifact.timestamp, ts);
        }
    }

    #[test]
    fn test_metadata_is_free_form() {
        let mut doc = valid_doc();
        doc["metadata"] = json!({
            "audit_id": 42,
            "scope": ["commands", "agents"],
            "component_count": "two",
        });
        let artifact = validate(&doc, SCHEMA_VERSION).unwrap();
        let meta = &artifact.metadata;
        assert_eq!(meta.audit_id, None);
        assert_eq!(meta.scope, None);
        assert_eq!(meta.component_count, None);
        assert_eq!(meta.extra.get("scope"), Some(&json!(["commands", "agents"])));
        assert_eq!(meta.extra.get("audit_id"), Some(&json!(42)));
    }

    #[test]
    fn test_metadata_must_be_object() {
        let mut doc = valid_doc();
        doc["metadata"] = json!("none");
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(schema_path(err), "metadata");
    }

    #[test]
    fn test_negative_priority_rejected() {
        let mut doc = valid_doc();
        doc["analysis"]["components"][0]["recommendations"][0]["priority"] = json!(-1);
        let err = validate(&doc, SCHEMA_VERSION).unwrap_err();
        assert_eq!(
            schema_path(err),
            "analysis.components[0].recommendations[0].priority"
        );
    }

    #[test]
    fn test_issues_may_be_omitted() {
        let mut doc = valid_doc();
        doc["analysis"]["components"][1]
            .as_object_mut()
            .unwrap()
            .remove("issues");
        let artifact = validate(&doc, SCHEMA_VERSION).unwrap();
        assert!(artifact.components()[1].issues.is_empty());
    }

    #[test]
    fn test_syntax_error_is_parse_not_schema() {
        let err = parse_artifact("{\"analyzer\": \"x\",", SCHEMA_VERSION).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = parse_artifact("[]", SCHEMA_VERSION).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_fixture_artifact_is_valid() {
        let text = include_str!("../../fixtures/command-analyzer.json");
        let artifact = parse_artifact(text, SCHEMA_VERSION).unwrap();
        assert_eq!(artifact.analyzer, "command-analyzer");
    }
}
