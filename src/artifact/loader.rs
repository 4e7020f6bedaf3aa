//! Artifact directory loading.
//!
//! Reads every `*.json` file directly inside an audit directory. A bad file
//! is recorded and excluded; it never aborts the batch unless strict mode is
//! requested.

use super::validator::parse_artifact;
use crate::error::{ArtifactError, AuditError};
use crate::models::{AnalyzerArtifact, AGGREGATOR_NAME, SCHEMA_VERSION};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Options for loading an artifact directory.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Schema version artifacts must declare.
    pub schema_version: String,
    /// Abort on the first invalid file instead of skipping it.
    pub strict: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            strict: false,
        }
    }
}

impl From<&crate::config::LoaderConfig> for LoadOptions {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        Self {
            schema_version: config.schema_version.clone(),
            strict: config.strict,
        }
    }
}

/// What the loader found in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// The directory does not exist.
    DirectoryMissing,
    /// The directory exists but holds no artifact files.
    NoArtifacts,
    /// At least one artifact file was found (valid or not).
    Loaded,
}

/// Outcome for one artifact file.
#[derive(Debug)]
pub struct LoadEntry {
    pub file_name: String,
    pub result: Result<AnalyzerArtifact, ArtifactError>,
}

/// Result of loading an artifact directory.
#[derive(Debug)]
pub struct LoadReport {
    pub dir: PathBuf,
    pub status: BatchStatus,
    pub entries: Vec<LoadEntry>,
}

impl LoadReport {
    fn empty(dir: &Path, status: BatchStatus) -> Self {
        Self {
            dir: dir.to_path_buf(),
            status,
            entries: Vec::new(),
        }
    }

    /// Number of files that loaded and validated.
    pub fn loaded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_ok()).count()
    }

    /// Number of files that were excluded.
    pub fn failed(&self) -> usize {
        self.entries.len() - self.loaded()
    }

    /// Valid artifacts in file-name order.
    pub fn artifacts(&self) -> Vec<&AnalyzerArtifact> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().ok())
            .collect()
    }

    /// One warning line per excluded file.
    pub fn warnings(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| {
                e.result
                    .as_ref()
                    .err()
                    .map(|err| format!("{}: {}", e.file_name, err))
            })
            .collect()
    }
}

/// Build `<root>/<audit-id>`.
pub fn resolve_audit_dir(root: &Path, audit_id: &str) -> PathBuf {
    root.join(audit_id)
}

/// Find the most recently modified audit directory under `root`.
pub fn latest_audit_id(root: &Path) -> Result<Option<String>, AuditError> {
    if !root.is_dir() {
        return Ok(None);
    }

    let mut latest: Option<(SystemTime, String)> = None;
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| AuditError::Directory {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let name = entry.file_name().to_string_lossy().to_string();

        let newer = match &latest {
            Some((time, current)) => modified > *time || (modified == *time && name > *current),
            None => true,
        };
        if newer {
            latest = Some((modified, name));
        }
    }

    Ok(latest.map(|(_, name)| name))
}

/// Load and validate every artifact in `dir`.
pub fn load_dir(dir: &Path, options: &LoadOptions) -> Result<LoadReport, AuditError> {
    if !dir.is_dir() {
        warn!("Audit directory not found: {}", dir.display());
        return Ok(LoadReport::empty(dir, BatchStatus::DirectoryMissing));
    }

    let files = artifact_files(dir)?;
    if files.is_empty() {
        warn!("No artifacts found in {}", dir.display());
        return Ok(LoadReport::empty(dir, BatchStatus::NoArtifacts));
    }

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        match load_file(&path, &options.schema_version) {
            Ok(artifact) if artifact.analyzer == AGGREGATOR_NAME => {
                debug!("Skipping derived aggregate artifact {}", file_name);
            }
            Ok(artifact) => {
                debug!(
                    "Loaded {} ({}, {} components)",
                    file_name,
                    artifact.analyzer,
                    artifact.components().len()
                );
                entries.push(LoadEntry {
                    file_name,
                    result: Ok(artifact),
                });
            }
            Err(source) if options.strict => {
                return Err(AuditError::InvalidArtifact {
                    file: file_name,
                    source,
                });
            }
            Err(e) => {
                warn!(kind = ?e.kind(), "Excluding {}: {}", file_name, e);
                entries.push(LoadEntry {
                    file_name,
                    result: Err(e),
                });
            }
        }
    }

    let report = LoadReport {
        dir: dir.to_path_buf(),
        status: BatchStatus::Loaded,
        entries,
    };
    info!(
        "Loaded {} artifacts from {} ({} excluded)",
        report.loaded(),
        dir.display(),
        report.failed()
    );

    Ok(report)
}

/// Read and validate a single artifact file.
pub fn load_file(path: &Path, schema_version: &str) -> Result<AnalyzerArtifact, ArtifactError> {
    let text = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_artifact(&text, schema_version)
}

/// `*.json` files directly inside `dir`, sorted by name.
fn artifact_files(dir: &Path) -> Result<Vec<PathBuf>, AuditError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| AuditError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        // `Path::is_file` follows symlinks; `DirEntry::file_type` does not.
        if is_json && path.is_file() {
            files.push(path.to_path_buf());
        } else {
            debug!("Ignoring {}", path.display());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    const COMMAND: &str = include_str!("../../fixtures/command-analyzer.json");
    const AGENT: &str = include_str!("../../fixtures/agent-analyzer.json");
    const DEPENDENCY: &str = include_str!("../../fixtures/dependency-analyzer.json");

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let report = load_dir(&tmp.path().join("nope"), &LoadOptions::default()).unwrap();
        assert_eq!(report.status, BatchStatus::DirectoryMissing);
        assert!(report.entries.is_empty());
    }

    #[test]
    fn test_empty_directory() {
        let tmp = TempDir::new().unwrap();
        write(&tmp, "notes.txt", "not an artifact");
        let report = load_dir(tmp.path(), &LoadOptions::default()).unwrap();
        assert_eq!(report.status, BatchStatus::NoArtifacts);
    }

    #[test]
    fn test_three_valid_one_malformed() {
        let tmp = TempDir::new().unwrap();
        write(&tmp, "command-analyzer.json", COMMAND);
        write(&tmp, "agent-analyzer.json", AGENT);
        write(&tmp, "dependency-analyzer.json", DEPENDENCY);
        write(&tmp, "hook-analyzer.json", "{\"analyzer\": \"hook-analyzer\", ");

        let report = load_dir(tmp.path(), &LoadOptions::default()).unwrap();
        assert_eq!(report.status, BatchStatus::Loaded);
        assert_eq!(report.loaded(), 3);
        assert_eq!(report.failed(), 1);

        let warnings = report.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("hook-analyzer.json"));

        let failed = report.entries.iter().find(|e| e.result.is_err()).unwrap();
        assert_eq!(
            failed.result.as_ref().unwrap_err().kind(),
            ErrorKind::Parse
        );
    }

    #[test]
    fn test_entries_sorted_by_file_name() {
        let tmp = TempDir::new().unwrap();
        write(&tmp, "b.json", AGENT);
        write(&tmp, "a.json", COMMAND);
        let report = load_dir(tmp.path(), &LoadOptions::default()).unwrap();
        let names: Vec<_> = report.entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_subdirectories_ignored() {
        let tmp = TempDir::new().unwrap();
        write(&tmp, "command-analyzer.json", COMMAND);
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/agent-analyzer.json"), AGENT).unwrap();
        let report = load_dir(tmp.path(), &LoadOptions::default()).unwrap();
        assert_eq!(report.entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_artifact_loaded() {
        let store = TempDir::new().unwrap();
        fs::write(store.path().join("agent-analyzer.json"), AGENT).unwrap();

        let tmp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(
            store.path().join("agent-analyzer.json"),
            tmp.path().join("agent-analyzer.json"),
        )
        .unwrap();

        let report = load_dir(tmp.path(), &LoadOptions::default()).unwrap();
        assert_eq!(report.status, BatchStatus::Loaded);
        assert_eq!(report.loaded(), 1);
    }

    #[test]
    fn test_strict_mode_aborts() {
        let tmp = TempDir::new().unwrap();
        write(&tmp, "a.json", COMMAND);
        write(&tmp, "b.json", "[1, 2");
        let options = LoadOptions {
            strict: true,
            ..LoadOptions::default()
        };
        let err = load_dir(tmp.path(), &options).unwrap_err();
        assert!(matches!(err, AuditError::InvalidArtifact { ref file, .. } if file == "b.json"));
    }

    #[test]
    fn test_version_mismatch_excluded() {
        let tmp = TempDir::new().unwrap();
        write(&tmp, "command-analyzer.json", COMMAND);
        let options = LoadOptions {
            schema_version: "2.0.0".to_string(),
            ..LoadOptions::default()
        };
        let report = load_dir(tmp.path(), &options).unwrap();
        assert_eq!(report.loaded(), 0);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.entries[0].result.as_ref().unwrap_err().kind(),
            ErrorKind::VersionMismatch
        );
    }

    #[test]
    fn test_latest_audit_id() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(latest_audit_id(tmp.path()).unwrap(), None);

        fs::create_dir(tmp.path().join("audit-1")).unwrap();
        assert_eq!(
            latest_audit_id(tmp.path()).unwrap().as_deref(),
            Some("audit-1")
        );
        assert_eq!(
            resolve_audit_dir(tmp.path(), "audit-1"),
            tmp.path().join("audit-1")
        );
    }
}
