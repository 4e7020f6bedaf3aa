//! Error taxonomy for loading and aggregating artifacts.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an [`ArtifactError`], used by callers to decide
/// whether to skip a file or abort the whole audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Schema,
    VersionMismatch,
}

/// Problem with a single artifact file.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("schema error at '{path}': {reason}")]
    Schema { path: String, reason: String },

    #[error("unsupported schema version '{found}' (expected '{expected}')")]
    VersionMismatch { found: String, expected: String },
}

impl ArtifactError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArtifactError::Io { .. } => ErrorKind::Io,
            ArtifactError::Parse { .. } => ErrorKind::Parse,
            ArtifactError::Schema { .. } => ErrorKind::Schema,
            ArtifactError::VersionMismatch { .. } => ErrorKind::VersionMismatch,
        }
    }

    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ArtifactError::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ArtifactError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Syntax | Category::Eof | Category::Io => ArtifactError::Parse {
                line: err.line(),
                column: err.column(),
                message: err.to_string(),
            },
            Category::Data => ArtifactError::schema("$", err.to_string()),
        }
    }
}

/// Batch-level errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Nothing to aggregate: the composite score is undefined, not zero.
    #[error("no artifacts found to aggregate")]
    EmptyBatch,

    #[error("invalid artifact {file}: {source}")]
    InvalidArtifact {
        file: String,
        #[source]
        source: ArtifactError,
    },

    #[error("cannot read audit directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
