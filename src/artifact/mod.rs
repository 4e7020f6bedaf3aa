//! Artifact validation and loading.

pub mod loader;
pub mod validator;

pub use loader::{latest_audit_id, load_dir, resolve_audit_dir, BatchStatus, LoadOptions, LoadReport};
pub use validator::parse_artifact;
