//! QA report building and rendering.

pub mod generator;
pub mod qa;

pub use generator::{generate_json_report, generate_markdown_report, MarkdownOptions};
pub use qa::{build_qa_report, to_artifact, QaReport};
