pub mod chat;
pub mod documents;
pub mod projects;
pub mod settings;

use crate::llm::LlmError;

/// Failures surfaced by the operation layer. Empty ruleset fields and
/// unrecognized role tags are absorbed upstream and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("backend error: {0}")]
    Backend(#[from] LlmError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Config(String),
}
