//! Core of a team AI workspace: projects carry a ruleset that is injected
//! into every agent prompt, conversations run against role-specialized
//! agents (PM / DEV / DESIGNER), and selected agent replies are captured as
//! structured block documents.

pub mod commands;
pub mod db;
pub mod doc_parser;
pub mod llm;
pub mod prompt;

pub use commands::WorkspaceError;
pub use db::models::{
    AgentRole, BlockKind, ChatTurn, DocType, Document, DocumentBlock, DocumentContent, Project,
    ProjectRuleset, TurnSender,
};
pub use db::Database;
pub use doc_parser::parse_blocks;
pub use llm::{
    ChatMessage, GenerateRequest, GenerateResponse, LlmError, ModelInfo, Provider, StreamChunk,
};
pub use prompt::{build_history, build_system_instruction, DEFAULT_HISTORY_WINDOW};
