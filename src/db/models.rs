use serde::{Deserialize, Serialize};

/// Project-level rules injected into every agent instruction for a project.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRuleset {
    pub tech_stack: Vec<String>,
    pub convention: String,
    pub tone: String,
    pub custom_instructions: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub ruleset: ProjectRuleset,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentRole {
    Pm,
    Dev,
    Designer,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Pm => "PM",
            AgentRole::Dev => "DEV",
            AgentRole::Designer => "DESIGNER",
        }
    }

    /// Unknown tags yield None; callers fall back to the default directive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PM" => Some(AgentRole::Pm),
            "DEV" => Some(AgentRole::Dev),
            "DESIGNER" => Some(AgentRole::Designer),
            _ => None,
        }
    }

    pub fn all() -> &'static [AgentRole] {
        &[AgentRole::Pm, AgentRole::Dev, AgentRole::Designer]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::Pm => "Project Manager",
            AgentRole::Dev => "Developer",
            AgentRole::Designer => "Designer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnSender {
    User,
    Agent,
}

impl TurnSender {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnSender::User => "user",
            TurnSender::Agent => "agent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(TurnSender::User),
            "agent" => Some(TurnSender::Agent),
            _ => None,
        }
    }
}

/// One message in a project conversation. Turns are append-only and
/// immutable once created; ids increase in creation order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatTurn {
    pub id: i64,
    pub project_id: String,
    pub sender: TurnSender,
    /// Present only when sender is Agent.
    pub agent_role: Option<AgentRole>,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Heading,
    Paragraph,
    List,
    /// Never produced by the parser; reserved for viewer-rendered content.
    Code,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::List => "list",
            BlockKind::Code => "code",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentBlock {
    pub kind: BlockKind,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocType {
    Meeting,
    Spec,
    Memo,
    Tech,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Meeting => "MEETING",
            DocType::Spec => "SPEC",
            DocType::Memo => "MEMO",
            DocType::Tech => "TECH",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MEETING" => Some(DocType::Meeting),
            "SPEC" => Some(DocType::Spec),
            "MEMO" => Some(DocType::Memo),
            "TECH" => Some(DocType::Tech),
            _ => None,
        }
    }

    pub fn all() -> &'static [DocType] {
        &[DocType::Meeting, DocType::Spec, DocType::Memo, DocType::Tech]
    }
}

pub const DOCUMENT_CONTENT_VERSION: &str = "1.0";

/// Versioned block payload stored as one JSON column per document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentContent {
    pub version: String,
    pub blocks: Vec<DocumentBlock>,
}

impl DocumentContent {
    pub fn new(blocks: Vec<DocumentBlock>) -> Self {
        Self {
            version: DOCUMENT_CONTENT_VERSION.to_string(),
            blocks,
        }
    }
}

/// A document captured from one agent reply. Immutable after creation and
/// never linked back to the originating turn.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Document {
    pub id: i64,
    pub project_id: String,
    pub title: String,
    pub doc_type: DocType,
    pub doc_date: String,
    pub content: DocumentContent,
    pub created_at: String,
}
