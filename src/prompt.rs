use crate::db::models::{AgentRole, ChatTurn, ProjectRuleset, TurnSender};
use crate::llm::ChatMessage;

/// How many prior turns are forwarded to the backend on each send.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

const TECH_STACK_LABEL: &str = "[Tech Stack]";
const CONVENTION_LABEL: &str = "[Convention]";
const TONE_LABEL: &str = "[Tone]";
const CUSTOM_INSTRUCTIONS_LABEL: &str = "[Custom Instructions]";
const ROLE_DIRECTIVE_LABEL: &str = "[Role Directive]";

const PM_DIRECTIVE: &str = "You are the team's project manager. Structure discussion into meeting minutes with decisions and action items, estimate schedules realistically, and capture the intent behind every request.";
const DEV_DIRECTIVE: &str = "You are the team's developer. Keep every suggestion within the declared tech stack above and answer with production-quality code that runs as written.";
const DESIGNER_DIRECTIVE: &str = "You are the team's designer. Put usability first and express styling suggestions as utility classes of the declared UI framework.";
const DEFAULT_DIRECTIVE: &str = "You are a diligent assistant on this team. Follow the project rules above and answer carefully.";

fn role_directive(role: Option<AgentRole>) -> &'static str {
    match role {
        Some(AgentRole::Pm) => PM_DIRECTIVE,
        Some(AgentRole::Dev) => DEV_DIRECTIVE,
        Some(AgentRole::Designer) => DESIGNER_DIRECTIVE,
        None => DEFAULT_DIRECTIVE,
    }
}

/// Build the system instruction for one send: the ruleset fields verbatim,
/// each under its label, followed by the role directive. Empty fields stay
/// empty; an unresolved role gets the default directive. Same inputs always
/// produce the same string.
pub fn build_system_instruction(ruleset: &ProjectRuleset, role: Option<AgentRole>) -> String {
    let sections = [
        format!("{}\n{}", TECH_STACK_LABEL, ruleset.tech_stack.join(", ")),
        format!("{}\n{}", CONVENTION_LABEL, ruleset.convention),
        format!("{}\n{}", TONE_LABEL, ruleset.tone),
        format!(
            "{}\n{}",
            CUSTOM_INSTRUCTIONS_LABEL, ruleset.custom_instructions
        ),
        format!("{}\n{}", ROLE_DIRECTIVE_LABEL, role_directive(role)),
    ];
    sections.join("\n\n")
}

/// Shape the last `window` turns into backend history. User turns map to
/// the "user" role, agent turns to "model"; everything but the text is
/// dropped. Older turns are cut off, never summarized.
pub fn build_history(turns: &[ChatTurn], window: usize) -> Vec<ChatMessage> {
    let start = turns.len().saturating_sub(window);
    turns[start..]
        .iter()
        .map(|t| ChatMessage {
            role: match t.sender {
                TurnSender::User => "user".to_string(),
                TurnSender::Agent => "model".to_string(),
            },
            text: t.content.clone(),
        })
        .collect()
}
