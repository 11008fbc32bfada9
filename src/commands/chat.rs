use super::WorkspaceError;
use crate::db::models::{AgentRole, ChatTurn, Project, TurnSender};
use crate::db::Database;
use crate::llm::gemini::GeminiConfig;
use crate::llm::openai::OpenAiConfig;
use crate::llm::{GenerateRequest, Provider, StreamChunk};
use crate::prompt::{build_history, build_system_instruction, DEFAULT_HISTORY_WINDOW};

/// Shown in the transcript when a reply could not be produced. Appended as
/// a regular agent turn; the send is not retried automatically.
pub const FAILED_REPLY_NOTICE: &str =
    "The agent could not reply because the model backend was unreachable. Check the provider settings and send the message again.";

/// Resolve a backend from a model string like "gemini/gemini-2.5-flash",
/// "openai/gpt-4o-mini" or "ollama/llama3". Unprefixed names go to Gemini.
pub fn resolve_provider(model: &str, db: &Database) -> Result<(Provider, String), WorkspaceError> {
    if let Some(model_id) = model.strip_prefix("ollama/") {
        let host = db
            .get_setting("ollama_host")?
            .unwrap_or_else(|| "http://localhost:11434".to_string());
        Ok((Provider::ollama(host), model_id.to_string()))
    } else if let Some(model_id) = model.strip_prefix("openai/") {
        let api_key = db
            .get_setting("openai_api_key")?
            .ok_or_else(|| WorkspaceError::Config("OpenAI API key not configured".into()))?;
        let base_url = db
            .get_setting("openai_base_url")?
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        Ok((
            Provider::OpenAi(OpenAiConfig { api_key, base_url }),
            model_id.to_string(),
        ))
    } else {
        let model_id = model.strip_prefix("gemini/").unwrap_or(model);
        let api_key = db
            .get_setting("gemini_api_key")?
            .ok_or_else(|| WorkspaceError::Config("Gemini API key not configured".into()))?;
        let base_url = db
            .get_setting("gemini_base_url")?
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());
        Ok((
            Provider::Gemini(GeminiConfig { api_key, base_url }),
            model_id.to_string(),
        ))
    }
}

pub fn get_turns(db: &Database, project_id: &str) -> Result<Vec<ChatTurn>, WorkspaceError> {
    Ok(db.list_turns(project_id)?)
}

fn compose_request(
    db: &Database,
    project: &Project,
    role: Option<AgentRole>,
    content: &str,
    model: &str,
) -> Result<(Provider, GenerateRequest), WorkspaceError> {
    let system_instruction = build_system_instruction(&project.ruleset, role);
    let turns = db.list_turns(&project.id)?;
    // The user turn appended just before is the outgoing message, not history
    let prior = &turns[..turns.len().saturating_sub(1)];
    let history = build_history(prior, DEFAULT_HISTORY_WINDOW);
    let (provider, model_id) = resolve_provider(model, db)?;
    tracing::debug!(
        model = %model_id,
        history_len = history.len(),
        instruction_len = system_instruction.len(),
        "composed generation request"
    );
    let request = GenerateRequest {
        model: model_id,
        system_instruction,
        history,
        message: content.to_string(),
    };
    Ok((provider, request))
}

pub async fn send_message(
    db: &Database,
    project_id: &str,
    role_tag: &str,
    content: &str,
    model: &str,
) -> Result<ChatTurn, WorkspaceError> {
    if content.trim().is_empty() {
        return Err(WorkspaceError::InvalidInput(
            "message content is empty".into(),
        ));
    }
    let role = AgentRole::from_str(role_tag);

    // 1. Snapshot the project rules for this turn
    let project = db
        .get_project(project_id)?
        .ok_or_else(|| WorkspaceError::NotFound(format!("project {}", project_id)))?;

    // 2. Save the user turn
    db.append_turn(project_id, TurnSender::User, None, content)?;

    // 3. Compose the instruction and bounded history, then generate
    let outcome = match compose_request(db, &project, role, content, model) {
        Ok((provider, request)) => provider
            .generate(&request)
            .await
            .map(|reply| reply.text)
            .map_err(WorkspaceError::from),
        Err(e) => Err(e),
    };

    // 4. Save the agent turn, or a visible failure notice
    match outcome {
        Ok(text) => Ok(db.append_turn(project_id, TurnSender::Agent, role, &text)?),
        Err(err) => {
            tracing::warn!(error = %err, "reply generation failed");
            db.append_turn(project_id, TurnSender::Agent, role, FAILED_REPLY_NOTICE)?;
            Err(err)
        }
    }
}

/// Same flow as [`send_message`], forwarding deltas to the caller as they
/// arrive. The persisted agent turn carries the full accumulated text.
pub async fn send_message_stream(
    db: &Database,
    project_id: &str,
    role_tag: &str,
    content: &str,
    model: &str,
    on_delta: impl Fn(StreamChunk) + Send,
) -> Result<ChatTurn, WorkspaceError> {
    if content.trim().is_empty() {
        return Err(WorkspaceError::InvalidInput(
            "message content is empty".into(),
        ));
    }
    let role = AgentRole::from_str(role_tag);

    let project = db
        .get_project(project_id)?
        .ok_or_else(|| WorkspaceError::NotFound(format!("project {}", project_id)))?;

    db.append_turn(project_id, TurnSender::User, None, content)?;

    let outcome = match compose_request(db, &project, role, content, model) {
        Ok((provider, request)) => provider
            .generate_stream(&request, on_delta)
            .await
            .map_err(WorkspaceError::from),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(text) => Ok(db.append_turn(project_id, TurnSender::Agent, role, &text)?),
        Err(err) => {
            tracing::warn!(error = %err, "reply generation failed");
            db.append_turn(project_id, TurnSender::Agent, role, FAILED_REPLY_NOTICE)?;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ProjectRuleset;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        (db, dir)
    }

    fn seed_project(db: &Database) -> Project {
        db.create_project(
            "Team",
            &ProjectRuleset {
                tech_stack: vec!["Rust".into()],
                convention: "small modules".into(),
                tone: "direct".into(),
                custom_instructions: String::new(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_provider_prefixes() {
        let (db, _dir) = test_db();
        db.set_setting("gemini_api_key", "k1").unwrap();
        db.set_setting("openai_api_key", "k2").unwrap();

        let (provider, model_id) = resolve_provider("gemini/gemini-2.5-flash", &db).unwrap();
        assert!(matches!(provider, Provider::Gemini(_)));
        assert_eq!(model_id, "gemini-2.5-flash");

        let (provider, model_id) = resolve_provider("openai/gpt-4o-mini", &db).unwrap();
        assert!(matches!(provider, Provider::OpenAi(_)));
        assert_eq!(model_id, "gpt-4o-mini");

        let (provider, model_id) = resolve_provider("ollama/llama3", &db).unwrap();
        assert!(matches!(provider, Provider::Ollama(_)));
        assert_eq!(model_id, "llama3");

        // Unprefixed names go to the default backend
        let (provider, model_id) = resolve_provider("gemini-2.5-pro", &db).unwrap();
        assert!(matches!(provider, Provider::Gemini(_)));
        assert_eq!(model_id, "gemini-2.5-pro");
    }

    #[test]
    fn test_resolve_provider_requires_key() {
        let (db, _dir) = test_db();
        let err = resolve_provider("gemini/gemini-2.5-flash", &db).unwrap_err();
        assert!(matches!(err, WorkspaceError::Config(_)));
    }

    #[tokio::test]
    async fn test_send_message_rejects_empty_content() {
        let (db, _dir) = test_db();
        let project = seed_project(&db);
        let err = send_message(&db, &project.id, "PM", "   ", "gemini/g")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidInput(_)));
        assert!(get_turns(&db, &project.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_unknown_project() {
        let (db, _dir) = test_db();
        let err = send_message(&db, "missing", "PM", "hi", "gemini/g")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_send_leaves_visible_notice() {
        let (db, _dir) = test_db();
        let project = seed_project(&db);
        db.set_setting("gemini_api_key", "test-key").unwrap();
        // A port nothing listens on, so the backend call fails fast
        db.set_setting("gemini_base_url", "http://127.0.0.1:9")
            .unwrap();

        let err = send_message(
            &db,
            &project.id,
            "DEV",
            "write the plan",
            "gemini/gemini-2.5-flash",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkspaceError::Backend(_)));

        let turns = get_turns(&db, &project.id).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].sender, TurnSender::User);
        assert_eq!(turns[0].content, "write the plan");
        assert_eq!(turns[1].sender, TurnSender::Agent);
        assert_eq!(turns[1].agent_role, Some(AgentRole::Dev));
        assert_eq!(turns[1].content, FAILED_REPLY_NOTICE);
    }

    #[tokio::test]
    async fn test_missing_key_also_leaves_notice() {
        let (db, _dir) = test_db();
        let project = seed_project(&db);

        let err = send_message(&db, &project.id, "QA", "hello", "gemini/gemini-2.5-flash")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::Config(_)));

        let turns = get_turns(&db, &project.id).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, FAILED_REPLY_NOTICE);
        // Unknown role tag degrades to no role on the synthesized turn
        assert_eq!(turns[1].agent_role, None);
    }

    #[tokio::test]
    async fn test_stream_failure_also_leaves_notice() {
        let (db, _dir) = test_db();
        let project = seed_project(&db);
        db.set_setting("ollama_host", "http://127.0.0.1:9").unwrap();

        let err = send_message_stream(&db, &project.id, "PM", "hello", "ollama/llama3", |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::Backend(_)));

        let turns = get_turns(&db, &project.id).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, FAILED_REPLY_NOTICE);
    }
}
