use super::WorkspaceError;
use crate::db::Database;
use crate::llm::ModelInfo;
use std::collections::HashMap;

pub const SETTING_KEYS: &[&str] = &[
    "gemini_api_key",
    "gemini_base_url",
    "openai_api_key",
    "openai_base_url",
    "ollama_host",
    "default_model",
];

pub fn get_settings(db: &Database) -> Result<HashMap<String, String>, WorkspaceError> {
    let mut map = HashMap::new();
    for key in SETTING_KEYS {
        if let Some(value) = db.get_setting(key)? {
            // Mask API keys for display
            if key.ends_with("_api_key") {
                map.insert(key.to_string(), mask_key(&value));
            } else {
                map.insert(key.to_string(), value);
            }
        }
    }
    Ok(map)
}

/// First four and last four characters with the middle elided. Counts chars,
/// not bytes, and returns values of eight chars or fewer whole.
fn mask_key(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return value.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn set_setting(db: &Database, key: &str, value: &str) -> Result<(), WorkspaceError> {
    if !SETTING_KEYS.contains(&key) {
        return Err(WorkspaceError::InvalidInput(format!(
            "unknown setting key: {}",
            key
        )));
    }
    Ok(db.set_setting(key, value)?)
}

pub fn delete_setting(db: &Database, key: &str) -> Result<(), WorkspaceError> {
    Ok(db.delete_setting(key)?)
}

pub fn get_available_models(db: &Database) -> Result<Vec<ModelInfo>, WorkspaceError> {
    let mut models = Vec::new();

    // Gemini models
    if db.get_setting("gemini_api_key")?.is_some() {
        models.extend([
            ModelInfo {
                id: "gemini/gemini-2.5-flash".into(),
                name: "Gemini 2.5 Flash".into(),
                provider: "Google".into(),
            },
            ModelInfo {
                id: "gemini/gemini-2.5-pro".into(),
                name: "Gemini 2.5 Pro".into(),
                provider: "Google".into(),
            },
        ]);
    }

    // OpenAI models
    if db.get_setting("openai_api_key")?.is_some() {
        models.extend([
            ModelInfo {
                id: "openai/gpt-4o".into(),
                name: "GPT-4o".into(),
                provider: "OpenAI".into(),
            },
            ModelInfo {
                id: "openai/gpt-4o-mini".into(),
                name: "GPT-4o Mini".into(),
                provider: "OpenAI".into(),
            },
        ]);
    }

    // Ollama models (always available, local)
    models.extend([
        ModelInfo {
            id: "ollama/llama3".into(),
            name: "Llama 3".into(),
            provider: "Ollama".into(),
        },
        ModelInfo {
            id: "ollama/qwen2.5".into(),
            name: "Qwen 2.5".into(),
            provider: "Ollama".into(),
        },
    ]);

    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        (db, dir)
    }

    #[test]
    fn test_set_setting_rejects_unknown_key() {
        let (db, _dir) = test_db();
        let err = set_setting(&db, "favorite_color", "green").unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidInput(_)));
    }

    #[test]
    fn test_api_keys_are_masked() {
        let (db, _dir) = test_db();
        set_setting(&db, "gemini_api_key", "AIzaSyTestKey1234").unwrap();
        set_setting(&db, "ollama_host", "http://localhost:11434").unwrap();

        let settings = get_settings(&db).unwrap();
        assert_eq!(settings["gemini_api_key"], "AIza...1234");
        assert_eq!(settings["ollama_host"], "http://localhost:11434");
    }

    #[test]
    fn test_masking_handles_multibyte_values() {
        let (db, _dir) = test_db();
        set_setting(&db, "gemini_api_key", "한글비밀키한글비밀키").unwrap();
        set_setting(&db, "openai_api_key", "키키키키키키").unwrap();

        let settings = get_settings(&db).unwrap();
        assert_eq!(settings["gemini_api_key"], "한글비밀...글비밀키");
        assert_eq!(settings["openai_api_key"], "키키키키키키");
    }

    #[test]
    fn test_models_gated_on_configured_keys() {
        let (db, _dir) = test_db();
        let models = get_available_models(&db).unwrap();
        assert!(models.iter().all(|m| m.provider == "Ollama"));

        set_setting(&db, "gemini_api_key", "k").unwrap();
        let models = get_available_models(&db).unwrap();
        assert!(models.iter().any(|m| m.provider == "Google"));
        assert!(!models.iter().any(|m| m.provider == "OpenAI"));
    }
}
