//! Export and import of a session as a JSON transcript.
//!
//! Imports are validated in full before anything reaches the store: a file
//! either becomes a typed [`ImportedTranscript`] or an
//! [`AetherError::Import`], never a partially applied session.

use crate::core::{AetherError, ChatMessage, ModelParameters, ParameterUpdate};
use crate::session::{SessionAction, SessionState, SessionStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub model: Option<String>,
    pub parameters: ModelParameters,
    pub messages: Vec<ChatMessage>,
    pub timestamp: DateTime<Utc>,
}

impl Transcript {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            model: state.selected_model.clone(),
            parameters: state.parameters,
            messages: state.messages.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, AetherError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Writes the session to `path`.
pub fn write_to(state: &SessionState, path: &Path) -> Result<(), AetherError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let transcript = Transcript::from_state(state);
    fs::write(path, transcript.to_json()?)?;
    tracing::info!(path = %path.display(), messages = transcript.messages.len(), "exported transcript");
    Ok(())
}

/// Writes the session to `dir/aether-chat-<millis>.json` and returns the path.
pub fn export(state: &SessionState, dir: &Path) -> Result<PathBuf, AetherError> {
    let path = dir.join(format!("aether-chat-{}.json", Utc::now().timestamp_millis()));
    write_to(state, &path)?;
    Ok(path)
}

/// A transcript that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedTranscript {
    pub model: Option<String>,
    pub parameters: Option<ParameterUpdate>,
    pub messages: Vec<ChatMessage>,
}

impl ImportedTranscript {
    /// The actions that load this transcript: clear, re-add every message,
    /// then restore the model and parameters when present.
    pub fn into_actions(self) -> Vec<SessionAction> {
        let mut actions = Vec::with_capacity(self.messages.len() + 3);
        actions.push(SessionAction::ClearMessages);
        actions.extend(self.messages.into_iter().map(SessionAction::AddMessage));
        if let Some(model) = self.model {
            actions.push(SessionAction::SetModel(model));
        }
        if let Some(parameters) = self.parameters.filter(|p| !p.is_empty()) {
            actions.push(SessionAction::UpdateParameters(parameters));
        }
        actions
    }
}

pub fn parse(raw: &str) -> Result<ImportedTranscript, AetherError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AetherError::Import(format!("Invalid JSON: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| AetherError::Import("Expected a JSON object".to_string()))?;

    let messages = parse_messages(object)?;
    let model = match object.get("model") {
        None | Some(Value::Null) => None,
        Some(Value::String(model)) if model.is_empty() => None,
        Some(Value::String(model)) => Some(model.clone()),
        Some(other) => {
            return Err(AetherError::Import(format!(
                "`model` must be a string, got {}",
                other
            )));
        }
    };
    let parameters = match object.get("parameters") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<ParameterUpdate>(raw.clone())
                .map_err(|e| AetherError::Import(format!("Invalid `parameters`: {}", e)))?,
        ),
    };

    Ok(ImportedTranscript {
        model,
        parameters,
        messages,
    })
}

fn parse_messages(object: &Map<String, Value>) -> Result<Vec<ChatMessage>, AetherError> {
    let entries = match object.get("messages") {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(AetherError::Import("`messages` must be a list".to_string())),
        None => return Err(AetherError::Import("Missing `messages`".to_string())),
    };
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            serde_json::from_value::<ChatMessage>(entry.clone())
                .map_err(|e| AetherError::Import(format!("Message {}: {}", i + 1, e)))
        })
        .collect()
}

pub fn read_file(path: &Path) -> Result<ImportedTranscript, AetherError> {
    let raw = fs::read_to_string(path)?;
    parse(&raw)
}

/// Replaces the conversation with the transcript. Returns the number of
/// imported messages.
pub fn import(store: &mut SessionStore, transcript: ImportedTranscript) -> usize {
    let count = transcript.messages.len();
    store.dispatch_all(transcript.into_actions());
    tracing::info!(messages = count, "imported transcript");
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use serde_json::json;
    use tempfile::TempDir;

    fn populated_store() -> SessionStore {
        let mut store = SessionStore::new();
        store.dispatch(SessionAction::SetModel("claude-3-opus".into()));
        store.dispatch(SessionAction::UpdateParameters(ParameterUpdate {
            temperature: Some(1.1),
            max_tokens: Some(900),
            ..Default::default()
        }));
        store.dispatch(SessionAction::AddMessage(ChatMessage::user("question")));
        store.dispatch(SessionAction::AddMessage(ChatMessage::assistant(
            "answer",
            "claude-3-opus",
        )));
        store
    }

    #[test]
    fn export_then_import_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let original = populated_store();
        let path = export(original.state(), temp_dir.path()).unwrap();
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("aether-chat-")
        );

        let mut restored = SessionStore::new();
        restored.dispatch(SessionAction::AddMessage(ChatMessage::user("stale")));
        let imported = read_file(&path).unwrap();
        assert_eq!(import(&mut restored, imported), 2);

        let (a, b) = (original.state(), restored.state());
        assert_eq!(a.selected_model, b.selected_model);
        assert_eq!(a.parameters, b.parameters);
        assert_eq!(a.messages, b.messages);
    }

    #[test]
    fn exported_document_uses_wire_names() {
        let transcript = Transcript::from_state(populated_store().state());
        let value: Value = serde_json::from_str(&transcript.to_json().unwrap()).unwrap();
        assert_eq!(value["model"], json!("claude-3-opus"));
        assert_eq!(value["parameters"]["maxTokens"], json!(900));
        assert_eq!(value["messages"][1]["role"], json!("assistant"));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn unselected_model_exports_as_null() {
        let transcript = Transcript::from_state(&SessionState::default());
        let value: Value = serde_json::from_str(&transcript.to_json().unwrap()).unwrap();
        assert!(value["model"].is_null());
    }

    #[test]
    fn missing_or_non_list_messages_are_rejected() {
        assert!(matches!(parse("{}"), Err(AetherError::Import(_))));
        assert!(matches!(
            parse(r#"{"messages": "nope"}"#),
            Err(AetherError::Import(_))
        ));
        assert!(matches!(parse("[1, 2]"), Err(AetherError::Import(_))));
        assert!(matches!(parse("{not json"), Err(AetherError::Import(_))));
    }

    #[test]
    fn malformed_message_rejects_the_whole_file() {
        let raw = json!({
            "messages": [
                {"id": "1", "role": "user", "content": "ok", "timestamp": "2024-01-01T00:00:00Z"},
                {"id": "2", "role": "robot", "content": "bad", "timestamp": "2024-01-01T00:00:00Z"}
            ]
        })
        .to_string();
        let err = parse(&raw).unwrap_err();
        assert!(err.to_string().contains("Message 2"));

        let mut store = populated_store();
        let before = store.state().clone();
        if let Ok(t) = parse(&raw) {
            import(&mut store, t);
        }
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn model_and_parameters_are_optional() {
        let raw = json!({
            "messages": [
                {"id": "1", "role": "system", "content": "be brief", "timestamp": "2024-01-01T00:00:00Z"}
            ]
        })
        .to_string();
        let imported = parse(&raw).unwrap();
        assert_eq!(imported.model, None);
        assert_eq!(imported.parameters, None);

        let mut store = populated_store();
        import(&mut store, imported);
        let state = store.state();
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].role, Role::System);
        assert_eq!(state.selected_model.as_deref(), Some("claude-3-opus"));
        assert_eq!(state.parameters.max_tokens, 900);
    }

    #[test]
    fn empty_parameter_object_adds_no_update() {
        let raw = json!({"model": null, "parameters": {}, "messages": []}).to_string();
        let actions = parse(&raw).unwrap().into_actions();
        assert_eq!(actions, vec![SessionAction::ClearMessages]);
    }

    #[test]
    fn partial_parameters_merge_on_import() {
        let raw = json!({"model": "gemini-pro", "parameters": {"topP": 0.3}, "messages": []})
            .to_string();
        let mut store = populated_store();
        let generation = store.generation();
        import(&mut store, parse(&raw).unwrap());

        let state = store.state();
        assert!(state.messages.is_empty());
        assert_eq!(state.selected_model.as_deref(), Some("gemini-pro"));
        assert_eq!(state.parameters.top_p, 0.3);
        assert_eq!(state.parameters.temperature, 1.1);
        assert!(store.generation() > generation);
    }
}
