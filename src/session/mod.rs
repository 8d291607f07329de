//! Conversation state and the closed set of actions that change it.
//!
//! [`SessionState`] is only ever advanced through [`SessionState::apply`],
//! a pure reducer. [`SessionStore`] wraps it for the rest of the client:
//! every mutation goes through [`SessionStore::dispatch`], which records the
//! action so the state can be rebuilt with [`SessionState::replay`].

pub mod request;

use crate::core::{ChatMessage, ModelParameters, ParameterUpdate};

pub use request::{Outcome, RequestState, RequestTicket, RequestTracker};

/// The live conversation of one client session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub selected_model: Option<String>,
    pub parameters: ModelParameters,
    pub messages: Vec<ChatMessage>,
    pub current_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    SetModel(String),
    UpdateParameters(ParameterUpdate),
    AddMessage(ChatMessage),
    ClearMessages,
    SetTemplate(Option<String>),
    ResetSession,
}

impl SessionAction {
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::SetModel(_) => "set_model",
            SessionAction::UpdateParameters(_) => "update_parameters",
            SessionAction::AddMessage(_) => "add_message",
            SessionAction::ClearMessages => "clear_messages",
            SessionAction::SetTemplate(_) => "set_template",
            SessionAction::ResetSession => "reset_session",
        }
    }

    /// Actions after which an outstanding response no longer belongs to the
    /// conversation.
    fn invalidates_requests(&self) -> bool {
        matches!(
            self,
            SessionAction::ClearMessages | SessionAction::ResetSession
        )
    }
}

impl SessionState {
    /// Returns the state that follows `action`. Never fails.
    pub fn apply(self, action: SessionAction) -> Self {
        match action {
            SessionAction::SetModel(model) => Self {
                selected_model: Some(model),
                ..self
            },
            SessionAction::UpdateParameters(update) => Self {
                parameters: self.parameters.merged(&update),
                ..self
            },
            SessionAction::AddMessage(message) => {
                let mut messages = self.messages;
                messages.push(message);
                Self { messages, ..self }
            }
            SessionAction::ClearMessages => Self {
                messages: Vec::new(),
                ..self
            },
            SessionAction::SetTemplate(template) => Self {
                current_template: template,
                ..self
            },
            SessionAction::ResetSession => Self::default(),
        }
    }

    /// Folds `actions` over the initial state.
    pub fn replay<I>(actions: I) -> Self
    where
        I: IntoIterator<Item = SessionAction>,
    {
        actions.into_iter().fold(Self::default(), Self::apply)
    }
}

/// Single owner of the session state.
#[derive(Debug, Default)]
pub struct SessionStore {
    state: SessionState,
    journal: Vec<SessionAction>,
    generation: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Every action dispatched so far, oldest first.
    pub fn journal(&self) -> &[SessionAction] {
        &self.journal
    }

    /// Bumped whenever the message list is cleared or the session reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dispatch(&mut self, action: SessionAction) {
        tracing::debug!(action = action.name(), generation = self.generation, "dispatch");
        if action.invalidates_requests() {
            self.generation += 1;
        }
        self.journal.push(action.clone());
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(action);
    }

    pub fn dispatch_all<I>(&mut self, actions: I)
    where
        I: IntoIterator<Item = SessionAction>,
    {
        for action in actions {
            self.dispatch(action);
        }
    }

    /// Messages whose content or role contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&ChatMessage> {
        self.state
            .messages
            .iter()
            .filter(|message| message.matches(query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;

    fn temperature(value: f64) -> SessionAction {
        SessionAction::UpdateParameters(ParameterUpdate {
            temperature: Some(value),
            ..Default::default()
        })
    }

    #[test]
    fn initial_state_uses_fixed_defaults() {
        let state = SessionState::default();
        assert_eq!(state.selected_model, None);
        assert_eq!(state.parameters.temperature, 0.7);
        assert_eq!(state.parameters.max_tokens, 2048);
        assert_eq!(state.parameters.top_p, 1.0);
        assert_eq!(state.parameters.frequency_penalty, 0.0);
        assert_eq!(state.parameters.presence_penalty, 0.0);
        assert!(state.messages.is_empty());
        assert_eq!(state.current_template, None);
    }

    #[test]
    fn parameter_updates_merge() {
        let mut store = SessionStore::new();
        store.dispatch(temperature(1.2));
        store.dispatch(SessionAction::UpdateParameters(ParameterUpdate {
            max_tokens: Some(500),
            ..Default::default()
        }));

        let params = store.state().parameters;
        assert_eq!(params.temperature, 1.2);
        assert_eq!(params.max_tokens, 500);
        assert_eq!(params.top_p, 1.0);
    }

    #[test]
    fn out_of_range_parameters_pass_through() {
        let mut store = SessionStore::new();
        store.dispatch(temperature(7.5));
        assert_eq!(store.state().parameters.temperature, 7.5);
    }

    #[test]
    fn clear_messages_keeps_model_and_parameters() {
        let mut store = SessionStore::new();
        store.dispatch(SessionAction::SetModel("gpt-4-turbo".into()));
        store.dispatch(temperature(0.2));
        store.dispatch(SessionAction::SetTemplate(Some("code-review".into())));
        store.dispatch(SessionAction::AddMessage(ChatMessage::user("one")));
        store.dispatch(SessionAction::AddMessage(ChatMessage::user("two")));
        store.dispatch(SessionAction::ClearMessages);

        let state = store.state();
        assert!(state.messages.is_empty());
        assert_eq!(state.selected_model.as_deref(), Some("gpt-4-turbo"));
        assert_eq!(state.parameters.temperature, 0.2);
        assert_eq!(state.current_template.as_deref(), Some("code-review"));
    }

    #[test]
    fn messages_keep_insertion_order_and_duplicates() {
        let mut store = SessionStore::new();
        let first = ChatMessage::user("first");
        let second = ChatMessage::assistant("second", "gemini-pro");
        store.dispatch(SessionAction::AddMessage(first.clone()));
        store.dispatch(SessionAction::AddMessage(second.clone()));
        store.dispatch(SessionAction::AddMessage(first.clone()));

        let messages = &store.state().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], first);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[2].id, first.id);
    }

    #[test]
    fn reset_restores_defaults_after_any_history() {
        let mut store = SessionStore::new();
        store.dispatch(SessionAction::SetModel("claude-3-opus".into()));
        store.dispatch(temperature(1.9));
        store.dispatch(SessionAction::AddMessage(ChatMessage::user("hello")));
        store.dispatch(SessionAction::SetTemplate(Some("dangling".into())));
        store.dispatch(SessionAction::ResetSession);

        assert_eq!(store.state(), &SessionState::default());
    }

    #[test]
    fn template_can_be_cleared() {
        let state = SessionState::default()
            .apply(SessionAction::SetTemplate(Some("learning-tutor".into())))
            .apply(SessionAction::SetTemplate(None));
        assert_eq!(state.current_template, None);
    }

    #[test]
    fn journal_replays_to_the_same_state() {
        let mut store = SessionStore::new();
        store.dispatch(SessionAction::SetModel("mistral-large".into()));
        store.dispatch(SessionAction::AddMessage(ChatMessage::user("a")));
        store.dispatch(SessionAction::ClearMessages);
        store.dispatch(SessionAction::AddMessage(ChatMessage::user("b")));
        store.dispatch(temperature(0.1));

        let replayed = SessionState::replay(store.journal().to_vec());
        assert_eq!(&replayed, store.state());
    }

    #[test]
    fn generation_moves_on_clear_and_reset_only() {
        let mut store = SessionStore::new();
        assert_eq!(store.generation(), 0);
        store.dispatch(SessionAction::AddMessage(ChatMessage::user("a")));
        store.dispatch(SessionAction::SetModel("gemini-pro".into()));
        assert_eq!(store.generation(), 0);
        store.dispatch(SessionAction::ClearMessages);
        assert_eq!(store.generation(), 1);
        store.dispatch(SessionAction::ResetSession);
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn search_filters_by_content_or_role() {
        let mut store = SessionStore::new();
        store.dispatch(SessionAction::AddMessage(ChatMessage::user("Tell me about Rust")));
        store.dispatch(SessionAction::AddMessage(ChatMessage::assistant(
            "Rust is a systems language",
            "gpt-4-turbo",
        )));
        store.dispatch(SessionAction::AddMessage(ChatMessage::user("thanks")));

        assert_eq!(store.search("rust").len(), 2);
        assert_eq!(store.search("ASSISTANT").len(), 1);
        assert_eq!(store.search("").len(), 3);
        assert!(store.search("python").is_empty());
    }
}
