//! Single-in-flight request tracking.
//!
//! A send moves the tracker from `Idle` (or `Settled`) to `Sending`. While a
//! request is outstanding no other may start. Each ticket remembers the store
//! generation it was issued under; if the conversation was cleared or reset
//! in the meantime the reply is dropped rather than appended to a different
//! conversation.

use super::{SessionAction, SessionStore};
use crate::core::{AetherError, ChatMessage};
use crate::transport::ChatRequest;

#[derive(Debug, Clone, PartialEq)]
pub struct RequestTicket {
    id: u64,
    generation: u64,
    prompt: ChatMessage,
}

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The user message this request is carrying.
    pub fn prompt(&self) -> &ChatMessage {
        &self.prompt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The prompt and the reply were appended.
    Delivered,
    /// The conversation moved on before the reply arrived.
    Discarded,
    /// The transport failed; nothing was appended.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    Idle,
    Sending(RequestTicket),
    Settled(Outcome),
}

#[derive(Debug)]
pub struct RequestTracker {
    state: RequestState,
    next_id: u64,
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self {
            state: RequestState::Idle,
            next_id: 1,
        }
    }
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, RequestState::Sending(_))
    }

    /// Starts a request for `prompt` against the current session.
    ///
    /// The prompt must be non-blank and a model must be selected. The returned
    /// request holds the existing history followed by the new user message;
    /// the store itself is not touched until [`RequestTracker::settle`].
    pub fn begin(
        &mut self,
        store: &SessionStore,
        prompt: &str,
    ) -> Result<(RequestTicket, ChatRequest), AetherError> {
        if self.is_sending() {
            return Err(AetherError::RequestInFlight);
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AetherError::Input("Prompt is empty".to_string()));
        }
        let state = store.state();
        let model = state
            .selected_model
            .clone()
            .ok_or_else(|| AetherError::Input("No model selected".to_string()))?;

        let message = ChatMessage::user(prompt);
        let mut messages = state.messages.clone();
        messages.push(message.clone());

        let ticket = RequestTicket {
            id: self.next_id,
            generation: store.generation(),
            prompt: message,
        };
        self.next_id += 1;
        self.state = RequestState::Sending(ticket.clone());

        let request = ChatRequest {
            messages,
            model,
            parameters: state.parameters,
        };
        Ok((ticket, request))
    }

    /// Applies the transport result for `ticket`.
    ///
    /// Transport errors are handed back unchanged after the tracker settles,
    /// so the caller can surface them once.
    pub fn settle(
        &mut self,
        ticket: RequestTicket,
        result: Result<ChatMessage, AetherError>,
        store: &mut SessionStore,
    ) -> Result<Outcome, AetherError> {
        let current = matches!(&self.state, RequestState::Sending(t) if t.id == ticket.id);

        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                if current {
                    self.state = RequestState::Settled(Outcome::Failed);
                }
                return Err(err);
            }
        };

        if !current || ticket.generation != store.generation() {
            tracing::warn!(
                request = ticket.id,
                issued = ticket.generation,
                now = store.generation(),
                "discarding response for a superseded request"
            );
            if current {
                self.state = RequestState::Settled(Outcome::Discarded);
            }
            return Ok(Outcome::Discarded);
        }

        store.dispatch(SessionAction::AddMessage(ticket.prompt));
        store.dispatch(SessionAction::AddMessage(reply));
        self.state = RequestState::Settled(Outcome::Delivered);
        Ok(Outcome::Delivered)
    }
}
