use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use super::conversation_state::SessionState;
use crate::api_client::ChatBackend;
use crate::model::{Conversation, ConversationId, DeliveryStatus};

pub const HISTORY_ERROR: &str = "Error fetching chat history";
pub const SEND_ERROR: &str = "Failed to send message. Please try again.";

/// Title used when the backend creates a conversation without naming it.
const UNTITLED: &str = "New conversation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// History replaced the message list; carries the number of messages.
    Loaded(usize),
    Failed,
    /// Another conversation was selected before the fetch came back.
    Superseded,
    /// Nothing to refresh.
    NoSelection,
    /// A send is in flight; replacing the list now would drop its messages.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    Busy,
    /// History is still loading and would overwrite the message.
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered {
        reply: String,
        /// Set when this send opened a new conversation.
        created: Option<Conversation>,
    },
    Rejected(RejectReason),
    Failed,
    Superseded,
}

/// Owns the active conversation and its messages, and keeps them in step
/// with the backend.
///
/// Every method takes `&self`: calls may interleave the way UI events do,
/// so the state lock is only ever held between awaits.
pub struct SessionController {
    backend: Arc<dyn ChatBackend>,
    state: Mutex<SessionState>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(SessionState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionState {
        self.state().clone()
    }

    pub async fn select_conversation(&self, conversation: Conversation) -> SelectOutcome {
        let id = conversation.id.clone();
        let generation = {
            let mut state = self.state();
            let generation = state.switch_to(Some(conversation));
            state.set_loading(true);
            generation
        };
        info!("Selected conversation {}", id);

        self.load_history(generation, id).await
    }

    /// Re-fetch the active conversation. The result replaces the list.
    pub async fn refresh_history(&self) -> SelectOutcome {
        let (generation, id) = {
            let mut state = self.state();
            let Some(id) = state.selected_id().cloned() else {
                return SelectOutcome::NoSelection;
            };
            if state.is_sending() {
                debug!("Not refreshing {} while a send is in flight", id);
                return SelectOutcome::Busy;
            }
            state.set_loading(true);
            (state.generation(), id)
        };

        self.load_history(generation, id).await
    }

    async fn load_history(&self, generation: u64, id: ConversationId) -> SelectOutcome {
        let result = self.backend.chat_history(&id).await;

        let mut state = self.state();
        if state.generation() != generation {
            debug!("Discarding history for {}: selection changed", id);
            return SelectOutcome::Superseded;
        }
        state.set_loading(false);

        match result {
            Ok(messages) => {
                let count = messages.len();
                state.replace_messages(messages);
                state.set_error(None);
                debug!("Loaded {} messages for {}", count, id);
                SelectOutcome::Loaded(count)
            }
            Err(e) => {
                error!("Error fetching chat history for {}: {}", id, e);
                state.set_error(Some(HISTORY_ERROR.to_string()));
                SelectOutcome::Failed
            }
        }
    }

    pub fn start_new_conversation(&self) {
        self.state().switch_to(None);
        info!("Started a new conversation");
    }

    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Rejected(RejectReason::Empty);
        }

        let (generation, conversation_id, index) = {
            let mut state = self.state();
            if state.is_sending() {
                debug!("Ignoring send while another is in flight");
                return SendOutcome::Rejected(RejectReason::Busy);
            }
            if state.is_loading() {
                debug!("Ignoring send while history is loading");
                return SendOutcome::Rejected(RejectReason::Loading);
            }
            state.set_sending(true);
            let index = state.add_pending_user_message(text);
            (state.generation(), state.selected_id().cloned(), index)
        };

        let result = self
            .backend
            .handle_message(conversation_id.as_ref(), text)
            .await;

        let mut state = self.state();
        state.set_sending(false);
        if state.generation() != generation {
            debug!("Discarding reply: conversation changed while sending");
            return SendOutcome::Superseded;
        }

        match result {
            Ok(reply) => {
                state.mark(index, DeliveryStatus::Confirmed);
                state.add_assistant_message(&reply.response);
                state.set_error(None);

                let created = if conversation_id.is_none() {
                    let conversation = Conversation {
                        id: reply.conversation_id,
                        title: reply.title.unwrap_or_else(|| UNTITLED.to_string()),
                    };
                    info!("Backend opened conversation {}", conversation.id);
                    state.adopt(conversation.clone());
                    Some(conversation)
                } else {
                    None
                };

                SendOutcome::Delivered {
                    reply: reply.response,
                    created,
                }
            }
            Err(e) => {
                error!("Failed to send message: {}", e);
                state.mark(index, DeliveryStatus::Failed);
                state.set_error(Some(SEND_ERROR.to_string()));
                SendOutcome::Failed
            }
        }
    }
}
