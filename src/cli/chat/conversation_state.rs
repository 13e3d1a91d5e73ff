use crate::model::{ChatMessage, Conversation, ConversationId, DeliveryStatus};

/// Everything the message window renders: which conversation is active and
/// the messages that belong to it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    selected: Option<Conversation>,
    messages: Vec<ChatMessage>,
    error: Option<String>,
    loading: bool,
    sending: bool,
    // Bumped on every switch; in-flight calls compare against it on arrival.
    generation: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&Conversation> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<&ConversationId> {
        self.selected.as_ref().map(|c| &c.id)
    }

    pub fn get_messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Point the session at `conversation` (or at nothing) and drop the
    /// messages of the previous one. Returns the new generation.
    pub(crate) fn switch_to(&mut self, conversation: Option<Conversation>) -> u64 {
        self.selected = conversation;
        self.messages.clear();
        self.error = None;
        self.loading = false;
        self.generation += 1;
        self.generation
    }

    /// Adopt a conversation the backend just created for the current session.
    /// Unlike `switch_to`, this keeps the messages already on screen.
    pub(crate) fn adopt(&mut self, conversation: Conversation) {
        self.selected = Some(conversation);
    }

    pub(crate) fn replace_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Append an unconfirmed user message and return its position.
    pub(crate) fn add_pending_user_message(&mut self, text: &str) -> usize {
        self.messages.push(ChatMessage::pending_user(text));
        self.messages.len() - 1
    }

    pub(crate) fn add_assistant_message(&mut self, text: &str) {
        self.messages.push(ChatMessage::assistant(text));
    }

    pub(crate) fn mark(&mut self, index: usize, status: DeliveryStatus) {
        if let Some(message) = self.messages.get_mut(index) {
            message.status = status;
        }
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn set_sending(&mut self, sending: bool) {
        self.sending = sending;
    }
}
