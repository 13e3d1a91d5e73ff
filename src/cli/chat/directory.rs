use std::sync::Arc;

use tracing::{debug, error};

use crate::api_client::ChatBackend;
use crate::model::Conversation;

pub const LIST_ERROR: &str = "Failed to load conversations";

/// The sidebar: every conversation the backend knows about for this user.
pub struct ConversationDirectory {
    backend: Arc<dyn ChatBackend>,
    conversations: Vec<Conversation>,
    error: Option<String>,
}

impl ConversationDirectory {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            conversations: Vec::new(),
            error: None,
        }
    }

    /// Fetch the full list. No paging, no retry: on failure the list is
    /// left empty and the error indicator is set.
    pub async fn list(&mut self) -> &[Conversation] {
        let result = self.backend.list_conversations().await;

        match result {
            Ok(conversations) => {
                debug!("Loaded {} conversations", conversations.len());
                self.conversations = conversations;
                self.error = None;
            }
            Err(e) => {
                error!("Failed to fetch conversations: {}", e);
                self.conversations.clear();
                self.error = Some(LIST_ERROR.to_string());
            }
        }
        &self.conversations
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Resolve `selector` and hand the match to `on_select`. Nothing is
    /// fetched here.
    ///
    /// `#id` matches the conversation id only. Anything else is tried as a
    /// 1-based position in the list first, then as an id.
    pub fn select<F, R>(&self, selector: &str, on_select: F) -> Option<R>
    where
        F: FnOnce(Conversation) -> R,
    {
        let selector = selector.trim();
        if let Some(id) = selector.strip_prefix('#') {
            return self
                .conversations
                .iter()
                .find(|c| c.id.as_str() == id.trim())
                .cloned()
                .map(on_select);
        }

        let by_position = selector
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.conversations.get(i));

        by_position
            .or_else(|| self.conversations.iter().find(|c| c.id.as_str() == selector))
            .cloned()
            .map(on_select)
    }

    /// Add a conversation the backend just created so it shows up without
    /// a refetch.
    pub fn remember(&mut self, conversation: Conversation) {
        if self.conversations.iter().any(|c| c.id == conversation.id) {
            return;
        }
        self.conversations.push(conversation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::chat::controller::tests::{backend_down, FakeBackend};

    fn directory_with(conversations: Vec<Conversation>) -> ConversationDirectory {
        let backend = FakeBackend::default();
        *backend.conversations.lock().unwrap() = Some(Ok(conversations));
        ConversationDirectory::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn list_loads_in_backend_order() {
        let mut directory = directory_with(vec![
            Conversation::new("1", "First"),
            Conversation::new("2", "Second"),
        ]);

        let listed = directory.list().await.to_vec();

        assert_eq!(listed[0].title, "First");
        assert_eq!(listed[1].title, "Second");
        assert!(directory.error().is_none());
    }

    #[tokio::test]
    async fn failed_list_stays_empty() {
        let backend = FakeBackend::default();
        *backend.conversations.lock().unwrap() = Some(Err(backend_down("get-conversations/")));
        let mut directory = ConversationDirectory::new(Arc::new(backend));

        assert!(directory.list().await.is_empty());
        assert_eq!(directory.error(), Some(LIST_ERROR));
    }

    #[tokio::test]
    async fn select_resolves_position_or_id() {
        let mut directory = directory_with(vec![
            Conversation::new("10", "Ten"),
            Conversation::new("abc", "Letters"),
        ]);
        directory.list().await;

        assert_eq!(directory.select("1", |c| c.title), Some("Ten".to_string()));
        assert_eq!(directory.select(" abc ", |c| c.title), Some("Letters".to_string()));
        // "10" is not a valid position, so it falls back to the id.
        assert_eq!(directory.select("10", |c| c.title), Some("Ten".to_string()));
    }

    #[tokio::test]
    async fn hash_selects_by_id_only() {
        let mut directory = directory_with(vec![
            Conversation::new("3", "Id three"),
            Conversation::new("7", "Id seven"),
            Conversation::new("1", "Id one"),
        ]);
        directory.list().await;

        // A bare number is a position; "#" forces the id.
        assert_eq!(directory.select("3", |c| c.title), Some("Id one".to_string()));
        assert_eq!(directory.select("#3", |c| c.title), Some("Id three".to_string()));
        assert_eq!(directory.select("# 7", |c| c.title), Some("Id seven".to_string()));
        assert!(directory.select("#2", |c| c.title).is_none());
    }

    #[tokio::test]
    async fn unknown_selector_skips_callback() {
        let mut directory = directory_with(vec![Conversation::new("1", "Only")]);
        directory.list().await;

        let mut called = false;
        assert!(directory.select("0", |_| called = true).is_none());
        assert!(directory.select("missing", |_| called = true).is_none());
        assert!(!called);
    }

    #[test]
    fn remember_skips_duplicates() {
        let mut directory = ConversationDirectory::new(Arc::new(FakeBackend::default()));
        directory.remember(Conversation::new("c1", "Greeting"));
        directory.remember(Conversation::new("c1", "Greeting again"));

        assert_eq!(directory.conversations(), &[Conversation::new("c1", "Greeting")]);
    }
}
