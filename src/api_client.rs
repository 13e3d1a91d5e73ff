use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use url::Url;

use crate::config::{AuthToken, ClientConfig};
use crate::error::{ClientError, Result};
use crate::model::{ChatMessage, Conversation, ConversationId, CreatedConversation, MessageReply};

/// The backend operations the chat front end relies on.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// Send `input_message` to an existing conversation, or let the backend
    /// open a new one when `conversation_id` is `None`.
    async fn handle_message(
        &self,
        conversation_id: Option<&ConversationId>,
        input_message: &str,
    ) -> Result<MessageReply>;

    async fn create_conversation(&self, initial_message: &str) -> Result<CreatedConversation>;

    async fn chat_history(&self, conversation_id: &ConversationId) -> Result<Vec<ChatMessage>>;
}

pub struct ApiClient {
    base_url: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, token: &AuthToken) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Token {}", token.as_str()))
            .map_err(|_| ClientError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ClientError::Builder)?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        Self::read_json(path, response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!("POST {} {}", url, body);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        Self::read_json(path, response).await
    }

    async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(|source| ClientError::Transport {
            endpoint: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            error!("{} failed with status {}: {}", path, status, body);
            return Err(ClientError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        debug!("Received response from {}: {}", path, body);
        serde_json::from_str(&body).map_err(|e| ClientError::malformed(path, e.to_string()))
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.get_json("get-conversations/").await
    }

    async fn handle_message(
        &self,
        conversation_id: Option<&ConversationId>,
        input_message: &str,
    ) -> Result<MessageReply> {
        let body = json!({
            "conversation_id": conversation_id,
            "input_message": input_message,
        });
        self.post_json("handle-message/", &body).await
    }

    async fn create_conversation(&self, initial_message: &str) -> Result<CreatedConversation> {
        let body = json!({ "initial_message": initial_message });
        self.post_json("create-conversation/", &body).await
    }

    async fn chat_history(&self, conversation_id: &ConversationId) -> Result<Vec<ChatMessage>> {
        let path = format!("chat-history/{}/", conversation_id);
        let payload: Value = self.get_json(&path).await?;
        messages_from_history(&path, &payload)
    }
}

/// The backend reports failures as `{"error": "..."}`; anything else is
/// passed through as-is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Adapt a chat-history payload into the canonical message list.
///
/// Two entry shapes are in circulation: a flat turn `{user_response,
/// ai_response}` and a single message `{sender, message}`. Both are
/// flattened here so nothing past this point has to know about them.
pub(crate) fn messages_from_history(endpoint: &str, payload: &Value) -> Result<Vec<ChatMessage>> {
    let entries = payload
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| ClientError::malformed(endpoint, "messages is not an array"))?;

    let mut messages = Vec::with_capacity(entries.len() * 2);
    for (index, entry) in entries.iter().enumerate() {
        let adapted = adapt_entry(entry);
        if adapted.is_empty() {
            warn!("Skipping unrecognised history entry {}: {}", index, entry);
        }
        messages.extend(adapted);
    }
    Ok(messages)
}

fn adapt_entry(entry: &Value) -> Vec<ChatMessage> {
    let Some(obj) = entry.as_object() else {
        return Vec::new();
    };

    if obj.contains_key("user_response") || obj.contains_key("ai_response") {
        let mut turn = Vec::with_capacity(2);
        if let Some(text) = obj.get("user_response").and_then(text_of) {
            turn.push(ChatMessage::user(text));
        }
        if let Some(text) = obj.get("ai_response").and_then(text_of) {
            turn.push(ChatMessage::assistant(text));
        }
        return turn;
    }

    if let Some(text) = obj.get("message").and_then(text_of) {
        let from_user = obj.get("sender").and_then(Value::as_str) == Some("user");
        return vec![if from_user {
            ChatMessage::user(text)
        } else {
            ChatMessage::assistant(text)
        }];
    }

    Vec::new()
}

// Some rows store the text wrapped in a single-element array.
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Array(items) => items.first()?.as_str()?,
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
