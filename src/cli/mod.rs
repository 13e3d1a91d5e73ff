pub mod chat;

use std::io::Write;
use std::process::ExitCode;

use eyre::Result;
use tracing::info;

use crate::api_client::{ApiClient, ChatBackend};
use crate::config::{AuthToken, ClientConfig, TokenStore};
use crate::error::ClientError;
use crate::model::ConversationId;

use self::chat::display;

/// Build the HTTP backend from the environment and the persisted token.
pub fn connect() -> std::result::Result<ApiClient, ClientError> {
    let config = ClientConfig::from_env()?;
    let token = AuthToken::resolve(&TokenStore::default_location())?;
    ApiClient::new(&config, &token)
}

pub async fn list(output: &mut dyn Write, backend: &dyn ChatBackend) -> Result<ExitCode> {
    let conversations = backend.list_conversations().await?;
    writeln!(output, "{}", display::render_conversations(&conversations))?;
    Ok(ExitCode::SUCCESS)
}

pub async fn history(
    output: &mut dyn Write,
    backend: &dyn ChatBackend,
    id: &str,
) -> Result<ExitCode> {
    let messages = backend.chat_history(&ConversationId::new(id)).await?;
    writeln!(output, "{}", display::render_messages(&messages))?;
    Ok(ExitCode::SUCCESS)
}

pub async fn create(
    output: &mut dyn Write,
    backend: &dyn ChatBackend,
    message: &str,
) -> Result<ExitCode> {
    if message.trim().is_empty() {
        writeln!(output, "Nothing to send.")?;
        return Ok(ExitCode::FAILURE);
    }
    let created = backend.create_conversation(message).await?;
    info!("Created conversation {}", created.conversation_id);
    writeln!(output, "{}", created.response)?;
    match created.title {
        Some(title) => writeln!(
            output,
            "\nconversation: {} ({})",
            created.conversation_id, title
        )?,
        None => writeln!(output, "\nconversation: {}", created.conversation_id)?,
    }
    Ok(ExitCode::SUCCESS)
}

pub fn login(output: &mut dyn Write, store: &TokenStore, token: &str) -> Result<ExitCode> {
    if token.trim().is_empty() {
        writeln!(output, "Token cannot be empty.")?;
        return Ok(ExitCode::FAILURE);
    }
    store.save(token)?;
    writeln!(output, "Token saved to {}", store.path().display())?;
    Ok(ExitCode::SUCCESS)
}
