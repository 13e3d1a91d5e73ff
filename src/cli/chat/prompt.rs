use rustyline::{Config, Editor, Result};

/// `[title] > ` while a conversation is active, `> ` otherwise.
pub fn generate_prompt(conversation_title: Option<&str>) -> String {
    match conversation_title {
        Some(title) => format!("[{}] > ", title),
        None => "> ".to_string(),
    }
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    Editor::with_config(config)
}
