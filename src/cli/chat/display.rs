use color_print::cformat;

use crate::model::{ChatMessage, Conversation, DeliveryStatus, Role};

pub const EMPTY_HISTORY: &str = "No messages available.";
pub const TYPING: &str = "Assistant is typing...";

pub fn render_message(message: &ChatMessage) -> String {
    let time = message.received_at.format("%H:%M");
    match (message.role, message.status) {
        (Role::User, DeliveryStatus::Confirmed) => {
            cformat!("<dim>{}</dim> <bold><cyan>User:</cyan></bold> {}", time, message.text)
        }
        (Role::User, DeliveryStatus::Pending) => {
            cformat!(
                "<dim>{}</dim> <bold><cyan>User:</cyan></bold> {} <dim>(sending)</dim>",
                time,
                message.text
            )
        }
        (Role::User, DeliveryStatus::Failed) => {
            cformat!(
                "<dim>{}</dim> <bold><cyan>User:</cyan></bold> {} <red>(failed)</red>",
                time,
                message.text
            )
        }
        (Role::Assistant, _) => {
            cformat!("<dim>{}</dim> <bold><green>AI:</green></bold> {}", time, message.text)
        }
    }
}

/// The whole message window, one line per message.
pub fn render_messages(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return EMPTY_HISTORY.to_string();
    }
    messages
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_conversations(conversations: &[Conversation]) -> String {
    if conversations.is_empty() {
        return "No conversations yet. Type a message to start one.".to_string();
    }
    let mut out = cformat!("<bold>Conversations</bold>");
    for (i, conversation) in conversations.iter().enumerate() {
        out.push('\n');
        let position = format!("{:>2}", i + 1);
        out.push_str(&cformat!(
            "  <yellow>{}</yellow>  {} <dim>({})</dim>",
            position,
            conversation.title,
            conversation.id
        ));
    }
    out
}

pub fn render_error(error: &str) -> String {
    cformat!("<red>{}</red>", error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_labelled() {
        let user = render_message(&ChatMessage::user("hi"));
        let ai = render_message(&ChatMessage::assistant("hello"));

        assert!(user.contains("User:") && user.contains("hi"));
        assert!(ai.contains("AI:") && ai.contains("hello"));
    }

    #[test]
    fn unconfirmed_messages_are_marked() {
        let mut failed = ChatMessage::pending_user("hi");
        assert!(render_message(&failed).contains("(sending)"));

        failed.status = DeliveryStatus::Failed;
        assert!(render_message(&failed).contains("(failed)"));
    }

    #[test]
    fn empty_lists_have_placeholders() {
        assert_eq!(render_messages(&[]), EMPTY_HISTORY);
        assert!(render_conversations(&[]).starts_with("No conversations"));
    }

    #[test]
    fn conversations_are_numbered_from_one() {
        let rendered = render_conversations(&[
            Conversation::new("7", "Greeting"),
            Conversation::new("9", "Recipes"),
        ]);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(" 1") && lines[1].contains("Greeting"));
        assert!(lines[1].contains("(7)"));
        assert!(lines[2].contains(" 2") && lines[2].contains("Recipes"));
    }
}
