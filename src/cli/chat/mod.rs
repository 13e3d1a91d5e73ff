pub mod command;
pub mod controller;
pub mod conversation_state;
pub mod directory;
pub mod display;
pub mod prompt;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use command::Command;
use controller::{RejectReason, SendOutcome, SessionController};
use crossterm::{cursor, execute, terminal};
use directory::ConversationDirectory;
use eyre::Result;
use prompt::generate_prompt;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::api_client::ChatBackend;
use crate::model::{Conversation, Role};

const WELCOME_TEXT: &str = "
Hi, I'm your chat assistant. Type a message to start a new conversation,
or open one of your existing conversations.

/list         List your conversations
/open <n|#id> Open a conversation
/new          Start a new conversation
/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
Chatbot CLI

/list         Reload and list your conversations
/open <n|#id> Open a conversation by its number in the list, or by id
              with #id (a bare number is always a list position first)
/new          Start a new conversation
/history      Reload the messages of the current conversation
/clear        Clear the screen
/help         Show this help dialogue
/quit         Quit the application

Anything else is sent as a message to the current conversation.
";

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    conversation: Option<String>,
    interactive: bool,
    directory: ConversationDirectory,
    controller: SessionController,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        backend: Arc<dyn ChatBackend>,
        input: Option<String>,
        conversation: Option<String>,
        interactive: bool,
    ) -> Self {
        Self {
            output,
            input,
            conversation,
            interactive,
            directory: ConversationDirectory::new(backend.clone()),
            controller: SessionController::new(backend),
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Handle non-interactive mode (single message)
        if let Some(input) = self.input.take() {
            return self.run_once(&input).await;
        }

        if self.interactive {
            self.print_welcome()?;
            self.show_directory().await?;
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        Ok(())
    }

    async fn run_once(&mut self, input: &str) -> Result<ExitCode> {
        if let Some(id) = self.conversation.take() {
            self.controller
                .select_conversation(Conversation::new(id.clone(), id))
                .await;
        }

        match self.controller.send_message(input).await {
            SendOutcome::Delivered { reply, .. } => {
                writeln!(self.output, "{}", reply)?;
                if let Some(conversation) = self.controller.snapshot().selected() {
                    writeln!(self.output, "\nconversation: {}", conversation.id)?;
                }
                Ok(ExitCode::SUCCESS)
            }
            SendOutcome::Rejected(RejectReason::Empty) => {
                writeln!(self.output, "Nothing to send.")?;
                Ok(ExitCode::FAILURE)
            }
            _ => {
                writeln!(self.output, "{}", controller::SEND_ERROR)?;
                Ok(ExitCode::FAILURE)
            }
        }
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let title = self
                .controller
                .snapshot()
                .selected()
                .map(|c| c.title.clone());
            let prompt_text = generate_prompt(title.as_deref());

            match rl.readline(&prompt_text) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    match self.handle_input(&line).await {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => writeln!(self.output, "Error: {}", e)?,
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    async fn handle_input(&mut self, input: &str) -> Result<bool> {
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(message) => {
                writeln!(self.output, "{}", message)?;
                return Ok(false);
            }
        };
        debug!("Handling {:?}", command);

        match command {
            Command::Send(text) => self.send(&text).await?,
            Command::List => self.show_directory().await?,
            Command::Open(selector) => self.open(&selector).await?,
            Command::New => {
                self.controller.start_new_conversation();
                writeln!(self.output, "Started a new conversation.")?;
            }
            Command::History => {
                self.controller.refresh_history().await;
                self.show_session()?;
            }
            Command::Clear => {
                execute!(
                    self.output,
                    terminal::Clear(terminal::ClearType::All),
                    cursor::MoveTo(0, 0)
                )?;
            }
            Command::Help => writeln!(self.output, "{}", HELP_TEXT)?,
            Command::Quit => return Ok(true),
        }

        Ok(false)
    }

    async fn show_directory(&mut self) -> Result<()> {
        self.directory.list().await;
        match self.directory.error() {
            Some(error) => writeln!(self.output, "{}", display::render_error(error))?,
            None => writeln!(
                self.output,
                "{}",
                display::render_conversations(self.directory.conversations())
            )?,
        }
        Ok(())
    }

    async fn open(&mut self, selector: &str) -> Result<()> {
        let found = {
            let controller = &self.controller;
            match self
                .directory
                .select(selector, |conversation| controller.select_conversation(conversation))
            {
                Some(loading) => {
                    loading.await;
                    true
                }
                None => false,
            }
        };

        if found {
            self.show_session()
        } else {
            writeln!(self.output, "No conversation matches '{}'. Try /list.", selector)?;
            Ok(())
        }
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        if !text.trim().is_empty() {
            writeln!(self.output, "{}", display::TYPING)?;
        }

        match self.controller.send_message(text).await {
            SendOutcome::Delivered { created, .. } => {
                if let Some(conversation) = created {
                    writeln!(
                        self.output,
                        "Started conversation '{}' ({}).",
                        conversation.title, conversation.id
                    )?;
                    self.directory.remember(conversation);
                }
                let state = self.controller.snapshot();
                if let Some(reply) = state
                    .get_messages()
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::Assistant)
                {
                    writeln!(self.output, "{}", display::render_message(reply))?;
                }
            }
            SendOutcome::Rejected(RejectReason::Busy) => {
                writeln!(self.output, "Still waiting for the previous reply.")?;
            }
            SendOutcome::Rejected(RejectReason::Loading) => {
                writeln!(self.output, "Still loading this conversation, try again.")?;
            }
            SendOutcome::Rejected(RejectReason::Empty) | SendOutcome::Superseded => {}
            SendOutcome::Failed => {
                writeln!(self.output, "{}", display::render_error(controller::SEND_ERROR))?;
            }
        }

        Ok(())
    }

    fn show_session(&mut self) -> Result<()> {
        let state = self.controller.snapshot();
        if let Some(conversation) = state.selected() {
            writeln!(self.output, "== {} ==", conversation.title)?;
        }
        match state.error() {
            Some(error) => writeln!(self.output, "{}", display::render_error(error))?,
            None => writeln!(self.output, "{}", display::render_messages(state.get_messages()))?,
        }
        Ok(())
    }
}
