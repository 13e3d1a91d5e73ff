mod api_client;
mod cli;
mod config;
mod error;
mod model;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::ChatContext;
use crate::config::TokenStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Send a single message and print the reply
    #[arg(short, long)]
    input: Option<String>,

    /// Conversation to send the message to (default: start a new one)
    #[arg(short, long)]
    conversation: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat {
        /// Send a single message and print the reply
        #[arg(short, long)]
        input: Option<String>,

        /// Conversation to send the message to
        #[arg(short, long)]
        conversation: Option<String>,
    },
    /// List your conversations
    List,
    /// Print the messages of a conversation
    History {
        /// Conversation id
        id: String,
    },
    /// Create a conversation from an initial message
    Create {
        message: String,
    },
    /// Save the auth token used for every request
    Login {
        #[arg(short, long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting chatbot CLI");

    let mut stdout = io::stdout();

    // Login is the only command that can run without a token.
    if let Some(Commands::Login { token }) = &cli.command {
        return cli::login(&mut stdout, &TokenStore::default_location(), token);
    }

    let backend = match cli::connect() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to initialize backend client: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    match cli.command {
        Some(Commands::Chat { input, conversation }) => {
            let mut chat_context =
                ChatContext::new(Box::new(stdout), backend, input, conversation, true);
            chat_context.run().await
        }
        Some(Commands::List) => cli::list(&mut stdout, backend.as_ref()).await,
        Some(Commands::History { id }) => cli::history(&mut stdout, backend.as_ref(), &id).await,
        Some(Commands::Create { message }) => {
            cli::create(&mut stdout, backend.as_ref(), &message).await
        }
        Some(Commands::Login { .. }) => Ok(ExitCode::SUCCESS),
        None => {
            // Default to chat if no subcommand is provided
            let mut chat_context =
                ChatContext::new(Box::new(stdout), backend, cli.input, cli.conversation, true);
            chat_context.run().await
        }
    }
}
