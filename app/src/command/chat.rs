//! Chat with the configured workflow, interactively or one message at a time.

use chatembed_config::WidgetConfig;
use chatembed_conversation::{ConversationController, ConversationError};
use chatembed_core::{Message, Sender};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use super::{build_controller, load_config};

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    pub config_path: Option<PathBuf>,
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = load_config(input.config_path.as_deref())?;
        let controller = build_controller(&config)?;

        controller.initialize().await;

        if let Some(msg) = input.message {
            let reply = controller.submit(&msg).await?;
            print_message(&reply);
            return Ok(());
        }

        run_interactive(&controller, &config.widget).await?;

        info!(
            "Conversation ended: {} total messages",
            controller.transcript().len()
        );
        Ok(())
    }
}

async fn run_interactive(
    controller: &ConversationController,
    widget: &WidgetConfig,
) -> anyhow::Result<()> {
    println!("=== {} ===", widget.title);
    println!("Type 'exit', 'quit', or Ctrl+C to end, '/reset' to start a new session.\n");

    let transcript = controller.transcript();
    if transcript.is_empty() {
        println!("Start a conversation!\n");
    } else {
        transcript.iter().for_each(print_message);
        println!();
    }

    loop {
        print!("{} > ", widget.placeholder);
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if matches!(input, "exit" | "quit" | "q") {
            break;
        }
        if input == "/reset" {
            controller.reset_session().await;
            println!("Session reset.\n");
            continue;
        }

        match controller.submit(input).await {
            Ok(reply) => {
                print_message(&reply);
                println!();
            }
            Err(ConversationError::EmptyInput) => {}
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    Ok(())
}

fn print_message(message: &Message) {
    let who = if message.is_from(Sender::User) { "You" } else { "Bot" };
    if message.error {
        println!("{who} ⚠ {}", message.text);
    } else {
        println!("{who}: {}", message.text);
    }
}
