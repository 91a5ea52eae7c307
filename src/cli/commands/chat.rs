//! Interactive chat command with streamed answers.

use super::load_sources;
use crate::cli::{Output, SourceArgs};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::vector_store::ChatTurn;
use anyhow::Result;
use console::style;
use futures::StreamExt;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive chat command.
///
/// The conversation is kept as the chat history of the first source.
pub async fn run_chat(sources: &SourceArgs, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let content_ids = load_sources(&orchestrator, sources).await?;
    let Some(conversation_id) = content_ids.first().cloned() else {
        return Ok(());
    };

    println!("\n{}", style("Lectern Chat").bold().cyan());
    println!("{}\n", style("Ask about your sources, or 'exit' to quit.").dim());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        let history = orchestrator.history(&conversation_id).await?;
        debug!("Sending message with {} prior turns", history.len());

        match stream_answer(&orchestrator, &content_ids, input, &history).await {
            Ok(answer) => {
                orchestrator
                    .record_turn(&conversation_id, ChatTurn::user(input))
                    .await?;
                orchestrator
                    .record_turn(&conversation_id, ChatTurn::assistant(answer))
                    .await?;
            }
            Err(e) => {
                println!();
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

/// Print the answer as it streams in and return the full text.
async fn stream_answer(
    orchestrator: &Orchestrator,
    content_ids: &[String],
    message: &str,
    history: &[ChatTurn],
) -> crate::error::Result<String> {
    let mut segments = orchestrator.chat_segments(content_ids, message, history).await?;
    let mut answer = String::new();

    print!("\n{} ", style("Lectern:").cyan().bold());
    while let Some(segment) = segments.next().await {
        let segment = segment?;
        print!("{}", segment);
        io::stdout().flush()?;
        answer.push_str(&segment);
    }
    println!("\n");

    Ok(answer)
}
