//! Flashcard and quiz commands.

use super::load_sources;
use crate::cli::{Output, SourceArgs};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the flashcards command.
pub async fn run_flashcards(sources: &SourceArgs, json: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let content_ids = load_sources(&orchestrator, sources).await?;

    let spinner = Output::spinner("Generating flashcards...");
    let cards = orchestrator.generate_flashcards(&content_ids).await;
    spinner.finish_and_clear();
    let cards = cards?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    Output::header(&format!("{} flashcards", cards.len()));
    for (i, card) in cards.iter().enumerate() {
        Output::flashcard(i + 1, card);
    }
    println!();

    Ok(())
}

/// Run the quiz command.
pub async fn run_quiz(sources: &SourceArgs, json: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let content_ids = load_sources(&orchestrator, sources).await?;

    let spinner = Output::spinner("Generating quiz...");
    let questions = orchestrator.generate_quiz(&content_ids).await;
    spinner.finish_and_clear();
    let questions = questions?;

    if json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
        return Ok(());
    }

    Output::header(&format!("{} questions", questions.len()));
    for (i, question) in questions.iter().enumerate() {
        Output::quiz_question(i + 1, question);
    }
    println!();

    Ok(())
}
