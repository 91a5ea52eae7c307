//! CLI command implementations.

mod chat;
mod config;
mod ingest;
mod search;
mod serve;
mod study;

pub use chat::run_chat;
pub use config::run_config;
pub use ingest::run_ingest;
pub use search::run_search;
pub use serve::run_serve;
pub use study::{run_flashcards, run_quiz};

use crate::cli::{Output, SourceArgs};
use crate::config::Settings;
use crate::orchestrator::{IngestResult, Orchestrator};
use crate::vector_store::ContentType;
use anyhow::{Context, Result};

/// Parse a `--content-type` value.
fn parse_content_type(value: &str) -> Result<ContentType> {
    value.parse::<ContentType>().map_err(anyhow::Error::msg)
}

/// Read each file and ingest it as new content, in order.
async fn ingest_files(
    orchestrator: &Orchestrator,
    files: &[String],
    content_type: ContentType,
) -> Result<Vec<(String, IngestResult)>> {
    let pb = Output::progress_bar(files.len() as u64, "Ingesting");
    let mut results = Vec::with_capacity(files.len());

    for file in files {
        let path = Settings::expand_path(file);
        pb.set_message(file.clone());

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let result = orchestrator.ingest_content(content_type, &text).await?;

        results.push((file.clone(), result));
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(results)
}

/// Ingest the command's source files and return their content ids.
async fn load_sources(orchestrator: &Orchestrator, sources: &SourceArgs) -> Result<Vec<String>> {
    let content_type = parse_content_type(&sources.content_type)?;
    let results = ingest_files(orchestrator, &sources.files, content_type).await?;

    for (_, result) in &results {
        if result.fallback_chunks > 0 {
            Output::warning(&format!(
                "{} chunks of {} were embedded offline; results may be less relevant",
                result.fallback_chunks, result.content_id
            ));
        }
    }

    Ok(results.into_iter().map(|(_, r)| r.content_id).collect())
}
