//! Ingest command implementation.

use super::{ingest_files, parse_content_type};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(files: &[String], content_type: &str, settings: Settings) -> Result<()> {
    let content_type = parse_content_type(content_type)?;
    let orchestrator = Orchestrator::new(settings)?;

    let results = ingest_files(&orchestrator, files, content_type).await?;

    Output::header("Ingested content");
    for (file, result) in &results {
        let mut summary = format!("{} ({} chunks)", result.content_id, result.chunks_indexed);
        if result.fallback_chunks > 0 {
            summary.push_str(&format!(", {} offline embeddings", result.fallback_chunks));
        }
        Output::kv(file, &summary);
    }

    println!();
    Output::success(&format!(
        "Indexed {} chunks from {} files",
        results.iter().map(|(_, r)| r.chunks_indexed).sum::<usize>(),
        results.len()
    ));
    Output::info("Content is held in memory; use 'lectern serve' to keep it across requests.");

    Ok(())
}
