//! Search command implementation.

use super::load_sources;
use crate::cli::{Output, SourceArgs};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    sources: &SourceArgs,
    limit: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let limit = limit.unwrap_or(settings.rag.search_limit);
    let orchestrator = Orchestrator::new(settings)?;
    let content_ids = load_sources(&orchestrator, sources).await?;

    for (file, content_id) in sources.files.iter().zip(&content_ids) {
        let spinner = Output::spinner("Searching...");
        let results = orchestrator.search(content_id, query, limit).await;
        spinner.finish_and_clear();

        let results = match results {
            Ok(results) => results,
            Err(e) => {
                Output::error(&format!("Search failed: {}", e));
                return Err(e.into());
            }
        };

        Output::header(file);
        if results.is_empty() {
            Output::warning("No chunks stored for this source.");
            continue;
        }
        for (rank, chunk) in results.iter().enumerate() {
            Output::search_result(rank + 1, chunk);
        }
    }

    Ok(())
}
