//! CLI module for Lectern.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Args, Parser, Subcommand};

/// Lectern - study assistant over documents and transcripts
///
/// Chunks and embeds extracted text, answers questions about it with
/// retrieved context, and drafts flashcards and quizzes.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Text files to load as content before running a command.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Extracted text file to use as a source (repeatable)
    #[arg(short, long = "file", required = true)]
    pub files: Vec<String>,

    /// Kind of source the text came from (pdf, youtube)
    #[arg(short = 't', long, default_value = "pdf")]
    pub content_type: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk and embed text files, reporting content ids and chunk counts
    Ingest {
        /// Extracted text files
        #[arg(required = true)]
        files: Vec<String>,

        /// Kind of source the text came from (pdf, youtube)
        #[arg(short = 't', long, default_value = "pdf")]
        content_type: String,
    },

    /// Search a source for chunks similar to a query
    Search {
        /// Search query
        query: String,

        #[command(flatten)]
        sources: SourceArgs,

        /// Maximum number of results per source
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Start an interactive chat over the given sources
    Chat {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Generate flashcards from the given sources
    Flashcards {
        #[command(flatten)]
        sources: SourceArgs,

        /// Print the cards as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a multiple-choice quiz from the given sources
    Quiz {
        #[command(flatten)]
        sources: SourceArgs,

        /// Print the questions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::parse_from([
            "lectern",
            "-vv",
            "search",
            "what is osmosis",
            "--file",
            "a.txt",
            "-f",
            "b.txt",
            "--limit",
            "3",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search { query, sources, limit } => {
                assert_eq!(query, "what is osmosis");
                assert_eq!(sources.files, vec!["a.txt", "b.txt"]);
                assert_eq!(sources.content_type, "pdf");
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_chat_requires_a_file() {
        assert!(Cli::try_parse_from(["lectern", "chat"]).is_err());
    }
}
