// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use contexto::indexer::watch::DEFAULT_DEBOUNCE_SECS;

/// contexto - Local semantic search over project documentation
///
/// Keeps an embedding index of a flat docs directory in sync and answers
/// natural language queries against it.
#[derive(Parser, Debug)]
#[command(name = "contexto")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Agent for install/uninstall commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AgentProvider {
    Cursor,
    Gemini,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the docs directory and an empty index, then index
    Init {
        /// Project root (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Synchronize the index with the docs directory
    #[command(alias = "reindex")]
    Index {
        /// Project root (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Search documentation with a natural language query
    #[command(alias = "s")]
    Search {
        /// Search query
        query: String,

        /// Project root (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,

        /// Maximum number of results
        #[arg(short = 'm', long = "max-results")]
        max_results: Option<usize>,

        /// Minimum similarity score (exclusive)
        #[arg(long)]
        min_score: Option<f32>,
    },

    /// Print a file
    Read {
        /// File path, relative to the project root
        file: String,

        /// Project root (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Create or replace a document, then reindex
    Create {
        /// Document name; the default extension is added when missing
        name: String,

        /// Document content
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,

        /// Read content from a file
        #[arg(short, long)]
        file: Option<String>,

        /// Project root (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Delete a document, then reindex
    Delete {
        /// Document name; the default extension is added when missing
        name: String,

        /// Project root (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Watch the docs directory and reindex on changes
    Watch {
        /// Project root (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,

        /// Debounce interval in seconds
        #[arg(long, default_value_t = DEFAULT_DEBOUNCE_SECS)]
        debounce: u64,
    },

    /// Install contexto rules for an AI agent
    Install {
        #[arg(value_enum)]
        agent: AgentProvider,

        /// Project root (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Remove contexto rules for an AI agent
    Uninstall {
        #[arg(value_enum)]
        agent: AgentProvider,

        /// Project root (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
