// SPDX-License-Identifier: MIT OR Apache-2.0

//! contexto - Local semantic search over project documentation
//!
//! Indexes a flat docs directory into a JSON embedding index and searches
//! it by cosine similarity.

mod cli;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{AgentProvider, Cli, Commands, OutputFormat};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use contexto::config::Config;
use contexto::indexer::{SyncReport, Watcher};
use contexto::output::{
    colorize_detail, colorize_path, colorize_score, colorize_status, use_colors,
};
use contexto::query::{SearchHit, SearchOptions};
use contexto::utils::resolve_root;
use contexto::{install, DocsIndex};

fn main() -> Result<()> {
    // Initialize tracing with CONTEXTO_LOG env var (e.g., CONTEXTO_LOG=debug contexto index)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CONTEXTO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    match cli.command {
        Commands::Init { path } => {
            let mut index = DocsIndex::open(resolve_root(path.as_deref())?)?;
            let pb = spinner("Initializing documentation index", format);
            let report = index.initialize();
            pb.finish_and_clear();
            let report = report?;

            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => {
                    let layout = index.layout();
                    let use_color = use_colors();
                    if report.created_docs_dir {
                        let docs_dir = layout.docs_dir.display().to_string();
                        println!("Created {}", colorize_path(&docs_dir, use_color));
                    }
                    if report.created_index {
                        let index_path = layout.index_path.display().to_string();
                        println!("Created {}", colorize_path(&index_path, use_color));
                    }
                    print_sync_report(&report.sync);
                }
            }
        }
        Commands::Index { path } => {
            let mut index = DocsIndex::open(resolve_root(path.as_deref())?)?;
            let report = run_sync(&mut index, format)?;
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_sync_report(&report),
            }
        }
        Commands::Search {
            query,
            path,
            max_results,
            min_score,
        } => {
            let mut index = DocsIndex::open(resolve_root(path.as_deref())?)?;
            let mut options = SearchOptions::from_config(index.config().search());
            if let Some(top_k) = max_results {
                options = options.with_top_k(top_k);
            }
            if let Some(min_score) = min_score {
                options = options.with_min_score(min_score);
            }

            let hits = index.search_with(&query, &options)?;
            match format {
                OutputFormat::Json => print_json(&SearchOutput {
                    query: &query,
                    results: &hits,
                })?,
                OutputFormat::Text => print_hits(&query, &hits),
            }
        }
        Commands::Read { file, path } => {
            let index = DocsIndex::open(resolve_root(path.as_deref())?)?;
            let content = index.read_document(&file)?;
            match format {
                OutputFormat::Json => print_json(&ReadOutput {
                    path: &file,
                    content: content.as_deref(),
                })?,
                OutputFormat::Text => match content {
                    Some(content) => print!("{content}"),
                    None => println!("Could not read file: '{file}'."),
                },
            }
        }
        Commands::Create {
            name,
            content,
            file,
            path,
        } => {
            let content = match (content, file) {
                (Some(content), _) => content,
                (None, Some(file)) => std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {file}"))?,
                (None, None) => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read document content from stdin")?;
                    buf
                }
            };

            let mut index = DocsIndex::open(resolve_root(path.as_deref())?)?;
            let pb = spinner("Writing document and reindexing", format);
            let change = index.create_document(&name, &content);
            pb.finish_and_clear();
            let change = change?;

            match format {
                OutputFormat::Json => print_json(&change)?,
                OutputFormat::Text => {
                    let path = change.path.display().to_string();
                    println!("Wrote {}", colorize_path(&path, use_colors()));
                    print_sync_report(&change.sync);
                }
            }
        }
        Commands::Delete { name, path } => {
            let mut index = DocsIndex::open(resolve_root(path.as_deref())?)?;
            let pb = spinner("Deleting document and reindexing", format);
            let change = index.delete_document(&name);
            pb.finish_and_clear();
            let change = change?;

            match format {
                OutputFormat::Json => print_json(&change)?,
                OutputFormat::Text => {
                    let path = change.path.display().to_string();
                    println!("Deleted {}", colorize_path(&path, use_colors()));
                    print_sync_report(&change.sync);
                }
            }
        }
        Commands::Watch { path, debounce } => {
            let mut index = DocsIndex::open(resolve_root(path.as_deref())?)?;
            let layout = index.layout().clone();
            let extensions = index.config().docs().extensions();

            // The watcher needs an existing directory
            std::fs::create_dir_all(&layout.docs_dir)
                .with_context(|| format!("Failed to create {}", layout.docs_dir.display()))?;

            let report = run_sync(&mut index, format)?;
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_sync_report(&report),
            }

            let watcher = Watcher::with_debounce(&layout.docs_dir, &extensions, debounce);
            watcher.watch(|| index.reindex().map_err(Into::into))?;
        }
        Commands::Install { agent, path } => {
            let root = resolve_root(path.as_deref())?;
            let docs_dir = docs_dir_name(&root);
            match agent {
                AgentProvider::Cursor => install::cursor::install(&root, &docs_dir)?,
                AgentProvider::Gemini => install::gemini::install(&root, &docs_dir)?,
            }
        }
        Commands::Uninstall { agent, path } => {
            let root = resolve_root(path.as_deref())?;
            match agent {
                AgentProvider::Cursor => install::cursor::uninstall(&root)?,
                AgentProvider::Gemini => install::gemini::uninstall(&root)?,
            }
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "contexto", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    results: &'a [SearchHit],
}

#[derive(Serialize)]
struct ReadOutput<'a> {
    path: &'a str,
    content: Option<&'a str>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Spinner on stderr; hidden for JSON output and non-terminal stderr.
fn spinner(message: &str, format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn run_sync(index: &mut DocsIndex, format: OutputFormat) -> Result<SyncReport> {
    let pb = spinner("Indexing documentation", format);
    let report = index.reindex();
    pb.finish_and_clear();
    Ok(report?)
}

fn print_sync_report(report: &SyncReport) {
    let use_color = use_colors();
    let text = report.to_string();
    let mut lines = text.lines();
    if let Some(status) = lines.next() {
        println!("{}", colorize_status(status, use_color));
    }
    for line in lines {
        println!("{}", colorize_detail(&line, use_color));
    }
}

fn print_hits(query: &str, hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No matches found for the query: '{query}'.");
        return;
    }

    let use_color = use_colors();
    for hit in hits {
        println!(
            "{}  {}",
            colorize_score(hit.score, use_color),
            colorize_path(&hit.path, use_color)
        );
    }
}

fn docs_dir_name(root: &Path) -> String {
    Config::load(root).docs().dir().to_string()
}
