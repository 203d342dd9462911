// SPDX-License-Identifier: MIT OR Apache-2.0

//! Docs directory watcher for incremental index updates with debouncing

use anyhow::{Context, Result};
use colored::Colorize;
use notify::{
    Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::indexer::scanner::is_supported_name;
use crate::indexer::sync::SyncReport;

/// Default debounce interval in seconds
pub const DEFAULT_DEBOUNCE_SECS: u64 = 2;

/// Minimum time between reindex operations
const MIN_REINDEX_INTERVAL_SECS: u64 = 2;

/// Docs directory watcher with debouncing
pub struct Watcher {
    docs_dir: PathBuf,
    extensions: Vec<String>,
    debounce_duration: Duration,
    min_reindex_interval: Duration,
}

impl Watcher {
    /// Create watcher with custom debounce interval
    pub fn with_debounce(
        docs_dir: impl AsRef<Path>,
        extensions: &[String],
        debounce_secs: u64,
    ) -> Self {
        Self {
            docs_dir: docs_dir.as_ref().to_path_buf(),
            extensions: extensions.to_vec(),
            debounce_duration: Duration::from_secs(debounce_secs),
            min_reindex_interval: Duration::from_secs(MIN_REINDEX_INTERVAL_SECS.max(debounce_secs)),
        }
    }

    /// Watch the docs directory and call `reindex` once changes settle.
    ///
    /// Reindex failures are reported and the watch continues.
    pub fn watch<F>(&self, mut reindex: F) -> Result<()>
    where
        F: FnMut() -> Result<SyncReport>,
    {
        let (tx, rx) = channel();

        let config = NotifyConfig::default().with_poll_interval(Duration::from_secs(2));

        let mut watcher = RecommendedWatcher::new(tx, config)?;
        watcher
            .watch(&self.docs_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", self.docs_dir.display()))?;

        println!("{} Watching {} for changes...", "👁".cyan(), self.docs_dir.display());
        println!("  Debounce: {}s", self.debounce_duration.as_secs());
        println!("Press Ctrl+C to stop\n");

        let mut pending_paths: HashSet<PathBuf> = HashSet::new();
        let mut last_event_time: Option<Instant> = None;
        let mut last_reindex_time: Option<Instant> = None;

        loop {
            let timeout = if pending_paths.is_empty() {
                Duration::from_secs(60)
            } else {
                self.debounce_duration
            };

            match rx.recv_timeout(timeout) {
                Ok(Ok(event)) => {
                    let relevant = relevant_paths(&event, &self.extensions);
                    if !relevant.is_empty() {
                        tracing::debug!("Change event {:?} for {:?}", event.kind, relevant);
                        pending_paths.extend(relevant);
                        last_event_time = Some(Instant::now());
                    }
                }
                Ok(Err(e)) => {
                    eprintln!("{} Watch error: {}", "✗".red(), e);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    break;
                }
            }

            if pending_paths.is_empty() {
                continue;
            }

            let settled = last_event_time
                .map(|t| t.elapsed() >= self.debounce_duration)
                .unwrap_or(false);
            let can_reindex = last_reindex_time
                .map(|t| t.elapsed() >= self.min_reindex_interval)
                .unwrap_or(true);

            if settled && can_reindex {
                println!(
                    "{} {} document(s) changed, reindexing...",
                    "🔄".yellow(),
                    pending_paths.len()
                );

                // Clear before reindexing so events during the run are kept
                pending_paths.clear();
                last_event_time = None;

                match reindex() {
                    Ok(report) => println!("{} {}", "✓".green(), report),
                    Err(e) => eprintln!("{} Reindex failed: {:#}", "✗".red(), e),
                }

                last_reindex_time = Some(Instant::now());
            }
        }

        Ok(())
    }
}

/// Paths of a create/modify/remove event that name supported documents.
fn relevant_paths(event: &Event, extensions: &[String]) -> Vec<PathBuf> {
    use notify::EventKind::*;
    if !matches!(event.kind, Create(_) | Modify(_) | Remove(_)) {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| is_supported_name(name, extensions))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}
