// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental synchronization of the embedding index with the docs directory.
//!
//! Every supported document is classified against the previous index by
//! content hash:
//! - unchanged: the stored entry is carried forward, no embedding work
//! - modified / added: queued for one batched embedding call
//! - removed: previous entries whose document is gone are dropped
//!
//! The merged index is persisted atomically, and only when something changed.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::embedding::{EmbeddingProvider, IndexEntry, IndexStore};
use crate::errors::{ContextoError, Result};
use crate::indexer::hash::content_hash_bytes;
use crate::indexer::scanner::DocScanner;

/// Paths touched by one synchronization, in docs-directory order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Outcome of a synchronization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncReport {
    /// The documentation directory does not exist yet; nothing was embedded.
    MissingDocsDir { docs_dir: PathBuf },
    /// Every document matched the stored index; nothing was written.
    NoChanges {
        docs_dir: PathBuf,
        index_path: PathBuf,
        indexed: usize,
    },
    /// The index was rebuilt and persisted.
    Updated {
        docs_dir: PathBuf,
        index_path: PathBuf,
        indexed: usize,
        changes: ChangeSet,
    },
}

impl SyncReport {
    /// Changes applied by this run (empty unless `Updated`).
    pub fn changes(&self) -> Option<&ChangeSet> {
        match self {
            Self::Updated { changes, .. } => Some(changes),
            _ => None,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDocsDir { docs_dir } => {
                write!(
                    f,
                    "No documentation directory found. Path: {}",
                    docs_dir.display()
                )
            }
            Self::NoChanges {
                docs_dir,
                index_path,
                ..
            } => {
                writeln!(f, "No changes detected in documentation.")?;
                writeln!(f, "Documentation path: {}", docs_dir.display())?;
                write!(f, "Embeddings path: {}", index_path.display())
            }
            Self::Updated {
                docs_dir,
                index_path,
                changes,
                ..
            } => {
                writeln!(
                    f,
                    "Successfully indexed {} new, {} modified, and removed {} deleted document(s).",
                    changes.added.len(),
                    changes.modified.len(),
                    changes.removed.len()
                )?;
                writeln!(f, "Documentation path: {}", docs_dir.display())?;
                write!(f, "Embeddings path: {}", index_path.display())
            }
        }
    }
}

/// A document whose embedding has to be (re)computed.
#[derive(Debug)]
struct PendingDoc {
    path: String,
    content: String,
    hash: String,
}

/// Result of classifying the docs directory against the previous index.
#[derive(Debug, Default)]
struct SyncPlan {
    carried: Vec<IndexEntry>,
    pending: Vec<PendingDoc>,
    changes: ChangeSet,
}

/// Brings the persisted index in line with the documentation directory.
pub struct IndexSynchronizer {
    docs_dir: PathBuf,
    store: IndexStore,
    extensions: Vec<String>,
}

impl IndexSynchronizer {
    pub fn new(docs_dir: impl AsRef<Path>, store: IndexStore, extensions: &[String]) -> Self {
        Self {
            docs_dir: docs_dir.as_ref().to_path_buf(),
            store,
            extensions: extensions.to_vec(),
        }
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Load the persisted index and synchronize against it.
    pub fn sync(&self, provider: &mut dyn EmbeddingProvider) -> Result<SyncReport> {
        let prior = self.store.load()?;
        self.sync_from(prior, provider)
    }

    /// Synchronize against an explicit previous index.
    pub fn sync_from(
        &self,
        prior: Vec<IndexEntry>,
        provider: &mut dyn EmbeddingProvider,
    ) -> Result<SyncReport> {
        if !self.docs_dir.is_dir() {
            tracing::info!(
                "Documentation directory {} does not exist",
                self.docs_dir.display()
            );
            return Ok(SyncReport::MissingDocsDir {
                docs_dir: self.docs_dir.clone(),
            });
        }

        let plan = self.classify(prior)?;
        tracing::debug!(
            "Classified docs: {} unchanged, {} added, {} modified, {} removed",
            plan.carried.len(),
            plan.changes.added.len(),
            plan.changes.modified.len(),
            plan.changes.removed.len()
        );

        if plan.changes.is_empty() {
            return Ok(SyncReport::NoChanges {
                docs_dir: self.docs_dir.clone(),
                index_path: self.store.path().to_path_buf(),
                indexed: plan.carried.len(),
            });
        }

        let SyncPlan {
            carried,
            pending,
            changes,
        } = plan;

        let mut entries = carried;
        entries.extend(embed_pending(pending, provider)?);
        self.store.save(&entries)?;

        tracing::info!(
            "Indexed {} added, {} modified, {} removed document(s)",
            changes.added.len(),
            changes.modified.len(),
            changes.removed.len()
        );

        Ok(SyncReport::Updated {
            docs_dir: self.docs_dir.clone(),
            index_path: self.store.path().to_path_buf(),
            indexed: entries.len(),
            changes,
        })
    }

    fn classify(&self, prior: Vec<IndexEntry>) -> Result<SyncPlan> {
        let mut previous: HashMap<String, IndexEntry> = prior
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();

        let scanner = DocScanner::new(&self.docs_dir, &self.extensions);
        let mut plan = SyncPlan::default();

        for path in scanner.list_files()? {
            let path_str = path.to_string_lossy().to_string();
            let bytes = fs::read(&path).map_err(ContextoError::io(&path))?;
            let hash = content_hash_bytes(&bytes);
            let content = decode_document(bytes);

            match previous.remove(&path_str) {
                Some(entry) if entry.hash == hash => plan.carried.push(entry),
                Some(_) => {
                    plan.changes.modified.push(path_str.clone());
                    plan.pending.push(PendingDoc {
                        path: path_str,
                        content,
                        hash,
                    });
                }
                None => {
                    plan.changes.added.push(path_str.clone());
                    plan.pending.push(PendingDoc {
                        path: path_str,
                        content,
                        hash,
                    });
                }
            }
        }

        // Whatever was not seen in the directory has been deleted.
        let mut removed: Vec<String> = previous.into_keys().collect();
        removed.sort();
        plan.changes.removed = removed;

        Ok(plan)
    }
}

/// Embed all pending documents with a single provider call.
fn embed_pending(
    pending: Vec<PendingDoc>,
    provider: &mut dyn EmbeddingProvider,
) -> Result<Vec<IndexEntry>> {
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let contents: Vec<String> = pending.iter().map(|doc| doc.content.clone()).collect();
    tracing::debug!(
        "Embedding {} document(s) with '{}'",
        contents.len(),
        provider.model_id()
    );
    let embeddings = provider
        .embed_texts(&contents)
        .map_err(ContextoError::Embedding)?;

    if embeddings.len() != pending.len() {
        return Err(ContextoError::EmbeddingCountMismatch {
            expected: pending.len(),
            got: embeddings.len(),
        });
    }

    Ok(pending
        .into_iter()
        .zip(embeddings)
        .map(|(doc, embedding)| IndexEntry {
            path: doc.path,
            embedding,
            hash: doc.hash,
        })
        .collect())
}

/// Embedding input for a document, replacing invalid UTF-8.
fn decode_document(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}
