// SPDX-License-Identifier: MIT OR Apache-2.0

//! Project-level accessor over the docs directory and its embedding index.
//!
//! [`DocsIndex`] owns the single embedding provider for the process and
//! exposes every operation the command line offers. Calls take `&mut self`,
//! so at most one synchronization or search runs at a time per instance.

use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::docs;
use crate::embedding::{provider_from_config, EmbeddingProvider, IndexStore};
use crate::errors::{ContextoError, Result};
use crate::indexer::{IndexSynchronizer, SyncReport};
use crate::query::{self, SearchHit, SearchOptions};
use crate::utils::ProjectLayout;

/// What `initialize` created before synchronizing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitReport {
    pub created_docs_dir: bool,
    pub created_data_dir: bool,
    pub created_index: bool,
    pub sync: SyncReport,
}

/// Outcome of a create or delete: the touched file and the follow-up sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentChange {
    pub path: PathBuf,
    pub sync: SyncReport,
}

pub struct DocsIndex {
    layout: ProjectLayout,
    config: Config,
    provider: Box<dyn EmbeddingProvider>,
}

impl DocsIndex {
    pub fn new(
        root: impl AsRef<Path>,
        config: Config,
        provider: Box<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            layout: ProjectLayout::new(root, &config),
            config,
            provider,
        }
    }

    /// Load configuration for `root` and build the configured provider.
    pub fn open(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let config = Config::load(root);
        let provider = provider_from_config(config.embeddings())
            .context("Failed to create embedding provider")?;
        Ok(Self::new(root, config, provider))
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> IndexStore {
        IndexStore::new(&self.layout.index_path)
    }

    fn synchronizer(&self) -> IndexSynchronizer {
        IndexSynchronizer::new(
            &self.layout.docs_dir,
            self.store(),
            &self.config.docs().extensions(),
        )
    }

    /// Create the docs directory, data directory and an empty index where
    /// missing, then synchronize.
    pub fn initialize(&mut self) -> Result<InitReport> {
        let created_docs_dir = ensure_dir(&self.layout.docs_dir)?;
        let created_data_dir = ensure_dir(&self.layout.data_dir())?;
        let created_index = self.store().create_empty()?;

        let sync = self.reindex()?;
        Ok(InitReport {
            created_docs_dir,
            created_data_dir,
            created_index,
            sync,
        })
    }

    /// Bring the index in line with the docs directory.
    pub fn reindex(&mut self) -> Result<SyncReport> {
        let synchronizer = self.synchronizer();
        synchronizer.sync(self.provider.as_mut())
    }

    /// Search with the configured ranking options.
    pub fn search(&mut self, query: &str) -> Result<Vec<SearchHit>> {
        let options = SearchOptions::from_config(self.config.search());
        self.search_with(query, &options)
    }

    pub fn search_with(&mut self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        query::search(&self.store(), self.provider.as_mut(), query, options)
    }

    /// Read a file by path, relative paths resolving against the project root.
    pub fn read_document(&self, path: impl AsRef<Path>) -> Result<Option<String>> {
        let path = path.as_ref();
        if path.is_absolute() {
            docs::read_document(path)
        } else {
            docs::read_document(&self.layout.root.join(path))
        }
    }

    /// Write a document, then synchronize.
    pub fn create_document(&mut self, name: &str, content: &str) -> Result<DocumentChange> {
        let path = docs::create_document(
            &self.layout.docs_dir,
            name,
            content,
            &self.config.docs().extensions(),
        )?;
        let sync = self.reindex()?;
        Ok(DocumentChange { path, sync })
    }

    /// Delete a document, then synchronize.
    pub fn delete_document(&mut self, name: &str) -> Result<DocumentChange> {
        let path = docs::delete_document(
            &self.layout.docs_dir,
            name,
            &self.config.docs().extensions(),
        )?;
        let sync = self.reindex()?;
        Ok(DocumentChange { path, sync })
    }
}

fn ensure_dir(path: &Path) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path).map_err(ContextoError::io(path))?;
    tracing::info!("Created {}", path.display());
    Ok(true)
}
