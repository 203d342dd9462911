// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON storage for the document embedding index.
//!
//! The index is a single JSON array of `{path, embedding, hash}` objects,
//! rewritten in full on every change. Writes go to a temporary file next to
//! the target and are renamed over it, so a reader only ever sees the old
//! index or the complete new one.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{ContextoError, Result};

/// Default embedding dimension for sentence-transformers/all-MiniLM-L6-v2.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// One indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Path of the source document; unique across the index
    pub path: String,
    /// Embedding of the content that produced `hash`
    pub embedding: Vec<f32>,
    /// Digest of the document content at embedding time
    pub hash: String,
}

/// Load/save access to the persisted index file.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the staging file used by atomic saves.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Check if the index file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads all entries. A missing file is an empty index; a file that
    /// exists but does not parse is an error.
    pub fn load(&self) -> Result<Vec<IndexEntry>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No index at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(ContextoError::io(&self.path)(e)),
        };

        serde_json::from_slice(&data).map_err(|source| ContextoError::CorruptIndex {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes an empty index if no index file exists yet.
    ///
    /// Returns true if the file was created.
    pub fn create_empty(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.save(&[])?;
        Ok(true)
    }

    /// Atomically replaces the index with `entries`.
    pub fn save(&self, entries: &[IndexEntry]) -> Result<()> {
        self.stage(entries)?.commit()
    }

    /// Writes `entries` to the staging file without touching the index.
    ///
    /// The returned [`StagedIndex`] must be committed to become visible;
    /// dropping it discards the staging file.
    pub fn stage(&self, entries: &[IndexEntry]) -> Result<StagedIndex> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(ContextoError::io(parent))?;
            }
        }

        let data = serde_json::to_vec(entries).map_err(ContextoError::Serialize)?;
        let temp_path = self.temp_path();

        if let Err(e) = write_synced(&temp_path, &data) {
            // Clean up temp file on error
            let _ = fs::remove_file(&temp_path);
            return Err(ContextoError::io(&temp_path)(e));
        }

        Ok(StagedIndex {
            temp_path,
            target: self.path.clone(),
            committed: false,
        })
    }
}

/// A fully written index waiting to be renamed over the live one.
#[derive(Debug)]
pub struct StagedIndex {
    temp_path: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedIndex {
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Atomic rename over the target path.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp_path, &self.target).map_err(ContextoError::io(&self.target))?;
        self.committed = true;
        tracing::debug!("Persisted index to {}", self.target.display());
        Ok(())
    }
}

impl Drop for StagedIndex {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}
