// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the contexto library.

use std::path::{Path, PathBuf};

/// Errors surfaced by indexing, search and document operations.
#[derive(Debug, thiserror::Error)]
pub enum ContextoError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    /// The index file exists but cannot be parsed. Never treated as an empty index.
    #[error("Search index at {} is corrupt: {source}", .path.display())]
    CorruptIndex {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize search index: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Embedding provider failed: {0:#}")]
    Embedding(#[from] anyhow::Error),

    #[error("Embedding provider returned {got} vectors for {expected} inputs")]
    EmbeddingCountMismatch { expected: usize, got: usize },

    #[error("Document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("Invalid document name: {0:?}")]
    InvalidDocumentName(String),
}

impl ContextoError {
    /// Returns a closure that attaches `path` to an I/O error.
    pub fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| Self::Io { path, source }
    }

    /// True for the "missing resource" class of failures, which callers
    /// report as a status instead of a hard failure.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::DocumentNotFound(_) => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ContextoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_helper_keeps_path() {
        let err = ContextoError::io("/tmp/x")(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(err.to_string().contains("/tmp/x"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_classification() {
        assert!(ContextoError::DocumentNotFound(PathBuf::from("a.md")).is_not_found());
        let io = ContextoError::io("a.md")(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(io.is_not_found());
        assert!(!ContextoError::InvalidDocumentName("..".into()).is_not_found());
    }
}
