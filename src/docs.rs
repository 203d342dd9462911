// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document file operations inside the flat docs directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::errors::{ContextoError, Result};
use crate::indexer::scanner::is_supported_name;

/// Ensure `name` carries a supported extension, appending the primary one
/// (the first configured extension) when it does not.
///
/// Names must refer to a file directly inside the docs directory.
pub fn normalize_document_name(name: &str, extensions: &[String]) -> Result<String> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || Path::new(trimmed)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if invalid {
        return Err(ContextoError::InvalidDocumentName(name.to_string()));
    }

    if is_supported_name(trimmed, extensions) {
        return Ok(trimmed.to_string());
    }

    match extensions.first() {
        Some(primary) => Ok(format!("{trimmed}.{primary}")),
        None => Ok(trimmed.to_string()),
    }
}

/// Write (or overwrite) a document and return its path.
pub fn create_document(
    docs_dir: &Path,
    name: &str,
    content: &str,
    extensions: &[String],
) -> Result<PathBuf> {
    let file_name = normalize_document_name(name, extensions)?;
    fs::create_dir_all(docs_dir).map_err(ContextoError::io(docs_dir))?;

    let path = docs_dir.join(file_name);
    fs::write(&path, content).map_err(ContextoError::io(&path))?;
    tracing::debug!("Wrote document {}", path.display());
    Ok(path)
}

/// Remove a document and return its path.
pub fn delete_document(docs_dir: &Path, name: &str, extensions: &[String]) -> Result<PathBuf> {
    let file_name = normalize_document_name(name, extensions)?;
    let path = docs_dir.join(file_name);

    match fs::remove_file(&path) {
        Ok(()) => {
            tracing::debug!("Deleted document {}", path.display());
            Ok(path)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ContextoError::DocumentNotFound(path))
        }
        Err(e) => Err(ContextoError::io(&path)(e)),
    }
}

/// Read any file as text. A missing file is `None`, not an error.
pub fn read_document(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ContextoError::io(path)(e)),
    }
}
