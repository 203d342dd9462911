// SPDX-License-Identifier: MIT OR Apache-2.0

//! Documentation directory scanner using the ignore crate (same as ripgrep)
//!
//! The documentation directory is flat: only regular files directly inside it
//! are considered, subdirectories are skipped without recursion.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::errors::{ContextoError, Result};

/// Lists supported documents in a flat documentation directory
pub struct DocScanner {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DocScanner {
    /// `extensions` are given without leading dots ("md", "txt").
    pub fn new(root: impl AsRef<Path>, extensions: &[String]) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: extensions.to_vec(),
        }
    }

    /// Whether a file name ends with one of the supported extensions.
    ///
    /// Matching is a plain, case-sensitive suffix test on the file name, so
    /// `notes.MD` is not a document when only `md` is configured.
    pub fn is_supported(&self, file_name: &str) -> bool {
        is_supported_name(file_name, &self.extensions)
    }

    /// Get document paths sorted by file name
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|source| ContextoError::Scan {
                path: self.root.clone(),
                source,
            })?;
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let supported = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| self.is_supported(name))
                .unwrap_or(false);
            if supported {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }
}

/// Suffix test shared by the scanner, document name normalization and watch mode.
pub fn is_supported_name(file_name: &str, extensions: &[String]) -> bool {
    extensions
        .iter()
        .any(|ext| file_name.ends_with(&format!(".{ext}")))
}
