// SPDX-License-Identifier: MIT OR Apache-2.0

//! Utility functions for contexto

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

use crate::config::Config;

/// Resolved on-disk locations for one project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// The project root everything else is relative to
    pub root: PathBuf,
    /// The flat documentation directory
    pub docs_dir: PathBuf,
    /// The persisted index file
    pub index_path: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl AsRef<Path>, config: &Config) -> Self {
        let root = normalize_path(root.as_ref());
        Self {
            docs_dir: root.join(config.docs().dir()),
            index_path: root.join(config.index().path()),
            root,
        }
    }

    /// Directory holding the index file.
    pub fn data_dir(&self) -> PathBuf {
        self.index_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone())
    }
}

/// Resolve the project root from an optional CLI path, falling back to the
/// current directory. The result is absolute and lexically normalized so that
/// indexed document paths stay stable across invocations.
pub fn resolve_root(path: Option<&str>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let root = match path {
        Some(p) => cwd.join(p),
        None => cwd,
    };
    Ok(normalize_path(&root))
}

/// Drop `.` components and fold `..` into its parent without touching the
/// filesystem. The root may not exist yet, so `canonicalize` is not an option.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            Component::RootDir | Component::Prefix(_) | Component::Normal(_) => {
                normalized.push(component);
            }
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_uses_config_locations() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path(), &Config::default());
        assert_eq!(layout.docs_dir, dir.path().join("docs"));
        assert_eq!(layout.index_path, dir.path().join("data").join("embeddings.json"));
        assert_eq!(layout.data_dir(), dir.path().join("data"));
    }

    #[test]
    fn layout_root_is_normalized() {
        let dir = TempDir::new().unwrap();
        let dotted = ProjectLayout::new(dir.path().join("."), &Config::default());
        assert_eq!(dotted.root, dir.path());
        assert_eq!(dotted.docs_dir, dir.path().join("docs"));
    }

    #[test]
    fn resolve_root_makes_relative_paths_absolute() {
        let root = resolve_root(Some("some/project")).unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("some/project"));
    }

    #[test]
    fn resolve_root_defaults_to_cwd() {
        let root = resolve_root(None).unwrap();
        assert_eq!(root, normalize_path(&std::env::current_dir().unwrap()));
    }

    #[test]
    fn dot_root_matches_default_root() {
        assert_eq!(resolve_root(Some(".")).unwrap(), resolve_root(None).unwrap());
        assert_eq!(resolve_root(Some("./")).unwrap(), resolve_root(None).unwrap());
    }

    #[test]
    fn parent_components_are_folded() {
        let root = resolve_root(Some("a/./b/../c")).unwrap();
        assert!(root.ends_with("a/c"));
        assert!(!root.components().any(|c| matches!(c, Component::CurDir | Component::ParentDir)));

        assert_eq!(normalize_path(Path::new("/p/x/../docs")), PathBuf::from("/p/docs"));
        assert_eq!(normalize_path(Path::new("/../p")), PathBuf::from("/p"));
    }
}
