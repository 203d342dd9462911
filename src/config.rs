// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for contexto
//!
//! Loads configuration from .contextorc.toml in the project root or ~/.config/contexto/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::embedding::DEFAULT_EMBEDDING_DIM;

/// Project-local configuration file name
pub const CONFIG_FILE_NAME: &str = ".contextorc.toml";

/// Default documentation directory, relative to the project root
pub const DEFAULT_DOCS_DIR: &str = "docs";

/// Default persisted index location, relative to the project root
pub const DEFAULT_INDEX_PATH: &str = "data/embeddings.json";

/// Default minimum similarity a document must exceed to be returned
pub const DEFAULT_MIN_SCORE: f32 = 0.4;

/// Default number of search results
pub const DEFAULT_TOP_K: usize = 5;

/// Default embedding model (same model the index was designed around)
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// How the similarity threshold interacts with top-K truncation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdOrder {
    /// Drop entries at or below the threshold, then keep the best K
    #[default]
    FilterThenTruncate,
    /// Keep the best K, then drop those at or below the threshold
    TruncateThenFilter,
}

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    #[default]
    Builtin,
    Command,
    Dummy,
}

/// Documentation directory configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Documentation directory relative to the project root
    pub dir: Option<String>,
    /// Supported file extensions; the first one is the primary extension
    pub extensions: Option<Vec<String>>,
}

impl DocsConfig {
    /// Get docs directory (defaults to "docs")
    pub fn dir(&self) -> &str {
        self.dir.as_deref().unwrap_or(DEFAULT_DOCS_DIR)
    }

    /// Get supported extensions without leading dots (defaults to md, txt)
    pub fn extensions(&self) -> Vec<String> {
        let normalized: Vec<String> = self
            .extensions
            .iter()
            .flatten()
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();

        if normalized.is_empty() {
            vec!["md".to_string(), "txt".to_string()]
        } else {
            normalized
        }
    }
}

/// Persisted index configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index file location relative to the project root
    pub path: Option<String>,
}

impl IndexConfig {
    /// Get index path (defaults to "data/embeddings.json")
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(DEFAULT_INDEX_PATH)
    }
}

/// Search configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of results
    pub top_k: Option<usize>,
    /// Minimum similarity score; results at or below it are dropped
    pub min_score: Option<f32>,
    /// Threshold/truncation ordering
    pub threshold_order: Option<ThresholdOrder>,
}

impl SearchConfig {
    /// Get top-K (defaults to 5)
    pub fn top_k(&self) -> usize {
        self.top_k.unwrap_or(DEFAULT_TOP_K)
    }

    /// Get minimum score (defaults to 0.4)
    pub fn min_score(&self) -> f32 {
        self.min_score.unwrap_or(DEFAULT_MIN_SCORE)
    }

    /// Get threshold ordering (defaults to filter-then-truncate)
    pub fn threshold_order(&self) -> ThresholdOrder {
        self.threshold_order.unwrap_or_default()
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (builtin, command, dummy)
    pub provider: Option<EmbeddingProviderType>,
    /// Model identifier for the embedding provider
    pub model: Option<String>,
    /// Command to execute for command provider
    pub command: Option<String>,
    /// Texts per model invocation inside one provider call
    pub batch_size: Option<usize>,
    /// Characters of each document fed to the model
    pub max_chars: Option<usize>,
    /// L2-normalize vectors
    pub normalize: Option<bool>,
    /// Vector size for the dummy provider
    pub dimension: Option<usize>,
    /// Where downloaded models are cached
    pub cache_dir: Option<PathBuf>,
}

impl EmbeddingConfig {
    /// Get provider type (defaults to Builtin)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get model identifier (defaults to all-MiniLM-L6-v2)
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Get command (defaults to "embedder")
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or("embedder")
    }

    /// Get batch size (defaults to 256)
    pub fn batch_size(&self) -> usize {
        self.batch_size.filter(|&n| n > 0).unwrap_or(256)
    }

    /// Get max chars (defaults to 8000)
    pub fn max_chars(&self) -> usize {
        self.max_chars.filter(|&n| n > 0).unwrap_or(8000)
    }

    /// Get normalize flag (defaults to true)
    pub fn normalize(&self) -> bool {
        self.normalize.unwrap_or(true)
    }

    /// Get dummy dimension (defaults to [`DEFAULT_EMBEDDING_DIM`])
    pub fn dimension(&self) -> usize {
        self.dimension.filter(|&n| n > 0).unwrap_or(DEFAULT_EMBEDDING_DIM)
    }

    /// Get model cache dir (defaults to <cache>/contexto/models)
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("contexto")
                .join("models")
        })
    }
}

/// Configuration loaded from .contextorc.toml or ~/.config/contexto/config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation directory configuration
    #[serde(default)]
    pub docs: DocsConfig,

    /// Persisted index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
}

impl Config {
    /// Load configuration for a project
    ///
    /// Precedence (highest to lowest):
    /// 1. .contextorc.toml in the project root
    /// 2. ~/.config/contexto/config.toml
    pub fn load(project_root: &Path) -> Self {
        if let Some(config) = Self::load_from_path(&project_root.join(CONFIG_FILE_NAME)) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("contexto").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!("Loaded configuration from {}", path.display());
                Some(config)
            }
            Err(e) => {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get the docs configuration
    pub fn docs(&self) -> &DocsConfig {
        &self.docs
    }

    /// Get the index configuration
    pub fn index(&self) -> &IndexConfig {
        &self.index
    }

    /// Get the search configuration
    pub fn search(&self) -> &SearchConfig {
        &self.search
    }

    /// Get the embedding configuration
    pub fn embeddings(&self) -> &EmbeddingConfig {
        &self.embeddings
    }
}
