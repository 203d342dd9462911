// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - vector providers and the persisted document index
//!
//! Providers turn document text into vectors; storage keeps one
//! `{path, embedding, hash}` entry per indexed document.

pub mod provider;
pub mod storage;

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
pub use provider::FastEmbedder;
pub use provider::{
    provider_from_config, CommandProvider, DummyProvider, EmbeddingProvider, FastEmbedConfig,
};
pub use storage::{IndexEntry, IndexStore, StagedIndex, DEFAULT_EMBEDDING_DIM};
