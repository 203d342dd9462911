// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query module - semantic search over the document index

pub mod search;

pub use search::{cosine_similarity, rank, search, SearchHit, SearchOptions};
