// SPDX-License-Identifier: MIT OR Apache-2.0

//! contexto - Local semantic search over project documentation
//!
//! Shared modules for the contexto CLI tool.

pub mod config;
pub mod docs;
pub mod embedding;
pub mod errors;
pub mod indexer;
pub mod install;
pub mod output;
pub mod query;
pub mod service;
pub mod utils;

pub use errors::{ContextoError, Result};
pub use service::DocsIndex;
