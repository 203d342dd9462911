// SPDX-License-Identifier: MIT OR Apache-2.0

//! Indexer module - keeps the embedding index in sync with the docs directory

pub mod hash;
pub mod scanner;
pub mod sync;
pub mod watch;

pub use hash::{content_hash, content_hash_bytes};
pub use scanner::{is_supported_name, DocScanner};
pub use sync::{ChangeSet, IndexSynchronizer, SyncReport};
pub use watch::Watcher;
