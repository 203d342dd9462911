// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use contexto::config::Config;
use contexto::embedding::{EmbeddingProvider, IndexEntry, IndexStore};
use contexto::indexer::{content_hash, content_hash_bytes, IndexSynchronizer, SyncReport};
use contexto::{ContextoError, DocsIndex};
use tempfile::TempDir;

/// Shared log of every batch the provider was asked to embed.
type CallLog = Arc<Mutex<Vec<Vec<String>>>>;

/// Embeds text as [byte length, number of vowels, 1] and logs every call.
struct RecordingProvider {
    calls: CallLog,
    fail: bool,
}

impl RecordingProvider {
    fn new() -> (Self, CallLog) {
        let calls = CallLog::default();
        (
            Self {
                calls: calls.clone(),
                fail: false,
            },
            calls,
        )
    }
}

impl EmbeddingProvider for RecordingProvider {
    fn model_id(&self) -> &str {
        "recording"
    }

    fn embed_texts(&mut self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.fail {
            anyhow::bail!("inference backend unavailable");
        }
        self.calls.lock().unwrap().push(texts.to_vec());
        Ok(texts.iter().map(|t| embed(t)).collect())
    }
}

fn embed(text: &str) -> Vec<f32> {
    let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
    vec![text.len() as f32, vowels as f32, 1.0]
}

fn write_doc(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write doc");
    path
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn project() -> (TempDir, PathBuf, IndexSynchronizer) {
    let dir = TempDir::new().expect("tempdir");
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).expect("docs dir");
    let store = IndexStore::new(dir.path().join("data").join("embeddings.json"));
    let sync = IndexSynchronizer::new(&docs, store, &["md".to_string(), "txt".to_string()]);
    (dir, docs, sync)
}

#[test]
fn unchanged_documents_are_not_reembedded() {
    let (_dir, docs, sync) = project();
    write_doc(&docs, "a.md", "alpha");
    write_doc(&docs, "b.md", "bravo");

    let (mut provider, calls) = RecordingProvider::new();
    sync.sync(&mut provider).expect("first sync");
    let before = sync.store().load().expect("load");

    let report = sync.sync(&mut provider).expect("second sync");
    assert!(matches!(report, SyncReport::NoChanges { indexed: 2, .. }));
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(sync.store().load().expect("load"), before);
}

#[test]
fn touched_but_identical_document_is_unchanged() {
    let (_dir, docs, sync) = project();
    let path = write_doc(&docs, "a.md", "alpha");

    let (mut provider, calls) = RecordingProvider::new();
    sync.sync(&mut provider).expect("first sync");

    // Rewrite with identical bytes; only the mtime changes.
    write_doc(&docs, "a.md", "alpha");
    assert!(path.exists());

    let report = sync.sync(&mut provider).expect("second sync");
    assert!(matches!(report, SyncReport::NoChanges { .. }));
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn no_change_sync_does_not_rewrite_index() {
    let (_dir, docs, sync) = project();
    write_doc(&docs, "a.md", "alpha");

    let (mut provider, _calls) = RecordingProvider::new();
    sync.sync(&mut provider).expect("first sync");

    // Reformat the stored index; a rewrite would compact it again.
    let entries = sync.store().load().expect("load");
    let pretty = serde_json::to_string_pretty(&entries).expect("json");
    fs::write(sync.store().path(), &pretty).expect("rewrite");

    let report = sync.sync(&mut provider).expect("second sync");
    assert!(matches!(report, SyncReport::NoChanges { .. }));
    assert_eq!(fs::read_to_string(sync.store().path()).expect("read"), pretty);
}

#[test]
fn deletion_is_detected_from_prior_index() {
    let (_dir, docs, sync) = project();
    let a = write_doc(&docs, "a.md", "alpha");
    let c = write_doc(&docs, "c.md", "charlie");
    let b = docs.join("b.md");

    let prior: Vec<IndexEntry> = [(&a, "alpha"), (&b, "bravo"), (&c, "charlie")]
        .into_iter()
        .map(|(path, content)| IndexEntry {
            path: key(path),
            embedding: embed(content),
            hash: content_hash(content),
        })
        .collect();
    sync.store().save(&prior).expect("seed index");

    let (mut provider, calls) = RecordingProvider::new();
    let report = sync.sync(&mut provider).expect("sync");

    let changes = report.changes().expect("updated");
    assert_eq!(changes.removed, vec![key(&b)]);
    assert!(changes.added.is_empty());
    assert!(changes.modified.is_empty());
    assert!(calls.lock().unwrap().is_empty());

    let paths: Vec<String> = sync
        .store()
        .load()
        .expect("load")
        .into_iter()
        .map(|e| e.path)
        .collect();
    assert_eq!(paths, vec![key(&a), key(&c)]);
}

#[test]
fn additions_are_embedded_in_one_batch() {
    let (_dir, docs, sync) = project();
    write_doc(&docs, "first.md", "first document");
    write_doc(&docs, "second.txt", "second document");

    let (mut provider, calls) = RecordingProvider::new();
    let report = sync.sync(&mut provider).expect("sync");

    let changes = report.changes().expect("updated");
    assert_eq!(changes.added.len(), 2);
    assert_eq!(changes.modified.len(), 0);
    assert_eq!(changes.removed.len(), 0);
    assert_eq!(
        *calls.lock().unwrap(),
        vec![vec!["first document".to_string(), "second document".to_string()]]
    );
}

#[test]
fn modification_updates_hash_and_embedding() {
    let (_dir, docs, sync) = project();
    let path = write_doc(&docs, "guide.md", "old text");

    let (mut provider, _calls) = RecordingProvider::new();
    sync.sync(&mut provider).expect("first sync");

    write_doc(&docs, "guide.md", "new, longer text");
    let report = sync.sync(&mut provider).expect("second sync");
    assert_eq!(report.changes().expect("updated").modified, vec![key(&path)]);

    let entries = sync.store().load().expect("load");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].hash, content_hash("new, longer text"));
    assert_eq!(entries[0].embedding, embed("new, longer text"));
}

#[test]
fn entries_keep_unique_paths_with_fresh_hashes() {
    let (_dir, docs, sync) = project();
    write_doc(&docs, "a.md", "one");
    write_doc(&docs, "b.md", "two");

    let (mut provider, _calls) = RecordingProvider::new();
    sync.sync(&mut provider).expect("first sync");
    write_doc(&docs, "b.md", "two, edited");
    write_doc(&docs, "c.txt", "three");
    sync.sync(&mut provider).expect("second sync");

    let entries = sync.store().load().expect("load");
    let mut paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), entries.len());

    for entry in &entries {
        let bytes = fs::read(&entry.path).expect("doc exists");
        assert_eq!(entry.hash, content_hash_bytes(&bytes));
    }
}

#[test]
fn changed_invalid_utf8_bytes_are_reembedded() {
    let (_dir, docs, sync) = project();
    fs::write(docs.join("a.md"), b"caf\xe9").expect("write doc");

    let (mut provider, calls) = RecordingProvider::new();
    sync.sync(&mut provider).expect("first sync");

    fs::write(docs.join("a.md"), b"caf\xe8").expect("rewrite doc");
    let report = sync.sync(&mut provider).expect("second sync");
    match report {
        SyncReport::Updated { indexed, changes, .. } => {
            assert_eq!(indexed, 1);
            assert_eq!(changes.modified, vec![key(&docs.join("a.md"))]);
        }
        other => panic!("expected an update, got {other:?}"),
    }
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[test]
fn dotted_root_keeps_the_same_index_keys() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir(dir.path().join("docs")).expect("docs dir");
    write_doc(&dir.path().join("docs"), "a.md", "alpha");

    let (provider, calls) = RecordingProvider::new();
    let mut dotted = DocsIndex::new(dir.path().join("."), Config::default(), Box::new(provider));
    assert!(dotted.reindex().expect("dotted sync").is_updated());

    let (provider, _) = RecordingProvider::new();
    let mut plain = DocsIndex::new(dir.path(), Config::default(), Box::new(provider));
    let report = plain.reindex().expect("plain sync");
    assert!(matches!(report, SyncReport::NoChanges { indexed: 1, .. }));

    let (provider, _) = RecordingProvider::new();
    let nested = dir.path().join("docs").join("..");
    let mut parent = DocsIndex::new(nested, Config::default(), Box::new(provider));
    assert!(matches!(
        parent.reindex().expect("parent sync"),
        SyncReport::NoChanges { indexed: 1, .. }
    ));

    let stored = plain.store().load().expect("load");
    assert_eq!(stored[0].path, key(&dir.path().join("docs").join("a.md")));
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn failed_embedding_leaves_prior_index_intact() {
    let (_dir, docs, sync) = project();
    write_doc(&docs, "a.md", "alpha");

    let (mut provider, _calls) = RecordingProvider::new();
    sync.sync(&mut provider).expect("first sync");
    let before = fs::read(sync.store().path()).expect("read index");

    write_doc(&docs, "a.md", "alpha, changed");
    write_doc(&docs, "b.md", "bravo");
    provider.fail = true;

    let err = sync.sync(&mut provider).expect_err("sync must fail");
    assert!(matches!(err, ContextoError::Embedding(_)));
    assert_eq!(fs::read(sync.store().path()).expect("read index"), before);
    assert!(!sync.store().temp_path().exists());
}

#[test]
fn corrupt_index_is_not_replaced() {
    let (_dir, docs, sync) = project();
    write_doc(&docs, "a.md", "alpha");
    fs::create_dir_all(sync.store().path().parent().unwrap()).expect("data dir");
    fs::write(sync.store().path(), "[{\"path\":").expect("corrupt");

    let (mut provider, _calls) = RecordingProvider::new();
    let err = sync.sync(&mut provider).expect_err("corrupt index");
    assert!(matches!(err, ContextoError::CorruptIndex { .. }));
    assert_eq!(
        fs::read_to_string(sync.store().path()).expect("read"),
        "[{\"path\":"
    );
}

#[test]
fn docs_index_crud_round() {
    let dir = TempDir::new().expect("tempdir");
    let (provider, calls) = RecordingProvider::new();
    let mut index = DocsIndex::new(dir.path(), Config::default(), Box::new(provider));

    let init = index.initialize().expect("init");
    assert!(matches!(init.sync, SyncReport::NoChanges { indexed: 0, .. }));

    index.create_document("setup", "install the tool").expect("create");
    index.create_document("usage.txt", "run it").expect("create");
    assert_eq!(calls.lock().unwrap().len(), 2);

    // Overwrite with new content re-embeds just that document.
    let change = index.create_document("setup.md", "install it first").expect("overwrite");
    assert_eq!(change.sync.changes().expect("updated").modified.len(), 1);
    assert_eq!(calls.lock().unwrap()[2], vec!["install it first".to_string()]);

    let hits = index.search("install").expect("search");
    assert!(hits.len() <= 2);

    index.delete_document("usage.txt").expect("delete");
    let remaining = index.store().load().expect("load");
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].path.ends_with("setup.md"));

    let missing = index.delete_document("usage").expect_err("already gone");
    assert!(matches!(missing, ContextoError::DocumentNotFound(_)));
}

#[test]
fn missing_docs_dir_is_a_distinct_status() {
    let dir = TempDir::new().expect("tempdir");
    let (provider, calls) = RecordingProvider::new();
    let mut index = DocsIndex::new(dir.path(), Config::default(), Box::new(provider));

    let report = index.reindex().expect("reindex");
    assert!(matches!(report, SyncReport::MissingDocsDir { .. }));
    assert!(calls.lock().unwrap().is_empty());
    assert!(index.search("anything").expect("search").is_empty());
}
