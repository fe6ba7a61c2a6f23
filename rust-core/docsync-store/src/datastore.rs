// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>
//
// redb-backed document datastore for docsync.
//
// Uses redb (pure Rust, B-tree, ACID, single-file database) as the
// transactional store every other component writes through.
//
// # Storage Design
//
// Three redb tables:
//
// 1. **`documents`** -- doc id -> sequence of the document's current revision.
// 2. **`revisions`** -- sequence -> JSON-serialised `DocumentRevision`.
// 3. **`counters`** -- counter name -> u64. Holds the last allocated sequence.
//
// Write transactions are serialised by redb, which gives the single-writer
// model the attachment layer relies on. A `WriteTransaction` dropped without
// `commit()` rolls back everything written through it.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use tracing::{debug, info};

use crate::config::DatastoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::revision::{DocumentRevision, RevisionId, RevisionStore};

/// Document id -> sequence of its current revision.
const DOCUMENTS: TableDefinition<&str, u64> = TableDefinition::new("documents");

/// Sequence -> serialised `DocumentRevision`.
const REVISIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("revisions");

/// Named counters.
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

const LAST_SEQUENCE: &str = "last_sequence";

/// Wrap a redb error with the operation that produced it.
pub(crate) fn database<E: Display>(context: &'static str) -> impl Fn(E) -> StoreError {
    move |e| StoreError::Database(format!("{context}: {e}"))
}

/// The embedded document store.
///
/// Thread-safe: `Database` is `Send + Sync` and handles internal locking.
pub struct Datastore {
    db: Arc<Database>,
    config: DatastoreConfig,
    gate: Arc<Mutex<()>>,
}

impl Datastore {
    /// Open or create a datastore with the given layout.
    ///
    /// Creates the root and extensions directories and all tables if they
    /// don't exist yet.
    pub fn open(config: DatastoreConfig) -> StoreResult<Self> {
        std::fs::create_dir_all(&config.root)?;
        std::fs::create_dir_all(config.extensions_path())?;

        let path = config.database_path();
        let db = Database::create(&path).map_err(|e| {
            StoreError::Database(format!("failed to open redb at {}: {e}", path.display()))
        })?;

        let txn = db.begin_write().map_err(database("write txn"))?;
        txn.open_table(DOCUMENTS).map_err(database("open documents"))?;
        txn.open_table(REVISIONS).map_err(database("open revisions"))?;
        txn.open_table(COUNTERS).map_err(database("open counters"))?;
        txn.commit().map_err(database("commit"))?;

        debug!(path = %path.display(), "opened datastore");

        Ok(Self {
            db: Arc::new(db),
            config,
            gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn config(&self) -> &DatastoreConfig {
        &self.config
    }

    /// The gate extensions hold while they mutate files alongside a write
    /// transaction. Every caller on this datastore gets the same mutex.
    pub fn writer_gate(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.gate)
    }

    /// Start a write transaction. Only one can be open at a time; a second
    /// caller blocks until the first commits or is dropped.
    pub fn begin_write(&self) -> StoreResult<WriteTransaction> {
        self.db.begin_write().map_err(database("write txn"))
    }

    pub fn begin_read(&self) -> StoreResult<ReadTransaction> {
        self.db.begin_read().map_err(database("read txn"))
    }

    /// Data folder for a named extension, created on first use.
    pub fn extension_dir(&self, name: &str) -> StoreResult<PathBuf> {
        let dir = self.config.extensions_path().join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Create a document at generation 1.
    pub fn create_document(
        &self,
        doc_id: &str,
        body: &serde_json::Value,
    ) -> StoreResult<DocumentRevision> {
        let txn = self.begin_write()?;
        if current_sequence(&txn, doc_id)?.is_some() {
            return Err(StoreError::DocumentExists(doc_id.to_string()));
        }

        let revision = DocumentRevision {
            doc_id: doc_id.to_string(),
            rev_id: RevisionId::derive(None, body)?,
            parent: None,
            sequence: next_sequence(&txn)?,
            body: body.clone(),
        };
        put_revision(&txn, &revision)?;
        txn.commit().map_err(database("commit"))?;

        info!(doc_id, rev = %revision.rev_id, sequence = revision.sequence, "created document");
        Ok(revision)
    }

    /// Advance a document in its own transaction.
    pub fn update_document(
        &self,
        doc_id: &str,
        parent: &RevisionId,
        body: &serde_json::Value,
    ) -> StoreResult<DocumentRevision> {
        let txn = self.begin_write()?;
        let revision = self.advance(&txn, doc_id, parent, body)?;
        txn.commit().map_err(database("commit"))?;
        Ok(revision)
    }

    /// The current revision of a document.
    pub fn get_document(&self, doc_id: &str) -> StoreResult<Option<DocumentRevision>> {
        let txn = self.begin_read()?;
        let documents = txn.open_table(DOCUMENTS).map_err(database("open documents"))?;
        let Some(sequence) = documents
            .get(doc_id)
            .map_err(database("get document"))?
            .map(|guard| guard.value())
        else {
            return Ok(None);
        };

        let revisions = txn.open_table(REVISIONS).map_err(database("open revisions"))?;
        let revision = revisions
            .get(sequence)
            .map_err(database("get revision"))?
            .map(|guard| decode_revision(guard.value()))
            .transpose()?;
        Ok(revision)
    }

    /// Any stored revision by sequence.
    pub fn get_revision(&self, sequence: u64) -> StoreResult<Option<DocumentRevision>> {
        let txn = self.begin_read()?;
        let revisions = txn.open_table(REVISIONS).map_err(database("open revisions"))?;
        let revision = revisions
            .get(sequence)
            .map_err(database("get revision"))?
            .map(|guard| decode_revision(guard.value()))
            .transpose()?;
        Ok(revision)
    }
}

impl RevisionStore for Datastore {
    fn advance(
        &self,
        txn: &WriteTransaction,
        doc_id: &str,
        parent: &RevisionId,
        body: &serde_json::Value,
    ) -> StoreResult<DocumentRevision> {
        let sequence = current_sequence(txn, doc_id)?
            .ok_or_else(|| StoreError::DocumentNotFound(doc_id.to_string()))?;
        let current = load_revision(txn, sequence)?
            .ok_or_else(|| StoreError::Database(format!("missing revision row {sequence}")))?;

        if current.rev_id != *parent {
            return Err(StoreError::Conflict {
                doc_id: doc_id.to_string(),
                parent: parent.to_string(),
                current: current.rev_id.to_string(),
            });
        }

        let revision = DocumentRevision {
            doc_id: doc_id.to_string(),
            rev_id: RevisionId::derive(Some(parent), body)?,
            parent: Some(parent.clone()),
            sequence: next_sequence(txn)?,
            body: body.clone(),
        };
        put_revision(txn, &revision)?;

        info!(doc_id, rev = %revision.rev_id, sequence = revision.sequence, "advanced revision");
        Ok(revision)
    }
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastore")
            .field("root", &self.config.root)
            .finish()
    }
}

fn decode_revision(bytes: &[u8]) -> StoreResult<DocumentRevision> {
    Ok(serde_json::from_slice(bytes)?)
}

fn current_sequence(txn: &WriteTransaction, doc_id: &str) -> StoreResult<Option<u64>> {
    let documents = txn.open_table(DOCUMENTS).map_err(database("open documents"))?;
    let sequence = documents
        .get(doc_id)
        .map_err(database("get document"))?
        .map(|guard| guard.value());
    Ok(sequence)
}

fn load_revision(txn: &WriteTransaction, sequence: u64) -> StoreResult<Option<DocumentRevision>> {
    let revisions = txn.open_table(REVISIONS).map_err(database("open revisions"))?;
    let revision = revisions
        .get(sequence)
        .map_err(database("get revision"))?
        .map(|guard| decode_revision(guard.value()))
        .transpose()?;
    Ok(revision)
}

fn next_sequence(txn: &WriteTransaction) -> StoreResult<u64> {
    let mut counters = txn.open_table(COUNTERS).map_err(database("open counters"))?;
    let last = counters
        .get(LAST_SEQUENCE)
        .map_err(database("get counter"))?
        .map_or(0, |guard| guard.value());
    let next = last + 1;
    counters
        .insert(LAST_SEQUENCE, next)
        .map_err(database("set counter"))?;
    Ok(next)
}

fn put_revision(txn: &WriteTransaction, revision: &DocumentRevision) -> StoreResult<()> {
    let bytes = serde_json::to_vec(revision)?;
    {
        let mut revisions = txn.open_table(REVISIONS).map_err(database("open revisions"))?;
        revisions
            .insert(revision.sequence, bytes.as_slice())
            .map_err(database("insert revision"))?;
    }
    let mut documents = txn.open_table(DOCUMENTS).map_err(database("open documents"))?;
    documents
        .insert(revision.doc_id.as_str(), revision.sequence)
        .map_err(database("insert document"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn temp_store() -> (Datastore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Datastore::open(DatastoreConfig::at(dir.path())).unwrap();
        (store, dir)
    }

    #[test]
    fn test_create_and_get() {
        let (store, _dir) = temp_store();
        assert!(store.get_document("doc").unwrap().is_none());

        let rev = store.create_document("doc", &json!({"a": 1})).unwrap();
        assert_eq!(rev.generation(), 1);
        assert_eq!(rev.sequence, 1);

        let fetched = store.get_document("doc").unwrap().unwrap();
        assert_eq!(fetched, rev);
        assert_eq!(store.get_revision(1).unwrap().unwrap(), rev);
    }

    #[test]
    fn test_writer_gate_is_shared() {
        let (store, _dir) = temp_store();
        let first = store.writer_gate();
        let second = store.writer_gate();
        assert!(Arc::ptr_eq(&first, &second));

        let _held = first.lock().unwrap();
        assert!(second.try_lock().is_err());
    }

    #[test]
    fn test_create_twice_fails() {
        let (store, _dir) = temp_store();
        store.create_document("doc", &json!({})).unwrap();
        assert!(matches!(
            store.create_document("doc", &json!({})),
            Err(StoreError::DocumentExists(_))
        ));
    }

    #[test]
    fn test_update_advances_chain() {
        let (store, _dir) = temp_store();
        let first = store.create_document("doc", &json!({"v": 1})).unwrap();
        let second = store
            .update_document("doc", &first.rev_id, &json!({"v": 2}))
            .unwrap();

        assert_eq!(second.generation(), 2);
        assert_eq!(second.parent.as_ref(), Some(&first.rev_id));
        assert!(second.sequence > first.sequence);
        assert_eq!(store.get_document("doc").unwrap().unwrap(), second);
        // The old revision is still addressable by sequence.
        assert_eq!(store.get_revision(first.sequence).unwrap().unwrap(), first);
    }

    #[test]
    fn test_stale_parent_conflicts() {
        let (store, _dir) = temp_store();
        let first = store.create_document("doc", &json!({"v": 1})).unwrap();
        store
            .update_document("doc", &first.rev_id, &json!({"v": 2}))
            .unwrap();

        let err = store
            .update_document("doc", &first.rev_id, &json!({"v": 3}))
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_unknown_document() {
        let (store, _dir) = temp_store();
        let parent: RevisionId = "1-abc".parse().unwrap();
        assert!(matches!(
            store.update_document("ghost", &parent, &json!({})),
            Err(StoreError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let (store, _dir) = temp_store();
        let first = store.create_document("doc", &json!({"v": 1})).unwrap();

        {
            let txn = store.begin_write().unwrap();
            let advanced = store.advance(&txn, "doc", &first.rev_id, &json!({"v": 2})).unwrap();
            assert_eq!(advanced.generation(), 2);
            // dropped without commit
        }

        assert_eq!(store.get_document("doc").unwrap().unwrap(), first);
        // The sequence allocated inside the aborted transaction is reused.
        let second = store
            .update_document("doc", &first.rev_id, &json!({"v": 2}))
            .unwrap();
        assert_eq!(second.sequence, first.sequence + 1);
    }

    #[test]
    fn test_sequences_are_store_wide() {
        let (store, _dir) = temp_store();
        let a = store.create_document("a", &json!({})).unwrap();
        let b = store.create_document("b", &json!({})).unwrap();
        assert_eq!(b.sequence, a.sequence + 1);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let config = DatastoreConfig::at(dir.path());

        let rev = {
            let store = Datastore::open(config.clone()).unwrap();
            store.create_document("persistent", &json!({"k": "v"})).unwrap()
        };

        let store = Datastore::open(config).unwrap();
        assert_eq!(store.get_document("persistent").unwrap().unwrap(), rev);
    }

    #[test]
    fn test_extension_dir_created() {
        let (store, dir) = temp_store();
        let ext = store.extension_dir("attachments").unwrap();
        assert!(ext.is_dir());
        assert!(ext.starts_with(dir.path()));
    }
}
