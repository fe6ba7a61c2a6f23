// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docsync Store
//
// The embedded, transactional document store that the attachment layer
// writes through. Documents are kept as a chain of revisions; each revision
// gets a store-wide sequence number.
//
// # Modules
//
// - [`config`] -- `DatastoreConfig`, the on-disk layout.
// - [`datastore`] -- `Datastore`, the redb-backed store.
// - [`error`] -- The `StoreError` enum.
// - [`revision`] -- Revision ids, `DocumentRevision`, and the
//   `RevisionStore` trait.
//
// # Example
//
// ```rust
// use docsync_store::{Datastore, DatastoreConfig};
// use serde_json::json;
//
// let dir = tempfile::tempdir().unwrap();
// let store = Datastore::open(DatastoreConfig::at(dir.path())).unwrap();
//
// let first = store.create_document("doc-1", &json!({"title": "draft"})).unwrap();
// let second = store
//     .update_document("doc-1", &first.rev_id, &json!({"title": "final"}))
//     .unwrap();
// assert_eq!(second.generation(), 2);
// ```

pub mod config;
pub mod datastore;
pub mod error;
pub mod revision;

// Re-export the transaction types so dependants don't need redb directly
// for signatures.
pub use redb::{ReadTransaction, WriteTransaction};

pub use config::DatastoreConfig;
pub use datastore::Datastore;
pub use error::{StoreError, StoreResult};
pub use revision::{DocumentRevision, RevisionId, RevisionStore};
