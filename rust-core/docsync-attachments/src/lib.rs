// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docsync Attachments
//
// Binary attachments for docsync documents. Blobs are content-addressed by
// SHA-256 and stored once per distinct content, however many revisions or
// documents refer to them. Rows in the `attachments` table link a blob to one
// revision. Unreferenced blobs are reclaimed by `BlobCollector`.
//
// # Modules
//
// - [`attachment`] -- `Attachment` (unsaved) and `SavedAttachment`.
// - [`blob`] -- The blob directory, staging files, and final placement.
// - [`collector`] -- `BlobCollector`, the orphan sweeper.
// - [`content`] -- `ContentKey`.
// - [`error`] -- The `AttachmentError` enum.
// - [`metadata`] -- The `attachments` table and its row type.
// - [`store`] -- `AttachmentStore`.
//
// # Example
//
// ```rust
// use std::sync::Arc;
// use docsync_attachments::{Attachment, AttachmentStore};
// use docsync_store::{Datastore, DatastoreConfig};
// use serde_json::json;
//
// let dir = tempfile::tempdir().unwrap();
// let datastore = Arc::new(Datastore::open(DatastoreConfig::at(dir.path())).unwrap());
// let rev = datastore.create_document("doc-1", &json!({})).unwrap();
//
// let attachments = AttachmentStore::open(Arc::clone(&datastore)).unwrap();
// let rev = attachments
//     .add_all(&rev, vec![Attachment::from_bytes("hello.txt", "text/plain", "hi")])
//     .unwrap();
// let saved = attachments.get(&rev, "hello.txt").unwrap().unwrap();
// assert_eq!(saved.read_to_vec().unwrap(), b"hi");
// ```

pub mod attachment;
pub mod blob;
pub mod collector;
pub mod content;
pub mod error;
pub mod metadata;
pub mod store;

pub use attachment::{Attachment, AttachmentSource, Encoding, SavedAttachment};
pub use blob::{BlobStore, StagedBlob};
pub use collector::{BlobCollector, CollectReport};
pub use content::ContentKey;
pub use error::{AttachmentError, AttachmentResult};
pub use metadata::AttachmentRow;
pub use store::{AttachmentStore, EXTENSION_NAME};
