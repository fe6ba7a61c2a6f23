// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AttachmentStore: links content-addressed blobs to document revisions.
//
// Adding an attachment is a three-step dance:
//
// 1. Stage: drain the source into a `temp<uuid>` file exactly once, hashing it
//    on the way through.
// 2. Link: inside a write transaction, replace any row already at
//    `(filename, sequence)` and insert the new row.
// 3. Place: rename the staging file to the content key's hex name (or drop it
//    if that blob already exists).
//
// The rename is not covered by the transaction. It runs after the insert and
// before the commit, so a failed rename aborts the transaction; a failed
// commit after a successful rename leaves an unreferenced blob for the
// collector. A committed row whose blob is missing surfaces as
// `AttachmentError::BlobUnavailable` on open.
//
// All mutations take the datastore's writer gate. Every `AttachmentStore` and
// `BlobCollector` opened on the same `Datastore` shares it.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use docsync_store::{Datastore, DocumentRevision, RevisionStore, WriteTransaction};
use tracing::{debug, error, info, warn};

use crate::attachment::{Attachment, Encoding, SavedAttachment};
use crate::blob::BlobStore;
use crate::collector::BlobCollector;
use crate::error::{database, AttachmentError, AttachmentResult};
use crate::metadata::{self, AttachmentRow};

/// Name of the datastore extension folder that holds blobs.
pub const EXTENSION_NAME: &str = "attachments";

/// Attachment storage for one datastore.
#[derive(Debug)]
pub struct AttachmentStore {
    datastore: Arc<Datastore>,
    blobs: BlobStore,
    gate: Arc<Mutex<()>>,
}

impl AttachmentStore {
    /// Attach to `datastore`, creating the blob folder and metadata table.
    pub fn open(datastore: Arc<Datastore>) -> AttachmentResult<Self> {
        let blobs = BlobStore::open(datastore.extension_dir(EXTENSION_NAME)?)?;

        let txn = datastore.begin_write()?;
        metadata::init(&txn)?;
        txn.commit().map_err(database("commit"))?;

        debug!(dir = %blobs.dir().display(), "opened attachment store");
        let gate = datastore.writer_gate();
        Ok(Self {
            datastore,
            blobs,
            gate,
        })
    }

    pub fn datastore(&self) -> &Datastore {
        &self.datastore
    }

    pub fn blob_dir(&self) -> &Path {
        self.blobs.dir()
    }

    /// A collector that shares this store's writer gate.
    pub fn collector(&self) -> BlobCollector {
        BlobCollector::new(
            Arc::clone(&self.datastore),
            self.blobs.clone(),
            Arc::clone(&self.gate),
        )
    }

    fn lock(&self) -> AttachmentResult<MutexGuard<'_, ()>> {
        self.gate.lock().map_err(|_| AttachmentError::LockPoisoned)
    }

    /// Add one attachment to an existing revision in its own transaction.
    ///
    /// An attachment already linked to `revision` under the same name is
    /// replaced.
    pub fn add(
        &self,
        revision: &DocumentRevision,
        attachment: Attachment,
    ) -> AttachmentResult<SavedAttachment> {
        let _writer = self.lock()?;
        let txn = self.datastore.begin_write()?;
        let saved = self.link(&txn, revision, attachment)?;
        txn.commit().map_err(database("commit"))?;
        Ok(saved)
    }

    /// Advance `revision` and link every attachment to the new revision.
    ///
    /// Attachments already on `revision` are carried over to the new revision
    /// first; a new attachment with the same name replaces the carried one.
    /// All or nothing: a conflict on advance or any failed attachment rolls
    /// back the new revision and every row written so far. Sources not yet
    /// reached when a failure happens are dropped unread.
    pub fn add_all(
        &self,
        revision: &DocumentRevision,
        attachments: Vec<Attachment>,
    ) -> AttachmentResult<DocumentRevision> {
        let _writer = self.lock()?;
        let txn = self.datastore.begin_write()?;
        let next =
            self.datastore
                .advance(&txn, &revision.doc_id, &revision.rev_id, &revision.body)?;
        metadata::carry_forward(&txn, revision.sequence, next.sequence)?;

        let count = attachments.len();
        for attachment in attachments {
            self.link(&txn, &next, attachment)?;
        }
        txn.commit().map_err(database("commit"))?;

        info!(
            doc_id = %next.doc_id,
            rev = %next.rev_id,
            attachments = count,
            "added attachments"
        );
        Ok(next)
    }

    /// Stage, link, and place one attachment inside `txn`.
    fn link(
        &self,
        txn: &WriteTransaction,
        revision: &DocumentRevision,
        attachment: Attachment,
    ) -> AttachmentResult<SavedAttachment> {
        let Attachment {
            name,
            mime_type,
            source,
        } = attachment;
        let staged = self.blobs.stage(source.into_reader()?)?;

        let row = AttachmentRow {
            sequence: revision.sequence,
            filename: name,
            key: staged.key(),
            mime_type,
            encoding: Encoding::Plain,
            length: staged.length(),
            encoded_length: staged.length(),
            revpos: revision.generation(),
        };

        // Rows carried over from an earlier revision are re-linked, not duplicated.
        metadata::delete_row(txn, row.sequence, &row.filename)?;
        if let Err(e) = metadata::insert_row(txn, &row) {
            error!(
                filename = %row.filename,
                sequence = row.sequence,
                error = %e,
                "could not insert attachment row; discarding staged blob"
            );
            return Err(e);
        }

        let key = staged.key();
        let path = staged.commit(&self.blobs).map_err(|e| {
            error!(
                filename = %row.filename,
                key = %key,
                error = %e,
                "could not move blob into place; aborting"
            );
            e
        })?;
        debug!(filename = %row.filename, sequence = row.sequence, key = %row.key, "linked attachment");
        Ok(SavedAttachment::from_row(row, path))
    }

    /// The attachment called `name` on `revision`.
    ///
    /// The blob file is not checked.
    pub fn get(
        &self,
        revision: &DocumentRevision,
        name: &str,
    ) -> AttachmentResult<Option<SavedAttachment>> {
        let txn = self.datastore.begin_read()?;
        let row = metadata::get_row(&txn, revision.sequence, name)?;
        Ok(row.map(|row| self.resolve(row)))
    }

    /// Every attachment on `revision`, ordered by name.
    pub fn list(&self, revision: &DocumentRevision) -> AttachmentResult<Vec<SavedAttachment>> {
        let txn = self.datastore.begin_read()?;
        let rows = metadata::rows_for_sequence(&txn, revision.sequence)?;
        Ok(rows.into_iter().map(|row| self.resolve(row)).collect())
    }

    fn resolve(&self, row: AttachmentRow) -> SavedAttachment {
        let path = self.blobs.path_for(&row.key);
        SavedAttachment::from_row(row, path)
    }

    /// Unlink the named attachments from `revision`.
    ///
    /// When nothing matched, `revision` is returned unchanged. Otherwise the
    /// document advances to a new revision in the same transaction, carrying
    /// the remaining attachments with it, and that revision is returned.
    pub fn remove<S: AsRef<str>>(
        &self,
        revision: &DocumentRevision,
        names: &[S],
    ) -> AttachmentResult<DocumentRevision> {
        let _writer = self.lock()?;
        let txn = self.datastore.begin_write()?;
        let deleted = metadata::delete_rows(&txn, revision.sequence, names)?;

        if deleted == 0 {
            let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
            warn!(
                doc_id = %revision.doc_id,
                rev = %revision.rev_id,
                ?names,
                "no attachments were removed"
            );
            txn.abort().map_err(database("abort"))?;
            return Ok(revision.clone());
        }

        let next =
            self.datastore
                .advance(&txn, &revision.doc_id, &revision.rev_id, &revision.body)?;
        metadata::carry_forward(&txn, revision.sequence, next.sequence)?;
        txn.commit().map_err(database("commit"))?;

        info!(doc_id = %next.doc_id, rev = %next.rev_id, removed = deleted, "removed attachments");
        Ok(next)
    }
}
