// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orphan blob collection.
//
// Liveness is decided by scanning the attachments table at collection time,
// not by reference counts. Any file in the blob directory whose name is not
// the hex key of some row is deleted, which also sweeps up staging files and
// blobs left behind by transactions that failed to commit. Entries that
// cannot be unlinked, such as foreign directories, are counted as failed and
// left in place.

use std::fs;
use std::sync::{Arc, Mutex};

use docsync_store::Datastore;
use tracing::{debug, info, warn};

use crate::blob::BlobStore;
use crate::content::ContentKey;
use crate::error::{AttachmentError, AttachmentResult};
use crate::metadata;

/// Counts from one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Files found in the blob directory.
    pub scanned: usize,
    /// Files still referenced by a row.
    pub retained: usize,
    pub deleted: usize,
    /// Orphans that could not be deleted.
    pub failed: usize,
}

/// Deletes blobs no attachment row references.
#[derive(Debug)]
pub struct BlobCollector {
    datastore: Arc<Datastore>,
    blobs: BlobStore,
    gate: Arc<Mutex<()>>,
}

impl BlobCollector {
    pub(crate) fn new(datastore: Arc<Datastore>, blobs: BlobStore, gate: Arc<Mutex<()>>) -> Self {
        Self {
            datastore,
            blobs,
            gate,
        }
    }

    /// Run one pass.
    ///
    /// Holds the writer gate for the whole pass, so no attachment can be
    /// added meanwhile. Failing to read the referenced keys aborts before
    /// anything is deleted; failing to delete one file is logged and the
    /// pass continues.
    pub fn collect(&self) -> AttachmentResult<CollectReport> {
        let _writer = self.gate.lock().map_err(|_| AttachmentError::LockPoisoned)?;

        let referenced = {
            let txn = self.datastore.begin_read()?;
            metadata::referenced_keys(&txn)?
        };

        let mut report = CollectReport::default();
        for path in self.blobs.list()? {
            report.scanned += 1;

            let live = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| ContentKey::from_hex(name).ok())
                .is_some_and(|key| referenced.contains(&key));
            if live {
                report.retained += 1;
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "deleted orphaned blob");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not delete orphaned blob");
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            retained = report.retained,
            deleted = report.deleted,
            failed = report.failed,
            "blob collection finished"
        );
        Ok(report)
    }
}
