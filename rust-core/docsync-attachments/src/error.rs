// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attachment error types for docsync.

use std::fmt::Display;
use std::path::PathBuf;

use docsync_store::StoreError;
use thiserror::Error;

/// Errors that can occur when adding, reading, removing, or collecting
/// attachments.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Staging, moving, reading, or deleting a blob file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded database reported an error on the attachments table.
    #[error("database error: {0}")]
    Database(String),

    /// Failed to serialize or deserialize an attachment row.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document store failed, including revision conflicts.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An attachment row violates the table's constraints.
    #[error("invalid attachment row: {0}")]
    InvalidRow(String),

    /// A content key is not 64 lowercase hex characters.
    #[error("invalid content key: {0:?}")]
    InvalidKey(String),

    /// The metadata row exists but its blob file has not landed yet (or was
    /// lost). Readers should treat this as transient.
    #[error("blob {key} is not available at {}", path.display())]
    BlobUnavailable {
        /// Hex content key of the missing blob.
        key: String,
        /// Where the blob was expected.
        path: PathBuf,
    },

    /// The writer gate was poisoned by a panicking holder.
    #[error("attachment writer lock poisoned")]
    LockPoisoned,
}

impl AttachmentError {
    /// Whether this error is a revision conflict from the document store.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AttachmentError::Store(e) if e.is_conflict())
    }
}

/// Convenience type alias for attachment results.
pub type AttachmentResult<T> = Result<T, AttachmentError>;

pub(crate) fn database<E: Display>(context: &'static str) -> impl Fn(E) -> AttachmentError {
    move |e| AttachmentError::Database(format!("{context}: {e}"))
}
