// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Store error types for docsync.
//
// Covers the failure modes of the embedded document store: I/O, the
// underlying redb engine, row serialization, and revision chain conflicts.

use thiserror::Error;

/// Errors that can occur when reading or writing the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred in the underlying storage layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded database reported an error (open, transaction, table,
    /// or commit).
    #[error("database error: {0}")]
    Database(String),

    /// Failed to serialize or deserialize a stored row.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The parent revision given for an update is not the document's current
    /// revision.
    #[error("conflict on document {doc_id}: parent {parent} is not current revision {current}")]
    Conflict {
        /// The document being updated.
        doc_id: String,
        /// The parent revision the caller supplied.
        parent: String,
        /// The document's actual current revision.
        current: String,
    },

    /// No document exists with the given id.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// A document with the given id already exists.
    #[error("document already exists: {0}")]
    DocumentExists(String),

    /// A revision id is not of the form `<generation>-<digest>`.
    #[error("invalid revision id: {0}")]
    InvalidRevision(String),

    /// The store configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether this error is a revision conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Convenience type alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
