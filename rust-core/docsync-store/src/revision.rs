// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document revisions.
//
// A revision id has the form `<generation>-<digest>`. The generation counts
// revisions along the chain starting at 1; the digest is the first 16 bytes
// of SHA-256 over the parent id and the body, hex encoded. Each revision also
// gets a store-wide sequence number that other tables (attachments) key on.

use std::fmt;
use std::str::FromStr;

use redb::WriteTransaction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{StoreError, StoreResult};

/// Identifier of one revision of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId {
    generation: u64,
    digest: String,
}

impl RevisionId {
    /// Derive the id of the revision following `parent` with `body`.
    pub fn derive(parent: Option<&RevisionId>, body: &serde_json::Value) -> StoreResult<Self> {
        let generation = parent.map_or(1, |p| p.generation + 1);

        let mut hasher = Sha256::new();
        if let Some(parent) = parent {
            hasher.update(parent.to_string().as_bytes());
        }
        hasher.update(serde_json::to_vec(body)?);
        let hash = hasher.finalize();

        Ok(Self {
            generation,
            digest: hex::encode(&hash[..16]),
        })
    }

    /// Position of this revision along its chain, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.generation, self.digest)
    }
}

impl FromStr for RevisionId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidRevision(s.to_string());
        let (generation, digest) = s.split_once('-').ok_or_else(invalid)?;
        let generation: u64 = generation.parse().map_err(|_| invalid())?;
        if generation == 0 || digest.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            generation,
            digest: digest.to_string(),
        })
    }
}

impl TryFrom<String> for RevisionId {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RevisionId> for String {
    fn from(id: RevisionId) -> Self {
        id.to_string()
    }
}

/// One stored revision of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRevision {
    /// Document identifier.
    pub doc_id: String,
    /// This revision's id.
    pub rev_id: RevisionId,
    /// The revision this one was derived from, if any.
    pub parent: Option<RevisionId>,
    /// Store-wide sequence number assigned when the revision was written.
    pub sequence: u64,
    /// Document body.
    pub body: serde_json::Value,
}

impl DocumentRevision {
    pub fn generation(&self) -> u64 {
        self.rev_id.generation()
    }
}

impl fmt::Display for DocumentRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} (seq {})", self.doc_id, self.rev_id, self.sequence)
    }
}

/// Advances a document's revision chain.
///
/// Implementations write inside the caller's transaction, so an advance is
/// discarded if that transaction is dropped without committing.
pub trait RevisionStore {
    /// Append a new revision with `body` after `parent`.
    ///
    /// Fails with [`StoreError::Conflict`] if `parent` is not the document's
    /// current revision, and [`StoreError::DocumentNotFound`] if the document
    /// does not exist.
    fn advance(
        &self,
        txn: &WriteTransaction,
        doc_id: &str,
        parent: &RevisionId,
        body: &serde_json::Value,
    ) -> StoreResult<DocumentRevision>;
}
