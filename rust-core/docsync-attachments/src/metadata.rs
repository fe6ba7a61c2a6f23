// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `attachments` metadata table.
//
// One row per (filename, owning revision). Keys are
// `sequence (8 bytes, big-endian) ++ filename`, so every row of a revision
// sits in one contiguous key range:
//
//   00 00 00 00 00 00 00 07 | a.txt   -> {"sequence":7,"filename":"a.txt",...}
//   00 00 00 00 00 00 00 07 | b.png   -> {...}
//   00 00 00 00 00 00 00 09 | a.txt   -> {...}
//
// An exact key answers `(filename, sequence)`; a prefix scan answers
// `(sequence)`. Values are JSON.

use std::collections::HashSet;

use redb::{ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};

use crate::attachment::Encoding;
use crate::content::ContentKey;
use crate::error::{database, AttachmentError, AttachmentResult};

pub(crate) const ATTACHMENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("attachments");

/// A persisted attachment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRow {
    pub sequence: u64,
    pub filename: String,
    pub key: ContentKey,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub encoding: Encoding,
    pub length: u64,
    pub encoded_length: u64,
    pub revpos: u64,
}

impl AttachmentRow {
    /// Column constraints enforced on insert.
    fn check(&self) -> AttachmentResult<()> {
        if self.filename.is_empty() {
            return Err(AttachmentError::InvalidRow(format!(
                "empty filename at sequence {}",
                self.sequence
            )));
        }
        if self.mime_type.is_empty() {
            return Err(AttachmentError::InvalidRow(format!(
                "empty type for {:?} at sequence {}",
                self.filename, self.sequence
            )));
        }
        Ok(())
    }
}

fn sequence_prefix(sequence: u64) -> [u8; 8] {
    sequence.to_be_bytes()
}

pub(crate) fn row_key(sequence: u64, filename: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + filename.len());
    key.extend_from_slice(&sequence_prefix(sequence));
    key.extend_from_slice(filename.as_bytes());
    key
}

fn decode(bytes: &[u8]) -> AttachmentResult<AttachmentRow> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Create the table if it doesn't exist. Caller commits.
pub(crate) fn init(txn: &WriteTransaction) -> AttachmentResult<()> {
    txn.open_table(ATTACHMENTS).map_err(database("open attachments"))?;
    Ok(())
}

/// Delete one row. Returns whether it existed.
pub(crate) fn delete_row(
    txn: &WriteTransaction,
    sequence: u64,
    filename: &str,
) -> AttachmentResult<bool> {
    let mut table = txn.open_table(ATTACHMENTS).map_err(database("open attachments"))?;
    let key = row_key(sequence, filename);
    let existed = table
        .remove(key.as_slice())
        .map_err(database("remove attachment"))?
        .is_some();
    Ok(existed)
}

/// Delete every named row at `sequence`. Returns how many existed.
pub(crate) fn delete_rows<S: AsRef<str>>(
    txn: &WriteTransaction,
    sequence: u64,
    filenames: &[S],
) -> AttachmentResult<usize> {
    let mut deleted = 0;
    for filename in filenames {
        if delete_row(txn, sequence, filename.as_ref())? {
            deleted += 1;
        }
    }
    Ok(deleted)
}

pub(crate) fn insert_row(txn: &WriteTransaction, row: &AttachmentRow) -> AttachmentResult<()> {
    row.check()?;
    let bytes = serde_json::to_vec(row)?;
    let key = row_key(row.sequence, &row.filename);
    let mut table = txn.open_table(ATTACHMENTS).map_err(database("open attachments"))?;
    table
        .insert(key.as_slice(), bytes.as_slice())
        .map_err(database("insert attachment"))?;
    Ok(())
}

pub(crate) fn get_row(
    txn: &ReadTransaction,
    sequence: u64,
    filename: &str,
) -> AttachmentResult<Option<AttachmentRow>> {
    let table = txn.open_table(ATTACHMENTS).map_err(database("open attachments"))?;
    let key = row_key(sequence, filename);
    let row = table
        .get(key.as_slice())
        .map_err(database("get attachment"))?
        .map(|guard| decode(guard.value()))
        .transpose()?;
    Ok(row)
}

/// All rows owned by `sequence`, in filename byte order.
pub(crate) fn rows_for_sequence(
    txn: &ReadTransaction,
    sequence: u64,
) -> AttachmentResult<Vec<AttachmentRow>> {
    let table = txn.open_table(ATTACHMENTS).map_err(database("open attachments"))?;
    scan_sequence(&table, sequence)
}

/// Copy every row at `from` to `to`, keeping each row's revpos. Returns how
/// many rows were copied.
pub(crate) fn carry_forward(txn: &WriteTransaction, from: u64, to: u64) -> AttachmentResult<usize> {
    let mut table = txn.open_table(ATTACHMENTS).map_err(database("open attachments"))?;
    let rows = scan_sequence(&table, from)?;
    let copied = rows.len();
    for mut row in rows {
        row.sequence = to;
        let bytes = serde_json::to_vec(&row)?;
        let key = row_key(to, &row.filename);
        table
            .insert(key.as_slice(), bytes.as_slice())
            .map_err(database("insert attachment"))?;
    }
    Ok(copied)
}

fn scan_sequence<T>(table: &T, sequence: u64) -> AttachmentResult<Vec<AttachmentRow>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let prefix = sequence_prefix(sequence);
    let iter = table
        .range(prefix.as_slice()..)
        .map_err(database("attachment scan"))?;

    let mut rows = Vec::new();
    for entry in iter {
        let (key, value) = entry.map_err(database("attachment entry"))?;
        // Stop when keys leave this sequence's range
        if !key.value().starts_with(&prefix) {
            break;
        }
        rows.push(decode(value.value())?);
    }
    Ok(rows)
}

/// Every content key referenced by any row, store-wide.
pub(crate) fn referenced_keys(txn: &ReadTransaction) -> AttachmentResult<HashSet<ContentKey>> {
    let table = txn.open_table(ATTACHMENTS).map_err(database("open attachments"))?;
    let mut keys = HashSet::new();
    for entry in table.iter().map_err(database("attachment scan"))? {
        let (_, value) = entry.map_err(database("attachment entry"))?;
        keys.insert(decode(value.value())?.key);
    }
    Ok(keys)
}
