// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-addressed blob directory.
//
// A flat directory with one file per distinct content key, named by the
// key's lowercase hex. New content is first written to a `temp<uuid>` file in
// the same directory, hashed while it is written, and later renamed into
// place. Staging in the blob directory keeps the final move a same-filesystem
// rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::content::ContentKey;
use crate::error::AttachmentResult;

/// Prefix of staging files. Never a valid content key.
pub const STAGING_PREFIX: &str = "temp";

/// Handle on the blob directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Use `dir` as the blob directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> AttachmentResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the blob for `key` lives (or will live).
    pub fn path_for(&self, key: &ContentKey) -> PathBuf {
        self.dir.join(key.to_hex())
    }

    /// Drain `reader` into a new staging file, hashing as it goes.
    ///
    /// The reader is consumed and dropped before this returns. On error the
    /// partial staging file is removed.
    pub fn stage(&self, reader: impl Read) -> AttachmentResult<StagedBlob> {
        let path = self
            .dir
            .join(format!("{STAGING_PREFIX}{}", Uuid::new_v4().simple()));

        match write_hashed(&path, reader) {
            Ok((key, length)) => {
                debug!(path = %path.display(), key = %key, length, "staged blob");
                Ok(StagedBlob {
                    path,
                    key,
                    length,
                    settled: false,
                })
            }
            Err(e) => {
                let _ = fs::remove_file(&path);
                Err(e.into())
            }
        }
    }

    /// Every entry in the blob directory, staging files and foreign entries
    /// included.
    pub fn list(&self) -> AttachmentResult<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }
}

fn write_hashed(path: &Path, mut reader: impl Read) -> io::Result<(ContentKey, u64)> {
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let mut writer = HashingWriter {
        inner: BufWriter::new(file),
        hasher: Sha256::new(),
    };
    let length = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;

    let HashingWriter { inner, hasher } = writer;
    let file: File = inner.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok((ContentKey::from_hasher(hasher), length))
}

/// Feeds every byte written through it into a SHA-256 hasher.
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// StagedBlob
// ---------------------------------------------------------------------------

/// A fully written staging file awaiting its final name.
///
/// Dropping it without [`StagedBlob::commit`] deletes the staging file.
#[derive(Debug)]
pub struct StagedBlob {
    path: PathBuf,
    key: ContentKey,
    length: u64,
    settled: bool,
}

impl StagedBlob {
    pub fn key(&self) -> ContentKey {
        self.key
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the staging file to its content-addressed name.
    ///
    /// If a blob with the same key already exists the staging copy is
    /// discarded instead. Returns the blob path. On error the staging file is
    /// removed when `self` drops.
    pub fn commit(mut self, blobs: &BlobStore) -> AttachmentResult<PathBuf> {
        let dest = blobs.path_for(&self.key);
        if dest.is_file() {
            fs::remove_file(&self.path)?;
            debug!(key = %self.key, "blob already stored, dropped staging copy");
        } else {
            fs::rename(&self.path, &dest)?;
            debug!(key = %self.key, path = %dest.display(), "stored blob");
        }
        self.settled = true;
        Ok(dest)
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        if !self.settled {
            let _ = fs::remove_file(&self.path);
        }
    }
}
