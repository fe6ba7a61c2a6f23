// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attachment values: the unsaved form a caller hands in, and the saved form
// resolved from a metadata row.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::content::ContentKey;
use crate::error::{AttachmentError, AttachmentResult};
use crate::metadata::AttachmentRow;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// How a blob's bytes are encoded on disk. Stored as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Encoding {
    #[default]
    Plain,
    /// Reserved. Nothing writes gzip blobs yet.
    Gzip,
}

impl From<Encoding> for u8 {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Plain => 0,
            Encoding::Gzip => 1,
        }
    }
}

impl TryFrom<u8> for Encoding {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Encoding::Plain),
            1 => Ok(Encoding::Gzip),
            other => Err(format!("unknown attachment encoding {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Where an unsaved attachment's bytes come from.
pub enum AttachmentSource {
    Bytes(Vec<u8>),
    File(PathBuf),
    Reader(Box<dyn Read + Send>),
}

impl AttachmentSource {
    /// Turn the source into a single-pass reader.
    pub(crate) fn into_reader(self) -> io::Result<Box<dyn Read + Send>> {
        Ok(match self {
            AttachmentSource::Bytes(bytes) => Box::new(Cursor::new(bytes)),
            AttachmentSource::File(path) => Box::new(File::open(path)?),
            AttachmentSource::Reader(reader) => reader,
        })
    }
}

impl fmt::Debug for AttachmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            AttachmentSource::File(path) => write!(f, "File({})", path.display()),
            AttachmentSource::Reader(_) => f.write_str("Reader"),
        }
    }
}

/// An attachment that has not been saved yet.
///
/// The source is consumed when the attachment is added, whether or not the
/// add succeeds.
#[derive(Debug)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub source: AttachmentSource,
}

impl Attachment {
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: AttachmentSource::Bytes(bytes.into()),
        }
    }

    pub fn from_file(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: AttachmentSource::File(path.into()),
        }
    }

    pub fn from_reader(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        reader: impl Read + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: AttachmentSource::Reader(Box::new(reader)),
        }
    }
}

// ---------------------------------------------------------------------------
// SavedAttachment
// ---------------------------------------------------------------------------

/// An attachment linked to a stored revision.
///
/// `path` is where the blob lives. The file is not checked when the handle
/// is built; [`SavedAttachment::open`] reports a missing blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAttachment {
    pub name: String,
    /// Generation of the revision the attachment was introduced at.
    pub revpos: u64,
    /// Sequence of the owning revision.
    pub sequence: u64,
    pub key: ContentKey,
    pub mime_type: String,
    pub encoding: Encoding,
    pub length: u64,
    pub encoded_length: u64,
    pub path: PathBuf,
}

impl SavedAttachment {
    pub(crate) fn from_row(row: AttachmentRow, path: PathBuf) -> Self {
        Self {
            name: row.filename,
            revpos: row.revpos,
            sequence: row.sequence,
            key: row.key,
            mime_type: row.mime_type,
            encoding: row.encoding,
            length: row.length,
            encoded_length: row.encoded_length,
            path,
        }
    }

    /// Open the blob for reading.
    pub fn open(&self) -> AttachmentResult<File> {
        File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AttachmentError::BlobUnavailable {
                key: self.key.to_hex(),
                path: self.path.clone(),
            },
            _ => AttachmentError::Io(e),
        })
    }

    pub fn read_to_vec(&self) -> AttachmentResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(usize::try_from(self.length).unwrap_or(0));
        self.open()?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_ordinals() {
        assert_eq!(serde_json::to_string(&Encoding::Plain).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Encoding::Gzip).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Encoding>("1").unwrap(), Encoding::Gzip);
        assert!(serde_json::from_str::<Encoding>("7").is_err());
    }

    #[test]
    fn test_sources_read_fully() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.bin");
        std::fs::write(&file, b"from file").unwrap();

        let sources = [
            (AttachmentSource::Bytes(b"from bytes".to_vec()), &b"from bytes"[..]),
            (AttachmentSource::File(file), &b"from file"[..]),
            (
                AttachmentSource::Reader(Box::new(Cursor::new(b"from reader".to_vec()))),
                &b"from reader"[..],
            ),
        ];
        for (source, expected) in sources {
            let mut out = Vec::new();
            source.into_reader().unwrap().read_to_end(&mut out).unwrap();
            assert_eq!(out, expected);
        }
    }

    #[test]
    fn test_missing_source_file() {
        let source = AttachmentSource::File(PathBuf::from("/definitely/not/here"));
        assert!(source.into_reader().is_err());
    }

    #[test]
    fn test_open_missing_blob_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let key = ContentKey::digest(b"gone");
        let saved = SavedAttachment {
            name: "a.txt".into(),
            revpos: 1,
            sequence: 1,
            key,
            mime_type: "text/plain".into(),
            encoding: Encoding::Plain,
            length: 4,
            encoded_length: 4,
            path: dir.path().join(key.to_hex()),
        };
        assert!(matches!(
            saved.read_to_vec(),
            Err(AttachmentError::BlobUnavailable { .. })
        ));
    }
}
