// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content keys: the SHA-256 digest that names a blob file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AttachmentError;

/// Length of a content key in bytes.
pub const KEY_LEN: usize = 32;

/// SHA-256 digest of an attachment's bytes.
///
/// Stored in rows as lowercase hex, which is also the blob's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentKey([u8; KEY_LEN]);

impl ContentKey {
    /// Hash a complete byte slice.
    pub fn digest(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub(crate) fn from_hasher(hasher: Sha256) -> Self {
        Self(hasher.finalize().into())
    }

    /// Parse a blob file name. Only the exact lowercase form produced by
    /// [`ContentKey::to_hex`] is accepted.
    pub fn from_hex(name: &str) -> Result<Self, AttachmentError> {
        if name.len() != KEY_LEN * 2 || name.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(AttachmentError::InvalidKey(name.to_string()));
        }
        let mut bytes = [0u8; KEY_LEN];
        hex::decode_to_slice(name, &mut bytes)
            .map_err(|_| AttachmentError::InvalidKey(name.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentKey {
    type Err = AttachmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for ContentKey {
    type Error = AttachmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ContentKey> for String {
    fn from(key: ContentKey) -> Self {
        key.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let key = ContentKey::digest(b"abc");
        assert_eq!(
            key.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hex_round_trip() {
        let key = ContentKey::digest(b"hello");
        assert_eq!(ContentKey::from_hex(&key.to_hex()).unwrap(), key);
        assert_eq!(key.to_string().parse::<ContentKey>().unwrap(), key);
    }

    #[test]
    fn test_rejects_foreign_names() {
        let upper = "A".repeat(64);
        let not_hex = "zz".repeat(32);
        for name in ["", "temp1234", "abc", upper.as_str(), not_hex.as_str()] {
            assert!(ContentKey::from_hex(name).is_err(), "{name:?} should not parse");
        }
    }

    #[test]
    fn test_serializes_as_hex_string() {
        let key = ContentKey::digest(b"x");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key.to_hex()));
        let back: ContentKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
