// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for revision id and content key parsing

#![no_main]

use docsync_attachments::ContentKey;
use docsync_store::RevisionId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Blob file names parse back to exactly the same text
        if let Ok(key) = ContentKey::from_hex(s) {
            assert_eq!(key.to_hex(), s);
        }

        if let Ok(rev) = s.parse::<RevisionId>() {
            assert!(rev.generation() >= 1);
            assert!(!rev.digest().is_empty());
        }
    }
});
