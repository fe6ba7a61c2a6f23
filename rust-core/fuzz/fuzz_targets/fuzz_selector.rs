// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for selector normalization.
// Run with: cargo +nightly fuzz run fuzz_selector
//
// Feeds arbitrary JSON documents to the normalizer. It must never panic, and
// anything it accepts must be valid and already in canonical form.

#![no_main]

use docsync_query::{is_valid, normalize, Selector, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 4096 {
        return;
    }
    let Ok(raw) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let Ok(canonical) = normalize(&raw) else {
        return;
    };

    if !canonical.is_empty_map() {
        assert!(is_valid(&canonical), "accepted selector failed validation");
    }
    assert_eq!(
        normalize(&canonical).ok().as_ref(),
        Some(&canonical),
        "normalization is not idempotent"
    );
    let selector = Selector::from_canonical(&canonical).expect("canonical selector lifts");
    assert_eq!(selector.to_value(), canonical);
});
