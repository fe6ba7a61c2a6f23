// SPDX-License-Identifier: PMPL-1.0-or-later
//! Performance benchmarks for docsync selectors and attachments

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::sync::Arc;

use docsync_attachments::{Attachment, AttachmentStore};
use docsync_query::{normalize, Selector, Value};
use docsync_store::{Datastore, DatastoreConfig};

// ============================================================================
// Selector Benchmarks
// ============================================================================

fn wide_selector(fields: usize) -> Value {
    let mut map = serde_json::Map::new();
    for i in 0..fields {
        let clause = match i % 3 {
            0 => json!(i),
            1 => json!({"$ne": format!("value-{i}")}),
            _ => json!({"$not": {"$not": {"$gte": i}}}),
        };
        map.insert(format!("field_{i}"), clause);
    }
    Value::from(serde_json::Value::Object(map))
}

fn deep_selector(depth: usize) -> Value {
    let mut node = json!({"leaf": {"$exists": true}});
    for i in 0..depth {
        let op = if i % 2 == 0 { "$and" } else { "$or" };
        let field = format!("f{i}");
        node = json!({ op: [node, { field: i }] });
    }
    Value::from(node)
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector");

    for fields in [1, 10, 100] {
        let raw = wide_selector(fields);
        group.throughput(Throughput::Elements(fields as u64));
        group.bench_with_input(BenchmarkId::new("normalize_wide", fields), &raw, |b, raw| {
            b.iter(|| black_box(normalize(raw).unwrap()))
        });
    }

    for depth in [4, 16, 64] {
        let raw = deep_selector(depth);
        group.bench_with_input(BenchmarkId::new("normalize_deep", depth), &raw, |b, raw| {
            b.iter(|| black_box(normalize(raw).unwrap()))
        });
    }

    let raw = wide_selector(20);
    group.bench_function("parse_selector", |b| {
        b.iter(|| black_box(Selector::parse(&raw).unwrap()))
    });

    group.finish();
}

// ============================================================================
// Attachment Benchmarks
// ============================================================================

fn bench_attachments(c: &mut Criterion) {
    let temp_dir = std::env::temp_dir().join(format!("bench-attach-{}", uuid::Uuid::new_v4()));
    let datastore = Arc::new(Datastore::open(DatastoreConfig::at(&temp_dir)).unwrap());
    let store = AttachmentStore::open(Arc::clone(&datastore)).unwrap();
    let rev = datastore.create_document("bench", &json!({})).unwrap();

    let mut group = c.benchmark_group("attachment");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let payload = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("add", size), &payload, |b, payload| {
            let mut i = 0u64;
            b.iter(|| {
                // Unique content per iteration so every add writes a new blob.
                let mut bytes = payload.clone();
                bytes[..8].copy_from_slice(&i.to_be_bytes());
                i += 1;
                black_box(
                    store
                        .add(&rev, Attachment::from_bytes("blob.bin", "application/octet-stream", bytes))
                        .unwrap(),
                )
            });
        });
    }

    group.bench_function("collect", |b| {
        b.iter(|| black_box(store.collector().collect().unwrap()))
    });

    group.finish();
    std::fs::remove_dir_all(&temp_dir).ok();
}

criterion_group!(selector_benches, bench_normalize);

criterion_group!(attachment_benches, bench_attachments);

criterion_main!(selector_benches, attachment_benches);
