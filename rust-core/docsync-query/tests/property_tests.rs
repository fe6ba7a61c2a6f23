// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for selector normalization

use proptest::prelude::*;
use serde_json::{json, Map, Value as Json};

use docsync_query::{normalize, Selector, SelectorError, Value};

/// Generate field names that never collide with operators
fn arb_field() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

/// Generate comparable operands
fn arb_operand() -> impl Strategy<Value = Json> {
    prop_oneof![
        any::<i64>().prop_map(Json::from),
        "[A-Za-z0-9 ]{0,12}".prop_map(Json::from),
    ]
}

/// Generate a predicate: bare value, explicit operator, or a $not chain
fn arb_predicate() -> impl Strategy<Value = Json> {
    let op = prop_oneof![
        Just("$eq"),
        Just("$ne"),
        Just("$lt"),
        Just("$lte"),
        Just("$gt"),
        Just("$gte"),
    ];
    prop_oneof![
        arb_operand(),
        (op, arb_operand(), 0usize..5).prop_map(|(op, operand, nots)| {
            let mut predicate = json!({ op: operand });
            for _ in 0..nots {
                predicate = json!({ "$not": predicate });
            }
            predicate
        }),
        any::<bool>().prop_map(|b| json!({ "$exists": b })),
    ]
}

/// Generate a field map with at least one entry
fn arb_fields() -> impl Strategy<Value = Json> {
    prop::collection::btree_map(arb_field(), arb_predicate(), 1..5)
        .prop_map(|fields| Json::Object(fields.into_iter().collect::<Map<_, _>>()))
}

/// Generate a well-formed query, optionally with nested compounds
fn arb_query() -> impl Strategy<Value = Json> {
    let clause = prop_oneof![
        arb_fields(),
        (prop_oneof![Just("$and"), Just("$or")], prop::collection::vec(arb_fields(), 1..3))
            .prop_map(|(op, items)| {
                let clauses: Vec<Json> = items
                    .into_iter()
                    .flat_map(|fields| match fields {
                        Json::Object(map) => map
                            .into_iter()
                            .map(|(k, v)| json!({ k: v }))
                            .collect::<Vec<_>>(),
                        other => vec![other],
                    })
                    .collect();
                json!({ op: clauses })
            }),
    ];
    prop_oneof![
        arb_fields(),
        (prop_oneof![Just("$and"), Just("$or")], prop::collection::vec(clause, 1..4))
            .prop_map(|(op, clauses)| {
                let flattened: Vec<Json> = clauses
                    .into_iter()
                    .flat_map(|clause| match clause {
                        Json::Object(map) => map
                            .into_iter()
                            .map(|(k, v)| json!({ k: v }))
                            .collect::<Vec<_>>(),
                        other => vec![other],
                    })
                    .collect();
                json!({ op: flattened })
            }),
    ]
}

proptest! {
    #[test]
    fn test_generated_queries_are_accepted(query in arb_query()) {
        let raw = Value::from(query);
        prop_assert!(normalize(&raw).is_ok(), "rejected: {}", raw);
    }

    #[test]
    fn test_normalize_is_idempotent(query in arb_query()) {
        let once = normalize(&Value::from(query)).unwrap();
        let twice = normalize(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_selector_lowers_to_normalized_form(query in arb_query()) {
        let raw = Value::from(query);
        let selector = Selector::parse(&raw).unwrap();
        prop_assert_eq!(selector.to_value(), normalize(&raw).unwrap());
    }

    #[test]
    fn test_not_chain_parity(field in arb_field(), operand in arb_operand(), nots in 0usize..8) {
        let mut predicate = json!({ "$eq": operand.clone() });
        for _ in 0..nots {
            predicate = json!({ "$not": predicate });
        }
        let normalized = normalize(&Value::from(json!({ field.clone(): predicate }))).unwrap();

        let expected = if nots % 2 == 0 {
            json!({ "$and": [{ field: { "$eq": operand } }] })
        } else {
            json!({ "$and": [{ field: { "$not": { "$eq": operand } } }] })
        };
        prop_assert_eq!(normalized, Value::from(expected));
    }

    #[test]
    fn test_ne_chain_parity(field in arb_field(), operand in arb_operand(), nots in 0usize..8) {
        let mut predicate = json!({ "$ne": operand.clone() });
        for _ in 0..nots {
            predicate = json!({ "$not": predicate });
        }
        let normalized = normalize(&Value::from(json!({ field.clone(): predicate }))).unwrap();

        let expected = if nots % 2 == 0 {
            json!({ "$and": [{ field: { "$not": { "$eq": operand } } }] })
        } else {
            json!({ "$and": [{ field: { "$eq": operand } }] })
        };
        prop_assert_eq!(normalized, Value::from(expected));
    }

    #[test]
    fn test_fraction_anywhere_rejects(
        query in arb_query(),
        whole in any::<i32>(),
        field in arb_field(),
    ) {
        let fraction = f64::from(whole) + 0.5;
        let poisoned = match query {
            Json::Object(mut map) => {
                if let Some((op, Json::Array(clauses))) = map.iter_mut().next() {
                    if op.starts_with('$') {
                        clauses.push(json!({ field.clone(): { "$lt": fraction } }));
                    }
                }
                if !map.keys().any(|k| k.starts_with('$')) {
                    map.insert(field, json!(fraction));
                }
                Json::Object(map)
            }
            other => other,
        };
        prop_assert!(matches!(
            normalize(&Value::from(poisoned)),
            Err(SelectorError::FractionalNumber(_))
        ));
    }

    #[test]
    fn test_implicit_and_keeps_every_field(fields in arb_fields()) {
        let expected_fields: Vec<String> = fields.as_object().unwrap().keys().cloned().collect();
        let normalized = normalize(&Value::from(fields)).unwrap();
        let clauses = normalized.get("$and").and_then(Value::as_list).unwrap();
        let got: Vec<String> = clauses
            .iter()
            .map(|clause| clause.as_single_entry().unwrap().0.to_string())
            .collect();
        prop_assert_eq!(got, expected_fields);
    }
}
