// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Selector normalization.
//
// Rewrites a raw selector into its single canonical shape:
//
// ```text
// {"name": "mike", "age": {"$not": {"$not": {"$ne": 12}}}}
//   -> {"$and": [{"name": {"$eq": "mike"}}, {"age": {"$not": {"$eq": 12}}}]}
// ```
//
// Every step is a small total function over `Value`. A step that does not
// recognise the shape it is handed returns it unchanged and leaves the
// rejection to the validator, which always runs last.

use tracing::{debug, error};

use crate::error::{SelectorError, SelectorResult};
use crate::operator::{is_operator, shorthand_target, AND, EQ, NOT};
use crate::validate::validate;
use crate::value::{Number, Value};

/// Normalize and validate a raw selector.
///
/// The empty map is the wildcard selector: it is returned as-is and never
/// validated. Anything else comes back as a single `$and`/`$or` compound
/// whose field clauses each carry exactly one explicit operator.
pub fn normalize(raw: &Value) -> SelectorResult<Value> {
    if let Some(number) = find_fractional(raw) {
        error!(query = %raw, %number, "invalid value encountered in query");
        return Err(SelectorError::FractionalNumber(number.to_string()));
    }

    if raw.is_empty_map() {
        debug!("wildcard selector");
        return Ok(Value::empty_map());
    }

    let query = add_implicit_and(raw);
    let query = match query.as_single_entry() {
        Some((op, Value::List(clauses))) => {
            let clauses = collapse_not_operators(&add_implicit_eq(clauses));
            Value::single(op, Value::List(clauses))
        }
        _ => query,
    };

    if let Err(rejection) = validate(&query) {
        error!(query = %raw, %rejection, "selector failed validation");
        return Err(rejection.into());
    }

    Ok(query)
}

/// Return the first fractional number found anywhere in `value`.
pub fn find_fractional(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) if n.is_fractional() => Some(*n),
        Value::List(items) => items.iter().find_map(find_fractional),
        Value::Map(entries) => entries.iter().find_map(|(_, v)| find_fractional(v)),
        _ => None,
    }
}

/// Wrap a top-level field map in an implicit `$and`.
///
/// `{"a": 1, "b": 2}` becomes `{"$and": [{"a": 1}, {"b": 2}]}`. A query with
/// any operator key at the top level (a lone `$and`/`$or` included) is
/// returned as-is; only a lone `$and`/`$or` then passes validation.
pub fn add_implicit_and(query: &Value) -> Value {
    let Value::Map(entries) = query else {
        return query.clone();
    };

    if entries.iter().any(|(key, _)| is_operator(key)) {
        return query.clone();
    }

    let clauses = entries
        .iter()
        .map(|(field, value)| Value::single(field.clone(), value.clone()))
        .collect();
    Value::single(AND, Value::List(clauses))
}

/// Give every bare field value an explicit `$eq`, recursing into nested
/// compounds.
pub fn add_implicit_eq(clauses: &[Value]) -> Vec<Value> {
    clauses.iter().map(implicit_eq_clause).collect()
}

fn implicit_eq_clause(clause: &Value) -> Value {
    let Some((key, predicate)) = clause.as_single_entry() else {
        return clause.clone();
    };

    if !is_operator(key) {
        if predicate.is_map() {
            return clause.clone();
        }
        return Value::single(key, Value::single(EQ, predicate.clone()));
    }

    match predicate {
        Value::List(nested) => Value::single(key, Value::List(add_implicit_eq(nested))),
        _ => clause.clone(),
    }
}

/// Collapse `$not` chains and expand negated shorthands in every field
/// clause, recursing into nested compounds.
pub fn collapse_not_operators(clauses: &[Value]) -> Vec<Value> {
    clauses.iter().map(collapse_clause).collect()
}

fn collapse_clause(clause: &Value) -> Value {
    let Some((key, predicate)) = clause.as_single_entry() else {
        return clause.clone();
    };

    if is_operator(key) {
        return match predicate {
            Value::List(nested) => Value::single(key, Value::List(collapse_not_operators(nested))),
            _ => clause.clone(),
        };
    }

    Value::single(key, collapse_predicate(predicate))
}

/// Canonicalize a single field predicate such as `{"$not": {"$ne": 1}}`.
pub fn collapse_predicate(predicate: &Value) -> Value {
    let Some((op, operand)) = predicate.as_single_entry() else {
        return predicate.clone();
    };

    if shorthand_target(op).is_some() {
        return replace_shorthand(predicate);
    }
    if op != NOT {
        return predicate.clone();
    }

    let (innermost, invert) = unwrap_not_chain(operand);
    let collapsed = if invert {
        innermost.clone()
    } else {
        Value::single(NOT, innermost.clone())
    };
    replace_shorthand(&collapsed)
}

/// Walk the operand of an outer `$not` through any further `$not` levels.
///
/// Returns the first non-`$not` operator map and whether an odd number of
/// extra `$not` levels were peeled off (in which case the outer `$not` is
/// cancelled too). A chain that bottoms out in something other than an
/// operator map is left untouched.
fn unwrap_not_chain(operand: &Value) -> (&Value, bool) {
    let mut current = operand;
    let mut invert = false;

    loop {
        match current.as_single_entry() {
            Some((op, inner)) if op == NOT => {
                invert = !invert;
                current = inner;
            }
            Some(_) => return (current, invert),
            None => return (operand, false),
        }
    }
}

/// Expand negated shorthand operators.
///
/// `{"$ne": v}` becomes `{"$not": {"$eq": v}}` and `{"$not": {"$ne": v}}`
/// becomes `{"$eq": v}`. Other predicates are returned unchanged.
pub fn replace_shorthand(predicate: &Value) -> Value {
    let Some((op, operand)) = predicate.as_single_entry() else {
        return predicate.clone();
    };

    if let Some(positive) = shorthand_target(op) {
        return Value::single(NOT, Value::single(positive, operand.clone()));
    }

    if op == NOT {
        if let Some((inner, value)) = operand.as_single_entry() {
            if let Some(positive) = shorthand_target(inner) {
                return Value::single(positive, value.clone());
            }
        }
    }

    predicate.clone()
}
