// SPDX-License-Identifier: PMPL-1.0-or-later
//! Structural and type validation of canonical selectors.
//!
//! Validation is pure and total: it never panics, it stops at the first rule
//! a selector breaks, and it reports that rule as a [`ValidationError`].

use tracing::debug;

use crate::error::ValidationError;
use crate::operator::{is_operator, AND, EXISTS, FIELD_OPERATORS, NOT, OR};
use crate::value::Value;

/// Validate a canonical selector.
///
/// The outermost map must hold a single `$and` or `$or` over a non-empty
/// list of clauses. The wildcard (`{}`) is not a canonical compound and is
/// rejected here; callers route it around validation.
pub fn validate(selector: &Value) -> Result<(), ValidationError> {
    let Some((op, operand)) = selector.as_single_entry() else {
        return Err(ValidationError::TopLevel {
            found: selector.to_string(),
        });
    };

    if op != AND && op != OR {
        return Err(ValidationError::TopLevel {
            found: op.to_string(),
        });
    }

    validate_clauses(op, compound_operand(op, operand)?)
}

/// Like [`validate`], but only reports pass/fail. The reason is logged.
pub fn is_valid(selector: &Value) -> bool {
    match validate(selector) {
        Ok(()) => true,
        Err(rejection) => {
            debug!(%selector, %rejection, "selector is not valid");
            false
        }
    }
}

fn compound_operand<'a>(op: &str, operand: &'a Value) -> Result<&'a [Value], ValidationError> {
    operand
        .as_list()
        .ok_or_else(|| ValidationError::CompoundOperand {
            op: op.to_string(),
            found: operand.to_string(),
        })
}

fn validate_clauses(op: &str, clauses: &[Value]) -> Result<(), ValidationError> {
    if clauses.is_empty() {
        return Err(ValidationError::EmptyCompound { op: op.to_string() });
    }
    clauses.iter().try_for_each(validate_clause)
}

fn validate_clause(clause: &Value) -> Result<(), ValidationError> {
    let Some(entries) = clause.as_map() else {
        return Err(ValidationError::ClauseNotMap {
            clause: clause.to_string(),
        });
    };
    if entries.len() != 1 {
        return Err(ValidationError::ClauseArity {
            clause: clause.to_string(),
            keys: entries.len(),
        });
    }

    let (key, value) = &entries[0];
    match key.as_str() {
        AND | OR | NOT => validate_clauses(key, compound_operand(key, value)?),
        op if is_operator(op) => Err(ValidationError::MisplacedOperator { op: op.to_string() }),
        field => validate_predicate(field, value, false),
    }
}

/// Check a field predicate: one known operator mapped to a usable operand.
/// `$not` is allowed one level deep and must wrap another operator map.
fn validate_predicate(field: &str, predicate: &Value, negated: bool) -> Result<(), ValidationError> {
    let Some(entries) = predicate.as_map() else {
        return Err(ValidationError::PredicateNotMap {
            field: field.to_string(),
            found: predicate.kind().to_string(),
        });
    };
    if entries.len() != 1 {
        return Err(ValidationError::PredicateArity {
            field: field.to_string(),
            keys: entries.len(),
        });
    }

    let (op, operand) = &entries[0];
    if !FIELD_OPERATORS.contains(&op.as_str()) {
        return Err(ValidationError::UnknownOperator {
            field: field.to_string(),
            op: op.clone(),
        });
    }

    if op == NOT {
        if negated {
            return Err(ValidationError::NestedNot {
                field: field.to_string(),
            });
        }
        if !operand.is_map() {
            return Err(invalid_operand(field, op, operand));
        }
        return validate_predicate(field, operand, true);
    }

    if operand_fits(op, operand) {
        Ok(())
    } else {
        Err(invalid_operand(field, op, operand))
    }
}

fn operand_fits(op: &str, operand: &Value) -> bool {
    if op == EXISTS {
        return matches!(operand, Value::Bool(_));
    }
    match operand {
        Value::String(_) => true,
        Value::Number(n) => !n.is_fractional(),
        _ => false,
    }
}

fn invalid_operand(field: &str, op: &str, operand: &Value) -> ValidationError {
    ValidationError::InvalidOperand {
        field: field.to_string(),
        op: op.to_string(),
        found: operand.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(json: serde_json::Value) -> Result<(), ValidationError> {
        validate(&Value::from(json))
    }

    #[test]
    fn test_valid_selectors() {
        assert!(check(json!({"$and": [{"a": {"$eq": 1}}]})).is_ok());
        assert!(check(json!({"$or": [{"a": {"$lt": "m"}}, {"b": {"$gte": 2}}]})).is_ok());
        assert!(check(json!({"$and": [{"a": {"$not": {"$eq": 1}}}]})).is_ok());
        assert!(check(json!({"$and": [{"a": {"$ne": 1}}]})).is_ok());
        assert!(check(json!({"$and": [{"a": {"$exists": false}}]})).is_ok());
        assert!(check(json!({"$and": [{"$or": [{"a": {"$eq": 1}}]}]})).is_ok());
        assert!(check(json!({"$and": [{"$not": [{"a": {"$eq": 1}}]}]})).is_ok());
    }

    #[test]
    fn test_top_level_must_be_compound() {
        assert!(matches!(
            check(json!({"$not": [{"a": {"$eq": 1}}]})),
            Err(ValidationError::TopLevel { .. })
        ));
        assert!(matches!(
            check(json!({"a": {"$eq": 1}})),
            Err(ValidationError::TopLevel { .. })
        ));
        assert!(matches!(check(json!({})), Err(ValidationError::TopLevel { .. })));
    }

    #[test]
    fn test_compound_operand_must_be_list() {
        assert!(matches!(
            check(json!({"$and": {"a": {"$eq": 1}}})),
            Err(ValidationError::CompoundOperand { .. })
        ));
        assert!(matches!(
            check(json!({"$and": [{"$not": {"a": {"$eq": 1}}}]})),
            Err(ValidationError::CompoundOperand { .. })
        ));
    }

    #[test]
    fn test_empty_compound_rejected() {
        assert!(matches!(
            check(json!({"$and": []})),
            Err(ValidationError::EmptyCompound { .. })
        ));
    }

    #[test]
    fn test_clause_shape() {
        assert!(matches!(
            check(json!({"$and": [1]})),
            Err(ValidationError::ClauseNotMap { .. })
        ));
        assert!(matches!(
            check(json!({"$and": [{"a": {"$eq": 1}, "b": {"$eq": 2}}]})),
            Err(ValidationError::ClauseArity { keys: 2, .. })
        ));
        assert!(matches!(
            check(json!({"$and": [{"$eq": 1}]})),
            Err(ValidationError::MisplacedOperator { .. })
        ));
    }

    #[test]
    fn test_predicate_shape() {
        assert!(matches!(
            check(json!({"$and": [{"a": 1}]})),
            Err(ValidationError::PredicateNotMap { .. })
        ));
        assert!(matches!(
            check(json!({"$and": [{"a": {"$eq": 1, "$lt": 2}}]})),
            Err(ValidationError::PredicateArity { keys: 2, .. })
        ));
        assert!(matches!(
            check(json!({"$and": [{"a": {"$regex": "x"}}]})),
            Err(ValidationError::UnknownOperator { .. })
        ));
        assert!(matches!(
            check(json!({"$and": [{"a": {"$not": {"$not": {"$eq": 1}}}}]})),
            Err(ValidationError::NestedNot { .. })
        ));
    }

    #[test]
    fn test_operand_types() {
        assert!(check(json!({"$and": [{"a": {"$eq": null}}]})).is_err());
        assert!(check(json!({"$and": [{"a": {"$eq": true}}]})).is_err());
        assert!(check(json!({"$and": [{"a": {"$eq": 1.5}}]})).is_err());
        assert!(check(json!({"$and": [{"a": {"$eq": [1]}}]})).is_err());
        assert!(check(json!({"$and": [{"a": {"$exists": "yes"}}]})).is_err());
        assert!(check(json!({"$and": [{"a": {"$not": 1}}]})).is_err());
    }

    #[test]
    fn test_short_circuits_on_first_failure() {
        let err = check(json!({"$and": [{"a": {"$bad": 1}}, {"b": {"$worse": 2}}]})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownOperator {
                field: "a".to_string(),
                op: "$bad".to_string()
            }
        );
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid(&Value::from(json!({"$or": [{"a": {"$gt": 0}}]}))));
        assert!(!is_valid(&Value::from(json!({"$or": []}))));
    }
}
