// SPDX-License-Identifier: PMPL-1.0-or-later
//! Typed canonical selector tree.
//!
//! The planner works from this tree rather than the raw map form. It can only
//! be built from a selector that normalized and validated cleanly, so `$ne`
//! and `$not`-of-`$not` are unrepresentable here.

use std::fmt;

use crate::error::{SelectorError, SelectorResult, ValidationError};
use crate::normalize::normalize;
use crate::operator::{shorthand_target, CompoundOp, Operator, AND, NOT, OR};
use crate::validate::validate;
use crate::value::{Number, Value};

/// A comparison operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Bool(bool),
    Int(i64),
    /// Integer above `i64::MAX`.
    UInt(u64),
    /// Integral float, e.g. `3.0`.
    Float(f64),
    String(String),
}

impl Operand {
    fn from_value(field: &str, op: &str, value: &Value) -> SelectorResult<Self> {
        match value {
            Value::Bool(b) => Ok(Operand::Bool(*b)),
            Value::Number(Number::Int(i)) => Ok(Operand::Int(*i)),
            Value::Number(Number::UInt(u)) => Ok(Operand::UInt(*u)),
            Value::Number(Number::Float(f)) if !Number::Float(*f).is_fractional() => {
                Ok(Operand::Float(*f))
            }
            Value::String(s) => Ok(Operand::String(s.clone())),
            other => Err(ValidationError::InvalidOperand {
                field: field.to_string(),
                op: op.to_string(),
                found: other.to_string(),
            }
            .into()),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Operand::Bool(b) => Value::Bool(*b),
            Operand::Int(i) => Value::Number(Number::Int(*i)),
            Operand::UInt(u) => Value::Number(Number::UInt(*u)),
            Operand::Float(f) => Value::Number(Number::Float(*f)),
            Operand::String(s) => Value::String(s.clone()),
        }
    }
}

/// One operator applied to one operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub op: Operator,
    pub operand: Operand,
}

/// A field predicate, possibly negated once.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Is(Condition),
    Not(Condition),
}

impl Predicate {
    pub fn condition(&self) -> &Condition {
        match self {
            Predicate::Is(c) | Predicate::Not(c) => c,
        }
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, Predicate::Not(_))
    }

    fn negate(self) -> Self {
        match self {
            Predicate::Is(c) => Predicate::Not(c),
            Predicate::Not(c) => Predicate::Is(c),
        }
    }

    fn from_value(field: &str, predicate: &Value) -> SelectorResult<Self> {
        let Some((op, operand)) = predicate.as_single_entry() else {
            return Err(ValidationError::PredicateNotMap {
                field: field.to_string(),
                found: predicate.kind().to_string(),
            }
            .into());
        };

        if op == NOT {
            return Ok(Self::from_value(field, operand)?.negate());
        }
        if let Some(positive) = shorthand_target(op) {
            let condition = Condition {
                op: positive.parse()?,
                operand: Operand::from_value(field, op, operand)?,
            };
            return Ok(Predicate::Not(condition));
        }

        Ok(Predicate::Is(Condition {
            op: op.parse()?,
            operand: Operand::from_value(field, op, operand)?,
        }))
    }

    fn to_value(&self) -> Value {
        let condition = self.condition();
        let inner = Value::single(condition.op.as_str(), condition.operand.to_value());
        match self {
            Predicate::Is(_) => inner,
            Predicate::Not(_) => Value::single(NOT, inner),
        }
    }
}

/// A single field tested against a single predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldClause {
    pub field: String,
    pub predicate: Predicate,
}

/// An element of a compound clause list.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Field(FieldClause),
    Compound(Compound),
    /// `$not` over a clause list: true when the conjunction of the list is
    /// false.
    Not(Vec<Clause>),
}

impl Clause {
    fn from_value(clause: &Value) -> SelectorResult<Self> {
        let Some((key, value)) = clause.as_single_entry() else {
            return Err(ValidationError::ClauseNotMap {
                clause: clause.to_string(),
            }
            .into());
        };

        match key {
            AND | OR => Ok(Clause::Compound(Compound::from_parts(key, value)?)),
            NOT => Ok(Clause::Not(clauses_from_value(key, value)?)),
            field => Ok(Clause::Field(FieldClause {
                field: field.to_string(),
                predicate: Predicate::from_value(field, value)?,
            })),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Clause::Field(fc) => Value::single(fc.field.clone(), fc.predicate.to_value()),
            Clause::Compound(compound) => compound.to_value(),
            Clause::Not(clauses) => Value::single(NOT, clauses_to_value(clauses)),
        }
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Clause::Field(fc) => {
                if !out.contains(&fc.field.as_str()) {
                    out.push(&fc.field);
                }
            }
            Clause::Compound(compound) => compound.collect_fields(out),
            Clause::Not(clauses) => clauses.iter().for_each(|c| c.collect_fields(out)),
        }
    }
}

/// `$and` / `$or` over an ordered, non-empty clause list.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub op: CompoundOp,
    pub clauses: Vec<Clause>,
}

impl Compound {
    fn from_parts(op: &str, value: &Value) -> SelectorResult<Self> {
        Ok(Compound {
            op: op.parse()?,
            clauses: clauses_from_value(op, value)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::single(self.op.as_str(), clauses_to_value(&self.clauses))
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        self.clauses.iter().for_each(|c| c.collect_fields(out));
    }
}

fn clauses_from_value(op: &str, value: &Value) -> SelectorResult<Vec<Clause>> {
    let items = value.as_list().ok_or_else(|| ValidationError::CompoundOperand {
        op: op.to_string(),
        found: value.to_string(),
    })?;
    items.iter().map(Clause::from_value).collect()
}

fn clauses_to_value(clauses: &[Clause]) -> Value {
    Value::List(clauses.iter().map(Clause::to_value).collect())
}

/// A normalized, validated selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Matches every document.
    Wildcard,
    Compound(Compound),
}

impl Selector {
    /// Normalize, validate and lift a raw selector.
    pub fn parse(raw: &Value) -> SelectorResult<Self> {
        let canonical = normalize(raw)?;
        if canonical.is_empty_map() {
            return Ok(Selector::Wildcard);
        }
        Self::lift(&canonical)
    }

    /// Lift a selector that is already in canonical form. It is validated
    /// but not rewritten.
    pub fn from_canonical(canonical: &Value) -> SelectorResult<Self> {
        if canonical.is_empty_map() {
            return Ok(Selector::Wildcard);
        }
        validate(canonical)?;
        Self::lift(canonical)
    }

    fn lift(canonical: &Value) -> SelectorResult<Self> {
        let (op, operand) = canonical
            .as_single_entry()
            .ok_or_else(|| SelectorError::Invalid(ValidationError::TopLevel {
                found: canonical.to_string(),
            }))?;
        Ok(Selector::Compound(Compound::from_parts(op, operand)?))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Selector::Wildcard)
    }

    /// Lower back to the canonical wire form.
    pub fn to_value(&self) -> Value {
        match self {
            Selector::Wildcard => Value::empty_map(),
            Selector::Compound(compound) => compound.to_value(),
        }
    }

    /// Field names referenced anywhere in the selector, in first-use order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if let Selector::Compound(compound) = self {
            compound.collect_fields(&mut out);
        }
        out
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(json: serde_json::Value) -> SelectorResult<Selector> {
        Selector::parse(&Value::from(json))
    }

    #[test]
    fn test_wildcard() {
        let selector = parse(json!({})).unwrap();
        assert!(selector.is_wildcard());
        assert_eq!(selector.to_value(), Value::empty_map());
        assert!(selector.fields().is_empty());
    }

    #[test]
    fn test_lifts_field_clauses() {
        let selector = parse(json!({"name": "mike", "age": {"$ne": 12}})).unwrap();
        let Selector::Compound(compound) = &selector else {
            panic!("expected compound");
        };
        assert_eq!(compound.op, CompoundOp::And);
        assert_eq!(
            compound.clauses,
            vec![
                Clause::Field(FieldClause {
                    field: "name".to_string(),
                    predicate: Predicate::Is(Condition {
                        op: Operator::Eq,
                        operand: Operand::String("mike".to_string()),
                    }),
                }),
                Clause::Field(FieldClause {
                    field: "age".to_string(),
                    predicate: Predicate::Not(Condition {
                        op: Operator::Eq,
                        operand: Operand::Int(12),
                    }),
                }),
            ]
        );
    }

    #[test]
    fn test_to_value_matches_normalize() {
        let raw = Value::from(json!({
            "$or": [{"a": {"$not": {"$not": {"$lt": 4}}}}, {"$not": [{"b": true}]}]
        }));
        // {"b": true} is rejected: $eq needs a string or number.
        assert!(Selector::parse(&raw).is_err());

        let raw = Value::from(json!({
            "$or": [{"a": {"$not": {"$not": {"$lt": 4}}}}, {"$not": [{"b": "x"}]}]
        }));
        let selector = Selector::parse(&raw).unwrap();
        assert_eq!(selector.to_value(), normalize(&raw).unwrap());
    }

    #[test]
    fn test_from_canonical_lifts_ne() {
        let canonical = Value::from(json!({"$and": [{"a": {"$not": {"$ne": 1}}}]}));
        let selector = Selector::from_canonical(&canonical).unwrap();
        assert_eq!(
            selector.to_value(),
            Value::from(json!({"$and": [{"a": {"$eq": 1}}]}))
        );
    }

    #[test]
    fn test_fields_in_first_use_order() {
        let selector = parse(json!({
            "$and": [{"b": 1}, {"$or": [{"a": 2}, {"b": 3}]}, {"$not": [{"c": 4}]}]
        }))
        .unwrap();
        assert_eq!(selector.fields(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_large_integer_operand() {
        let selector = parse(json!({"a": {"$gt": u64::MAX}})).unwrap();
        let Selector::Compound(compound) = &selector else {
            panic!("expected compound");
        };
        let Clause::Field(clause) = &compound.clauses[0] else {
            panic!("expected field clause");
        };
        assert_eq!(clause.predicate.condition().operand, Operand::UInt(u64::MAX));
        assert_eq!(
            selector.to_string(),
            r#"{"$and":[{"a":{"$gt":18446744073709551615}}]}"#
        );
    }

    #[test]
    fn test_display() {
        let selector = parse(json!({"a": 1})).unwrap();
        assert_eq!(selector.to_string(), r#"{"$and":[{"a":{"$eq":1}}]}"#);
    }
}
