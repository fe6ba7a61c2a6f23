// SPDX-License-Identifier: PMPL-1.0-or-later
//! Selector error types.

use thiserror::Error;

/// The first structural or type rule a selector broke.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("outermost key must be $and or $or, found {found}")]
    TopLevel { found: String },

    #[error("argument to compound operator {op} is not a list: {found}")]
    CompoundOperand { op: String, found: String },

    #[error("compound operator {op} has no clauses")]
    EmptyCompound { op: String },

    #[error("operator argument must be a map: {clause}")]
    ClauseNotMap { clause: String },

    #[error("operator argument clause should have one key value pair, found {keys}: {clause}")]
    ClauseArity { clause: String, keys: usize },

    #[error("{op} operator cannot be a top level operator")]
    MisplacedOperator { op: String },

    #[error("predicate for field {field} must be an operator map, found {found}")]
    PredicateNotMap { field: String, found: String },

    #[error("predicate for field {field} should have exactly one operator, found {keys}")]
    PredicateArity { field: String, keys: usize },

    #[error("unknown operator {op} on field {field}")]
    UnknownOperator { field: String, op: String },

    #[error("$not on field {field} cannot wrap another $not")]
    NestedNot { field: String },

    #[error("invalid operand for {op} on field {field}: {found}")]
    InvalidOperand { field: String, op: String, found: String },
}

/// Reasons a selector is rejected.
///
/// A rejected selector has no partial or repaired form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("invalid value encountered in query: fractional number {0}")]
    FractionalNumber(String),

    #[error("invalid selector: {0}")]
    Invalid(#[from] ValidationError),

    #[error("unknown operator: {0}")]
    UnknownOperator(String),
}

/// Convenience alias for selector results.
pub type SelectorResult<T> = Result<T, SelectorError>;
