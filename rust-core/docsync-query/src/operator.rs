// SPDX-License-Identifier: PMPL-1.0-or-later
//! Selector operator vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

/// Prefix that marks a map key as an operator rather than a field name.
pub const SIGIL: char = '$';

pub const AND: &str = "$and";
pub const OR: &str = "$or";
pub const NOT: &str = "$not";
pub const EQ: &str = "$eq";
pub const NE: &str = "$ne";
pub const LT: &str = "$lt";
pub const LTE: &str = "$lte";
pub const GT: &str = "$gt";
pub const GTE: &str = "$gte";
pub const EXISTS: &str = "$exists";

/// Negated shorthand operators and the positive operator each one expands to
/// under a `$not`.
pub const NOT_SHORTHANDS: &[(&str, &str)] = &[(NE, EQ)];

/// Operators accepted directly under a field name.
pub const FIELD_OPERATORS: &[&str] = &[EQ, LT, GT, EXISTS, NOT, NE, GTE, LTE];

/// Whether a map key names an operator.
pub fn is_operator(key: &str) -> bool {
    key.starts_with(SIGIL)
}

/// The positive operator a shorthand stands for, if `op` is a shorthand.
pub fn shorthand_target(op: &str) -> Option<&'static str> {
    NOT_SHORTHANDS
        .iter()
        .find(|(shorthand, _)| *shorthand == op)
        .map(|(_, target)| *target)
}

/// Compound operators that take a list of clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundOp {
    And,
    Or,
}

impl CompoundOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompoundOp::And => AND,
            CompoundOp::Or => OR,
        }
    }
}

impl fmt::Display for CompoundOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompoundOp {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            AND => Ok(CompoundOp::And),
            OR => Ok(CompoundOp::Or),
            _ => Err(SelectorError::UnknownOperator(s.to_string())),
        }
    }
}

/// Positive comparison operators that survive canonicalization.
///
/// `$ne` is absent on purpose: canonical form spells it `$not` + `$eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    Exists,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::Exists,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => EQ,
            Operator::Lt => LT,
            Operator::Lte => LTE,
            Operator::Gt => GT,
            Operator::Gte => GTE,
            Operator::Exists => EXISTS,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| SelectorError::UnknownOperator(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_roundtrip() {
        for op in Operator::ALL {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn test_ne_is_not_canonical() {
        assert!(NE.parse::<Operator>().is_err());
        assert_eq!(shorthand_target(NE), Some(EQ));
        assert_eq!(shorthand_target(EQ), None);
    }

    #[test]
    fn test_compound_parse() {
        assert_eq!(AND.parse::<CompoundOp>().unwrap(), CompoundOp::And);
        assert_eq!(OR.parse::<CompoundOp>().unwrap(), CompoundOp::Or);
        assert!(NOT.parse::<CompoundOp>().is_err());
    }

    #[test]
    fn test_is_operator() {
        assert!(is_operator("$eq"));
        assert!(!is_operator("name"));
        assert!(!is_operator(""));
    }
}
