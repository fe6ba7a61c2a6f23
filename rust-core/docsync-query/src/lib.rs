// SPDX-License-Identifier: PMPL-1.0-or-later
//! docsync Query
//!
//! Selector normalization and validation.
//!
//! Selectors are Mongo-style boolean queries submitted as nested map/list/
//! scalar data. Before a planner may execute one it is rewritten into a
//! single canonical shape and checked:
//!
//! ```text
//! raw Value -> normalize -> canonical Value -> validate -> Selector
//! ```
//!
//! # Example
//!
//! ```rust
//! use docsync_query::{normalize, Selector, Value};
//! use serde_json::json;
//!
//! let raw = Value::from(json!({"name": "mike", "age": {"$ne": 12}}));
//! let canonical = normalize(&raw).unwrap();
//! assert_eq!(
//!     canonical,
//!     Value::from(json!({"$and": [
//!         {"name": {"$eq": "mike"}},
//!         {"age": {"$not": {"$eq": 12}}}
//!     ]}))
//! );
//!
//! let selector = Selector::parse(&raw).unwrap();
//! assert_eq!(selector.fields(), vec!["name", "age"]);
//! ```

pub mod error;
pub mod normalize;
pub mod operator;
pub mod selector;
pub mod validate;
pub mod value;

pub use error::{SelectorError, SelectorResult, ValidationError};
pub use normalize::normalize;
pub use operator::{CompoundOp, Operator};
pub use selector::{Clause, Compound, Condition, FieldClause, Operand, Predicate, Selector};
pub use validate::{is_valid, validate};
pub use value::{Number, Value};
