//! Compiled filter predicates
//!
//! A filter expression compiles to an immutable tree of two node
//! families: boolean operators ([`Predicate`]) and typed value producers
//! ([`ValueExpr`]). Every node is side-effect-free and referentially
//! transparent for a given entry; a selector replaces its predicate by
//! whole-tree swap, never by in-place edit.
//!
//! The expression grammar and the compiler live in [`mod@parse`]; see
//! that module for the textual syntax.

use serde_json::Value as Json;

use crate::entry::{Entry, Level};
use crate::error::ParseError;
use crate::value::Value;

mod parse;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// A boolean operator node, evaluated against one entry
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every entry (the empty expression compiles to this)
    True,
    /// Matches nothing
    False,
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    /// True iff the entry's `prefix` field is text exactly equal to this
    Prefix(String),
    /// True iff the named field is present
    HasField(String),
    Equals(ValueExpr, ValueExpr),
    Greater(ValueExpr, ValueExpr),
    Less(ValueExpr, ValueExpr),
}

impl Predicate {
    /// Compile a filter expression
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse::parse(input)
    }

    /// Evaluate this predicate against an entry
    ///
    /// `And`/`Or` evaluate the left operand first and short-circuit.
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Not(inner) => !inner.matches(entry),
            Self::And(left, right) => left.matches(entry) && right.matches(entry),
            Self::Or(left, right) => left.matches(entry) || right.matches(entry),
            Self::Prefix(prefix) => {
                matches!(entry.field("prefix"), Some(Json::String(s)) if s == prefix)
            }
            Self::HasField(name) => entry.has_field(name),
            Self::Equals(left, right) => left.resolve(entry) == right.resolve(entry),
            Self::Greater(left, right) => left.resolve(entry).gt(&right.resolve(entry)),
            Self::Less(left, right) => left.resolve(entry).lt(&right.resolve(entry)),
        }
    }
}

/// A typed value producer, optionally depending on the entry
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// A literal from the expression text
    Literal(Value),
    /// A severity level name; resolves to its ordinal rank, typed Int
    Level(Level),
    /// A field reference, resolved lazily through coercion
    Field(String),
}

impl ValueExpr {
    /// Resolve to a typed scalar for the given entry
    pub fn resolve(&self, entry: &Entry) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Level(level) => Value::Int(i64::from(level.rank())),
            Self::Field(name) => match entry.field(name) {
                Some(raw) => Value::coerce(raw),
                None => Value::Nil,
            },
        }
    }
}
