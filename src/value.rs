//! Typed scalar values and field coercion
//!
//! Filter expressions compare typed scalars. Literals in the expression
//! text carry their type from the parser; field references resolve lazily
//! at evaluation time through [`Value::coerce`], which turns whatever a
//! producer stored into one of the five scalar kinds.
//!
//! # Coercion
//!
//! A raw field value is first reduced to text: strings pass through,
//! numbers and booleans are rendered, and anything without a sensible
//! textual form (arrays, objects, JSON null) becomes `Nil`. The text is
//! then interpreted, in order: integer parse, float parse,
//! case-insensitive `true`/`false`, case-insensitive `null`/`nil`, and
//! finally kept as a plain string.
//!
//! Coercion never fails; malformed field data degrades to `Nil`, which
//! simply fails to match rather than raising an error.

use serde_json::Value as Json;

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;

/// The kind tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Str,
    Int,
    Float,
    Bool,
    Nil,
}

/// A typed scalar produced by a literal or a resolved field reference
///
/// Equality is kind-aware: mismatched kinds are unequal, never an error.
/// The derived `PartialEq` gives exactly that behavior.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
}

impl Value {
    /// The kind tag of this value
    #[inline]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Str(_) => Kind::Str,
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::Bool(_) => Kind::Bool,
            Self::Nil => Kind::Nil,
        }
    }

    /// Coerce a raw field value into a typed scalar
    pub fn coerce(raw: &Json) -> Self {
        let text = match raw {
            Json::String(s) => s.clone(),
            Json::Number(n) => n.to_string(),
            Json::Bool(b) => b.to_string(),
            // No textual representation worth interpreting
            Json::Null | Json::Array(_) | Json::Object(_) => return Self::Nil,
        };
        Self::from_text(&text)
    }

    /// Interpret text as the most specific scalar kind
    fn from_text(text: &str) -> Self {
        if let Ok(n) = text.parse::<i64>() {
            return Self::Int(n);
        }
        if let Ok(f) = text.parse::<f64>() {
            return Self::Float(f);
        }
        match text.to_ascii_lowercase().as_str() {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            "null" | "nil" => Self::Nil,
            _ => Self::Str(text.to_string()),
        }
    }

    /// Type-aware strict ordering: `self > other`
    ///
    /// Numeric within Int/Int and Float/Float, lexicographic within
    /// Str/Str; false across mismatched kinds and for Bool/Nil.
    #[inline]
    pub fn gt(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a > b,
            (Self::Float(a), Self::Float(b)) => a > b,
            (Self::Str(a), Self::Str(b)) => a > b,
            _ => false,
        }
    }

    /// Type-aware strict ordering: `self < other`
    #[inline]
    pub fn lt(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a < b,
            (Self::Float(a), Self::Float(b)) => a < b,
            (Self::Str(a), Self::Str(b)) => a < b,
            _ => false,
        }
    }
}
