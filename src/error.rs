//! Error types for the logtap crate

use thiserror::Error;

/// Errors reported while compiling a filter expression
///
/// Parse errors are always synchronous and never fatal to a running hub:
/// a selector keeps its previously installed predicate when a new
/// expression fails to compile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A character that cannot start any token
    #[error("unexpected character {ch:?} at byte {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    /// String literal with no closing quote (or mismatched quote kinds)
    #[error("unterminated string literal starting at byte {pos}")]
    UnterminatedString { pos: usize },

    /// Raw (unescaped) newline inside a quoted string
    #[error("raw newline inside string literal at byte {pos}")]
    NewlineInString { pos: usize },

    /// Unknown or malformed backslash escape
    #[error("invalid escape sequence at byte {pos}")]
    InvalidEscape { pos: usize },

    /// Number literal rejected by the grammar (`-0`, `0.0`, leading zeros, overflow)
    #[error("invalid number literal {text:?} at byte {pos}")]
    InvalidNumber { pos: usize, text: String },

    /// A well-formed token in a position the grammar does not allow
    #[error("unexpected {found} at byte {pos}")]
    UnexpectedToken { pos: usize, found: String },

    /// Expression ended while more input was required
    #[error("unexpected end of expression")]
    UnexpectedEnd,
}

/// Errors that can occur in the hub / selector system
#[derive(Error, Debug)]
pub enum HubError {
    /// Filter expression failed to compile
    #[error("invalid filter expression: {0}")]
    Parse(#[from] ParseError),

    /// The hub's dispatch loop has exited; no further operations are possible
    #[error("hub is stopped")]
    Stopped,
}

/// Level name that is not one of the known severities
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level: {0:?}")]
pub struct UnknownLevel(pub String);
