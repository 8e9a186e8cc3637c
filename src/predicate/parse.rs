//! Hand-written lexer and recursive-descent parser for filter expressions
//!
//! # Grammar
//!
//! Highest precedence first:
//!
//! ```text
//! expression := or
//! or         := and ("||" or)?                  -- right-associative
//! and        := term ("&&" and)?                -- right-associative
//! term       := "!" term
//!             | "(" expression ")"
//!             | "Prefix" "(" arg ")"
//!             | "HasField" "(" arg ")"
//!             | value cmp value
//! cmp        := "==" | "!=" | ">" | "<" | ">=" | "<="
//! value      := "Field" "(" arg ")" | number | string | word
//! arg        := identifier | string
//! ```
//!
//! `>=` desugars to `or(equals, greater)`, `<=` to `or(equals, less)` and
//! `!=` to `not(equals)`. The empty expression compiles to the constant
//! `true` node.
//!
//! A bare word is `true`/`false`/`nil`/`null`, a severity-level name
//! (case-insensitive), or otherwise a string literal equal to its text.
//! Identifiers are letters, digits and hyphens.
//!
//! Number literals keep the grammar's deliberate quirks: `-0` is
//! rejected, leading zeros are rejected, and the zero-valued float
//! spellings `0.0`/`-0.0` are rejected while `0.`, `1.` and `1.0` parse.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::entry::Level;
use crate::error::ParseError;
use crate::value::Value;

use super::{Predicate, ValueExpr};

/// Compile an expression into a predicate tree.
pub(crate) fn parse(input: &str) -> Result<Predicate, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(Predicate::True);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let tree = parser.or_expr()?;
    if let Some((pos, token)) = parser.peek() {
        return Err(ParseError::UnexpectedToken {
            pos: *pos,
            found: describe(token),
        });
    }
    Ok(tree)
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    And,
    Or,
    Not,
    LParen,
    RParen,
    EqEq,
    NotEq,
    Gt,
    Lt,
    Ge,
    Le,
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
}

fn describe(token: &Token) -> String {
    match token {
        Token::And => "`&&`".to_string(),
        Token::Or => "`||`".to_string(),
        Token::Not => "`!`".to_string(),
        Token::LParen => "`(`".to_string(),
        Token::RParen => "`)`".to_string(),
        Token::EqEq => "`==`".to_string(),
        Token::NotEq => "`!=`".to_string(),
        Token::Gt => "`>`".to_string(),
        Token::Lt => "`<`".to_string(),
        Token::Ge => "`>=`".to_string(),
        Token::Le => "`<=`".to_string(),
        Token::Ident(s) => format!("identifier {s:?}"),
        Token::Str(s) => format!("string {s:?}"),
        Token::Int(n) => format!("number {n}"),
        Token::Float(f) => format!("number {f}"),
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((pos, Token::LParen));
            }
            ')' => {
                chars.next();
                tokens.push((pos, Token::RParen));
            }
            '&' => {
                chars.next();
                match chars.next() {
                    Some((_, '&')) => tokens.push((pos, Token::And)),
                    _ => return Err(ParseError::UnexpectedChar { pos, ch: '&' }),
                }
            }
            '|' => {
                chars.next();
                match chars.next() {
                    Some((_, '|')) => tokens.push((pos, Token::Or)),
                    _ => return Err(ParseError::UnexpectedChar { pos, ch: '|' }),
                }
            }
            '!' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    tokens.push((pos, Token::NotEq));
                } else {
                    tokens.push((pos, Token::Not));
                }
            }
            '=' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => tokens.push((pos, Token::EqEq)),
                    _ => return Err(ParseError::UnexpectedChar { pos, ch: '=' }),
                }
            }
            '>' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    tokens.push((pos, Token::Ge));
                } else {
                    tokens.push((pos, Token::Gt));
                }
            }
            '<' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    tokens.push((pos, Token::Le));
                } else {
                    tokens.push((pos, Token::Lt));
                }
            }
            '\'' | '"' => {
                let text = lex_string(&mut chars, pos)?;
                tokens.push((pos, Token::Str(text)));
            }
            '-' | '0'..='9' => {
                let token = lex_number(&mut chars, pos)?;
                tokens.push((pos, token));
            }
            c if c.is_alphabetic() => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '-' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((pos, Token::Ident(word)));
            }
            _ => return Err(ParseError::UnexpectedChar { pos, ch }),
        }
    }

    Ok(tokens)
}

/// Lex a quoted string, interpreting backslash escapes.
///
/// The opening quote character must be matched at the end; a raw newline
/// anywhere inside is rejected. Multi-byte characters pass through.
fn lex_string(chars: &mut Peekable<CharIndices<'_>>, start: usize) -> Result<String, ParseError> {
    let (_, quote) = chars.next().ok_or(ParseError::UnexpectedEnd)?;
    let mut text = String::new();

    loop {
        let (pos, ch) = match chars.next() {
            Some(c) => c,
            None => return Err(ParseError::UnterminatedString { pos: start }),
        };
        match ch {
            c if c == quote => return Ok(text),
            '\n' => return Err(ParseError::NewlineInString { pos }),
            '\\' => {
                let (esc_pos, esc) = chars
                    .next()
                    .ok_or(ParseError::UnterminatedString { pos: start })?;
                match esc {
                    'n' => text.push('\n'),
                    'r' => text.push('\r'),
                    't' => text.push('\t'),
                    '0' => text.push('\0'),
                    '\\' | '\'' | '"' => text.push(esc),
                    'x' => {
                        let hi = hex_digit(chars, esc_pos)?;
                        let lo = hex_digit(chars, esc_pos)?;
                        text.push((hi * 16 + lo) as u8 as char);
                    }
                    'u' => {
                        match chars.next() {
                            Some((_, '{')) => {}
                            _ => return Err(ParseError::InvalidEscape { pos: esc_pos }),
                        }
                        let mut code: u32 = 0;
                        let mut digits = 0;
                        loop {
                            match chars.next() {
                                Some((_, '}')) => break,
                                Some((_, c)) => {
                                    let d = c
                                        .to_digit(16)
                                        .ok_or(ParseError::InvalidEscape { pos: esc_pos })?;
                                    code = code.wrapping_mul(16).wrapping_add(d);
                                    digits += 1;
                                    if digits > 6 {
                                        return Err(ParseError::InvalidEscape { pos: esc_pos });
                                    }
                                }
                                None => {
                                    return Err(ParseError::UnterminatedString { pos: start });
                                }
                            }
                        }
                        let c = char::from_u32(code)
                            .ok_or(ParseError::InvalidEscape { pos: esc_pos })?;
                        text.push(c);
                    }
                    _ => return Err(ParseError::InvalidEscape { pos: esc_pos }),
                }
            }
            c => text.push(c),
        }
    }
}

fn hex_digit(chars: &mut Peekable<CharIndices<'_>>, pos: usize) -> Result<u32, ParseError> {
    chars
        .next()
        .and_then(|(_, c)| c.to_digit(16))
        .ok_or(ParseError::InvalidEscape { pos })
}

/// Lex a number literal, enforcing the grammar's restrictions
///
/// Integer part: `0`, or a nonzero digit followed by more digits, with an
/// optional leading `-` (but `-0` is rejected). An optional `.` may follow
/// with an optional fraction run; the literal `0.0` is rejected.
fn lex_number(chars: &mut Peekable<CharIndices<'_>>, start: usize) -> Result<Token, ParseError> {
    let mut text = String::new();

    let negative = matches!(chars.peek(), Some(&(_, '-')));
    if negative {
        text.push('-');
        chars.next();
    }

    let mut int_part = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_digit() {
            int_part.push(c);
            chars.next();
        } else {
            break;
        }
    }

    let reject = |text: String| {
        Err(ParseError::InvalidNumber {
            pos: start,
            text,
        })
    };

    if int_part.is_empty() {
        return reject(text);
    }
    if int_part.len() > 1 && int_part.starts_with('0') {
        return reject(text + &int_part);
    }
    if negative && int_part == "0" {
        return reject(text + &int_part);
    }
    text.push_str(&int_part);

    if let Some(&(_, '.')) = chars.peek() {
        chars.next();
        text.push('.');

        let mut frac = String::new();
        while let Some(&(_, c)) = chars.peek() {
            if c.is_ascii_digit() {
                frac.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if int_part == "0" && frac == "0" {
            return reject(text + &frac);
        }
        text.push_str(&frac);

        match text.parse::<f64>() {
            Ok(f) => Ok(Token::Float(f)),
            Err(_) => reject(text),
        }
    } else {
        match text.parse::<i64>() {
            Ok(n) => Ok(Token::Int(n)),
            Err(_) => reject(text),
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.pos)
    }

    fn peek_second(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|(_, t)| t)
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the next token if it equals `want`
    fn eat(&mut self, want: &Token) -> bool {
        let hit = matches!(self.peek(), Some((_, token)) if token == want);
        if hit {
            self.pos += 1;
        }
        hit
    }

    /// Check for `name` immediately followed by `(` (a function form)
    fn at_call(&self, name: &str) -> bool {
        matches!(self.peek(), Some((_, Token::Ident(word))) if word == name)
            && self.peek_second() == Some(&Token::LParen)
    }

    fn expect(&mut self, want: &Token) -> Result<(), ParseError> {
        match self.advance() {
            Some((_, ref token)) if token == want => Ok(()),
            Some((pos, token)) => Err(ParseError::UnexpectedToken {
                pos,
                found: describe(&token),
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// `or := and ("||" or)?` — right-associative by construction
    fn or_expr(&mut self) -> Result<Predicate, ParseError> {
        let left = self.and_expr()?;
        if self.eat(&Token::Or) {
            let right = self.or_expr()?;
            return Ok(Predicate::Or(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    /// `and := term ("&&" and)?` — right-associative by construction
    fn and_expr(&mut self) -> Result<Predicate, ParseError> {
        let left = self.term()?;
        if self.eat(&Token::And) {
            let right = self.and_expr()?;
            return Ok(Predicate::And(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Predicate, ParseError> {
        if self.eat(&Token::Not) {
            let inner = self.term()?;
            return Ok(Predicate::Not(Box::new(inner)));
        }
        if self.eat(&Token::LParen) {
            let inner = self.or_expr()?;
            self.expect(&Token::RParen)?;
            return Ok(inner);
        }
        if self.at_call("Prefix") {
            self.advance();
            return Ok(Predicate::Prefix(self.func_arg()?));
        }
        if self.at_call("HasField") {
            self.advance();
            return Ok(Predicate::HasField(self.func_arg()?));
        }
        self.comparison()
    }

    /// `value cmp value`, with `>=`/`<=`/`!=` desugared
    fn comparison(&mut self) -> Result<Predicate, ParseError> {
        let left = self.value()?;
        let (pos, op) = self.advance().ok_or(ParseError::UnexpectedEnd)?;
        let right = match op {
            Token::EqEq | Token::NotEq | Token::Gt | Token::Lt | Token::Ge | Token::Le => {
                self.value()?
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    pos,
                    found: describe(&other),
                });
            }
        };

        Ok(match op {
            Token::EqEq => Predicate::Equals(left, right),
            Token::NotEq => Predicate::Not(Box::new(Predicate::Equals(left, right))),
            Token::Gt => Predicate::Greater(left, right),
            Token::Lt => Predicate::Less(left, right),
            Token::Ge => Predicate::Or(
                Box::new(Predicate::Equals(left.clone(), right.clone())),
                Box::new(Predicate::Greater(left, right)),
            ),
            Token::Le => Predicate::Or(
                Box::new(Predicate::Equals(left.clone(), right.clone())),
                Box::new(Predicate::Less(left, right)),
            ),
            _ => unreachable!("comparison operator checked above"),
        })
    }

    fn value(&mut self) -> Result<ValueExpr, ParseError> {
        if self.at_call("Field") {
            self.advance();
            let arg = self.func_arg()?;
            return Ok(ValueExpr::Field(arg));
        }

        match self.advance() {
            Some((_, Token::Int(n))) => Ok(ValueExpr::Literal(Value::Int(n))),
            Some((_, Token::Float(f))) => Ok(ValueExpr::Literal(Value::Float(f))),
            Some((_, Token::Str(s))) => Ok(ValueExpr::Literal(Value::Str(s))),
            Some((_, Token::Ident(word))) => Ok(bare_word(&word)),
            Some((pos, token)) => Err(ParseError::UnexpectedToken {
                pos,
                found: describe(&token),
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// `"(" (identifier | string) ")"` — both yield the same text
    fn func_arg(&mut self) -> Result<String, ParseError> {
        self.expect(&Token::LParen)?;
        let text = match self.advance() {
            Some((_, Token::Ident(s))) | Some((_, Token::Str(s))) => s,
            Some((pos, token)) => {
                return Err(ParseError::UnexpectedToken {
                    pos,
                    found: describe(&token),
                });
            }
            None => return Err(ParseError::UnexpectedEnd),
        };
        self.expect(&Token::RParen)?;
        Ok(text)
    }
}

/// Interpret an unquoted word in value position
fn bare_word(word: &str) -> ValueExpr {
    match word {
        "true" => ValueExpr::Literal(Value::Bool(true)),
        "false" => ValueExpr::Literal(Value::Bool(false)),
        "nil" | "null" => ValueExpr::Literal(Value::Nil),
        _ => match word.parse::<Level>() {
            Ok(level) => ValueExpr::Level(level),
            Err(_) => ValueExpr::Literal(Value::Str(word.to_string())),
        },
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
