//! Restricted expression evaluation for `#if` and `#elif` conditions.
//!
//! Conditions are evaluated over signed 64-bit integers with a fixed
//! grammar: `defined(NAME)` checks, macro substitution, integer literals,
//! parentheses, unary `+`/`-`, `*` and `/`, `+` and `-`, a single
//! comparison (`==`, `!=`, `<=`, `>=`, `<`, `>`), and boolean `not`/`and`/
//! `or` (also spelled `!`, `&&`, `||`). Nothing else is executable, so a
//! configuration file can never run arbitrary code. Arithmetic wraps on
//! overflow; division by zero is an error rather than a panic.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use super::MacroTable;

/// Why a condition could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The condition was empty after trimming.
    #[error("empty condition")]
    EmptyCondition,
    /// An identifier survived macro substitution without a definition.
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),
    /// A token that cannot appear where it did.
    #[error("unexpected `{0}`")]
    UnexpectedToken(String),
    /// The condition ended while more tokens were required.
    #[error("unexpected end of condition")]
    UnexpectedEnd,
    /// A numeric literal that is not a plain decimal integer.
    #[error("invalid numeric literal `{0}`")]
    BadLiteral(String),
    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(i64),
    Symbol(String),
    Or,
    And,
    Not,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
    OpenParen,
    CloseParen,
}

impl Token {
    /// Canonical spelling used in diagnostics.
    fn lexeme(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Symbol(name) => name.clone(),
            Self::Or => "||".into(),
            Self::And => "&&".into(),
            Self::Not => "!".into(),
            Self::Eq => "==".into(),
            Self::Ne => "!=".into(),
            Self::Le => "<=".into(),
            Self::Ge => ">=".into(),
            Self::Lt => "<".into(),
            Self::Gt => ">".into(),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::Star => "*".into(),
            Self::Slash => "/".into(),
            Self::OpenParen => "(".into(),
            Self::CloseParen => ")".into(),
        }
    }
}

static DEFINED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bdefined\s*\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)|\bdefined\s+([A-Za-z_][A-Za-z0-9_]*)")
        .unwrap_or_else(|_| unreachable!())
});

/// Evaluate `condition` against the current macro table.
///
/// `defined(NAME)` and `defined NAME` are resolved first, then every
/// remaining identifier is substituted with its macro value (identifiers
/// without a definition are left in place and fail evaluation as unknown
/// symbols). The condition is truthy when it evaluates to a non-zero value.
pub(crate) fn evaluate(condition: &str, macros: &MacroTable) -> Result<bool, ExprError> {
    let resolved = resolve_defined(condition, macros);
    let substituted = substitute_symbols(&resolved, macros);
    let tokens = tokenize(&substituted)?;
    if tokens.is_empty() {
        return Err(ExprError::EmptyCondition);
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        Some(extra) => Err(ExprError::UnexpectedToken(extra.lexeme())),
        None => Ok(value != 0),
    }
}

/// Replace `defined(NAME)` and `defined NAME` constructs with `1` or `0`.
fn resolve_defined(condition: &str, macros: &MacroTable) -> String {
    DEFINED_PATTERN
        .replace_all(condition, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            if macros.is_defined(name) { "1" } else { "0" }
        })
        .into_owned()
}

/// Substitute each identifier with its macro value in a single pass.
///
/// Substituted values are not rescanned, so macro definitions cannot
/// expand recursively.
fn substitute_symbols(condition: &str, macros: &MacroTable) -> String {
    let mut out = String::with_capacity(condition.len());
    let mut chars = condition.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        if ch == '_' || ch.is_ascii_alphabetic() {
            let mut end = start + ch.len_utf8();
            while let Some(&(idx, next)) = chars.peek() {
                if next == '_' || next.is_ascii_alphanumeric() {
                    end = idx + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let word = &condition[start..end];
            out.push_str(macros.value(word).unwrap_or(word));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Consume `expected` from the stream if it is the next character.
fn followed_by(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, expected: char) -> bool {
    if chars.peek().is_some_and(|&(_, next)| next == expected) {
        chars.next();
        true
    } else {
        false
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        if ch.is_ascii_digit() {
            let mut end = start + ch.len_utf8();
            chars.next();
            while let Some(&(idx, next)) = chars.peek() {
                if next == '.' || next == '_' || next.is_ascii_alphanumeric() {
                    end = idx + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let text = &input[start..end];
            let value = text
                .parse::<i64>()
                .map_err(|_| ExprError::BadLiteral(text.to_string()))?;
            tokens.push(Token::Number(value));
            continue;
        }
        if ch == '_' || ch.is_ascii_alphabetic() {
            let mut end = start + ch.len_utf8();
            chars.next();
            while let Some(&(idx, next)) = chars.peek() {
                if next == '_' || next.is_ascii_alphanumeric() {
                    end = idx + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(match &input[start..end] {
                "or" => Token::Or,
                "and" => Token::And,
                "not" => Token::Not,
                "true" => Token::Number(1),
                "false" => Token::Number(0),
                word => Token::Symbol(word.to_string()),
            });
            continue;
        }
        chars.next();
        let token = match ch {
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '!' => {
                if followed_by(&mut chars, '=') {
                    Token::Ne
                } else {
                    Token::Not
                }
            }
            '<' => {
                if followed_by(&mut chars, '=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if followed_by(&mut chars, '=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '=' if followed_by(&mut chars, '=') => Token::Eq,
            '&' if followed_by(&mut chars, '&') => Token::And,
            '|' if followed_by(&mut chars, '|') => Token::Or,
            other => return Err(ExprError::UnexpectedToken(other.to_string())),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

#[derive(Debug, Clone, Copy)]
enum Comparison {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
}

impl Comparison {
    fn apply(self, left: i64, right: i64) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Le => left <= right,
            Self::Ge => left >= right,
            Self::Lt => left < right,
            Self::Gt => left > right,
        }
    }
}

/// Recursive-descent parser evaluating as it goes.
///
/// Precedence, loosest first: `or`, `and`, `not`, comparison, additive,
/// multiplicative, unary sign. At most one comparison may appear in a
/// chain; `a < b < c` is rejected rather than silently re-interpreted.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<i64, ExprError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<i64, ExprError> {
        let mut value = self.and_expr()?;
        while self.eat(&Token::Or) {
            let rhs = self.and_expr()?;
            value = i64::from(value != 0 || rhs != 0);
        }
        Ok(value)
    }

    fn and_expr(&mut self) -> Result<i64, ExprError> {
        let mut value = self.not_expr()?;
        while self.eat(&Token::And) {
            let rhs = self.not_expr()?;
            value = i64::from(value != 0 && rhs != 0);
        }
        Ok(value)
    }

    fn not_expr(&mut self) -> Result<i64, ExprError> {
        if self.eat(&Token::Not) {
            let value = self.not_expr()?;
            Ok(i64::from(value == 0))
        } else {
            self.comparison()
        }
    }

    fn comparison(&mut self) -> Result<i64, ExprError> {
        let left = self.additive()?;
        let op = match self.peek() {
            Some(Token::Eq) => Some(Comparison::Eq),
            Some(Token::Ne) => Some(Comparison::Ne),
            Some(Token::Le) => Some(Comparison::Le),
            Some(Token::Ge) => Some(Comparison::Ge),
            Some(Token::Lt) => Some(Comparison::Lt),
            Some(Token::Gt) => Some(Comparison::Gt),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let right = self.additive()?;
                Ok(i64::from(op.apply(left, right)))
            }
            None => Ok(left),
        }
    }

    fn additive(&mut self) -> Result<i64, ExprError> {
        let mut value = self.multiplicative()?;
        loop {
            if self.eat(&Token::Plus) {
                value = value.wrapping_add(self.multiplicative()?);
            } else if self.eat(&Token::Minus) {
                value = value.wrapping_sub(self.multiplicative()?);
            } else {
                return Ok(value);
            }
        }
    }

    fn multiplicative(&mut self) -> Result<i64, ExprError> {
        let mut value = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                value = value.wrapping_mul(self.unary()?);
            } else if self.eat(&Token::Slash) {
                let divisor = self.unary()?;
                if divisor == 0 {
                    return Err(ExprError::DivisionByZero);
                }
                value = value.wrapping_div(divisor);
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<i64, ExprError> {
        if self.eat(&Token::Minus) {
            Ok(self.unary()?.wrapping_neg())
        } else if self.eat(&Token::Plus) {
            self.unary()
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<i64, ExprError> {
        match self.peek().cloned() {
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(value)
            }
            Some(Token::Symbol(name)) => Err(ExprError::UnknownSymbol(name)),
            Some(Token::OpenParen) => {
                self.pos += 1;
                let value = self.expr()?;
                if self.eat(&Token::CloseParen) {
                    Ok(value)
                } else {
                    Err(match self.peek() {
                        Some(extra) => ExprError::UnexpectedToken(extra.lexeme()),
                        None => ExprError::UnexpectedEnd,
                    })
                }
            }
            Some(other) => Err(ExprError::UnexpectedToken(other.lexeme())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}
