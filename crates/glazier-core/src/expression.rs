//! # Custom Formula Expressions
//!
//! A tiny arithmetic language for the `custom` price conversion.
//!
//! ## Grammar
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | 'total' | '(' expr ')'
//! NUMBER  := digits ['.' digits] | '.' digits
//! ```
//!
//! `total` is the only identifier. Anything else (function calls, other
//! names, exponents, operators like `%` or `^`) is rejected while parsing,
//! so a formula that would fail never reaches the active version. An
//! expression must also mention `total`; a constant such as `42` is refused.
//!
//! Literals and arithmetic are exact decimals. An operation that leaves the
//! `Decimal` range fails with [`FormulaError::Overflow`].
//!
//! ## Usage
//! ```rust
//! use glazier_core::expression::Expression;
//! use rust_decimal::Decimal;
//!
//! let expr = Expression::parse("total / 0.28 + 15").unwrap();
//! assert_eq!(expr.evaluate(Decimal::from(28)).unwrap(), Decimal::from(115));
//!
//! assert!(Expression::parse("system('rm -rf /')").is_err());
//! ```

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::error::FormulaError;

/// Longest accepted expression source, in bytes.
pub const MAX_EXPRESSION_LEN: usize = 256;

/// Deepest accepted nesting of parentheses and unary signs.
pub const MAX_NESTING_DEPTH: usize = 32;

/// The single identifier an expression may reference.
pub const BOUND_VARIABLE: &str = "total";

// =============================================================================
// Tokens
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(Decimal),
    Total,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Total => f.write_str(BOUND_VARIABLE),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Spanned {
    token: Token,
    position: usize,
}

fn tokenize(source: &str) -> Result<Vec<Spanned>, FormulaError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'0'..=b'9' | b'.' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let value = parse_number(&source[start..i], start)?;
                tokens.push(Spanned {
                    token: Token::Number(value),
                    position: start,
                });
                continue;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let name = &source[start..i];
                if name != BOUND_VARIABLE {
                    return Err(FormulaError::UnknownIdentifier {
                        name: name.to_string(),
                        position: start,
                    });
                }
                tokens.push(Spanned {
                    token: Token::Total,
                    position: start,
                });
                continue;
            }
            _ => {
                // Report the full character, not the first UTF-8 byte.
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(FormulaError::UnexpectedCharacter { ch, position: start });
            }
        };

        tokens.push(Spanned { token, position: start });
        i += 1;
    }

    Ok(tokens)
}

/// Parses `12`, `12.5`, `.5` or `12.` as an exact decimal.
fn parse_number(literal: &str, position: usize) -> Result<Decimal, FormulaError> {
    let invalid = || FormulaError::InvalidNumber {
        literal: literal.to_string(),
        position,
    };

    if literal == "." {
        return Err(invalid());
    }
    let mut normalized = String::with_capacity(literal.len() + 2);
    if literal.starts_with('.') {
        normalized.push('0');
    }
    normalized.push_str(literal);
    if literal.ends_with('.') {
        normalized.push('0');
    }

    Decimal::from_str(&normalized).map_err(|_| invalid())
}

// =============================================================================
// Syntax Tree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(Decimal),
    Total,
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    fn references_total(&self) -> bool {
        match self {
            Expr::Number(_) => false,
            Expr::Total => true,
            Expr::Neg(inner) => inner.references_total(),
            Expr::Binary { lhs, rhs, .. } => lhs.references_total() || rhs.references_total(),
        }
    }

    fn eval(&self, total: Decimal) -> Result<Decimal, FormulaError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Total => Ok(total),
            Expr::Neg(inner) => Ok(-inner.eval(total)?),
            Expr::Binary { op, lhs, rhs } => {
                let l = lhs.eval(total)?;
                let r = rhs.eval(total)?;
                let value = match op {
                    BinaryOp::Add => l.checked_add(r),
                    BinaryOp::Sub => l.checked_sub(r),
                    BinaryOp::Mul => l.checked_mul(r),
                    BinaryOp::Div => {
                        if r.is_zero() {
                            return Err(FormulaError::DivisionByZero);
                        }
                        l.checked_div(r)
                    }
                };
                value.ok_or(FormulaError::Overflow)
            }
        }
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|s| s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let next = self.tokens.get(self.pos).copied();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn enter(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(FormulaError::ExpressionTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(token @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            let op = if token == Token::Plus { BinaryOp::Add } else { BinaryOp::Sub };
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(token @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            let op = if token == Token::Star { BinaryOp::Mul } else { BinaryOp::Div };
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(sign @ (Token::Plus | Token::Minus)) => {
                self.pos += 1;
                self.enter()?;
                let operand = self.unary()?;
                self.leave();
                Ok(if sign == Token::Minus {
                    Expr::Neg(Box::new(operand))
                } else {
                    operand
                })
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let spanned = self.advance().ok_or(FormulaError::UnexpectedEnd)?;
        match spanned.token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Total => Ok(Expr::Total),
            Token::LParen => {
                self.enter()?;
                let inner = self.expr()?;
                self.leave();
                match self.advance() {
                    Some(Spanned { token: Token::RParen, .. }) => Ok(inner),
                    Some(other) => Err(FormulaError::UnexpectedToken {
                        found: other.token.to_string(),
                        position: other.position,
                    }),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            other => Err(FormulaError::UnexpectedToken {
                found: other.to_string(),
                position: spanned.position,
            }),
        }
    }
}

// =============================================================================
// Expression
// =============================================================================

/// A parsed, sandboxed custom formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    /// Parses and checks an expression.
    ///
    /// ## Errors
    /// Empty or oversized source, any character or identifier outside the
    /// grammar, unbalanced parentheses, excessive nesting, or an expression
    /// that never mentions `total`.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        if source.trim().is_empty() {
            return Err(FormulaError::EmptyExpression);
        }
        if source.len() > MAX_EXPRESSION_LEN {
            return Err(FormulaError::ExpressionTooLong {
                max: MAX_EXPRESSION_LEN,
            });
        }

        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.expr()?;

        if let Some(extra) = parser.advance() {
            return Err(FormulaError::UnexpectedToken {
                found: extra.token.to_string(),
                position: extra.position,
            });
        }
        if !root.references_total() {
            return Err(FormulaError::MissingTotal);
        }

        Ok(Expression {
            source: source.to_string(),
            root,
        })
    }

    /// Evaluates with `total` bound to the given value.
    pub fn evaluate(&self, total: Decimal) -> Result<Decimal, FormulaError> {
        self.root.eval(total)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Expression {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::parse(s)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
