//! Exact rational evaluation of arithmetic expressions.
//!
//! Expressions are evaluated over arbitrary-precision rationals, so two
//! answers that are the same number written differently (`1/2 + 1/3`,
//! `5/6`, `(10/12)`) compare exactly equal with no floating-point slack.
//!
//! Grammar:
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary | implicit '(' unary)*
//! unary := ('+' | '-') unary | power
//! power := atom ('^' unary)?
//! atom  := number | '(' expr ')'
//! ```

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};
use thiserror::Error;

const MAX_EXPONENT: i64 = 64;
const MAX_DEPTH: usize = 64;
/// Numerator plus denominator bits any intermediate value may occupy.
const MAX_BITS: u64 = 4096;

/// Why an expression could not be evaluated exactly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("malformed number '{0}'")]
    BadNumber(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),
    #[error("division by zero")]
    DivisionByZero,
    #[error("exponent must be an integer with magnitude at most 64")]
    BadExponent,
    #[error("expression nested too deeply")]
    TooDeep,
    #[error("intermediate value exceeds 4096 bits")]
    TooLarge,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(BigRational),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

/// Evaluate an arithmetic expression exactly.
pub fn evaluate(expr: &str) -> Result<BigRational, ParseError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::UnexpectedToken(parser.pos));
    }
    Ok(value)
}

/// Whether two expressions denote the same rational number. Any parse
/// failure yields `None`, leaving the caller to fall back.
pub fn equivalent(a: &str, b: &str) -> Option<bool> {
    let a = evaluate(a).ok()?;
    let b = evaluate(b).ok()?;
    Some((a - b).is_zero())
}

/// Lossy conversion for the tolerance tier.
pub fn to_f64(value: &BigRational) -> Option<f64> {
    let numer = value.numer().to_f64()?;
    let denom = value.denom().to_f64()?;
    let v = numer / denom;
    v.is_finite().then_some(v)
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(parse_decimal(&literal)?));
                continue;
            }
            '+' => tokens.push(Token::Plus),
            '-' | '−' => tokens.push(Token::Minus),
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '*' | '×' | '·' => tokens.push(Token::Star),
            '/' | '÷' => tokens.push(Token::Slash),
            '^' => tokens.push(Token::Caret),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            other => return Err(ParseError::UnexpectedChar(other)),
        }
        i += 1;
    }

    Ok(tokens)
}

fn parse_decimal(literal: &str) -> Result<BigRational, ParseError> {
    let bad = || ParseError::BadNumber(literal.to_string());
    let (int_part, frac_part) = match literal.split_once('.') {
        Some((i, f)) => (i, f),
        None => (literal, ""),
    };
    if frac_part.contains('.') || (int_part.is_empty() && frac_part.is_empty()) {
        return Err(bad());
    }

    let digits = format!("{int_part}{frac_part}");
    let numer: BigInt = digits.parse().map_err(|_| bad())?;
    let denom = num_traits::pow(BigInt::from(10u32), frac_part.len());
    Ok(BigRational::new(numer, denom))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<BigRational, ParseError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value = bounded(value + self.term()?)?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value = bounded(value - self.term()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<BigRational, ParseError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value = bounded(value * self.unary()?)?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor.is_zero() {
                        return Err(ParseError::DivisionByZero);
                    }
                    value = bounded(value / divisor)?;
                }
                // 2(3+4) and (1+1)(2+2)
                Some(Token::LParen) => {
                    value = bounded(value * self.unary()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<BigRational, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.descend(|p| p.unary()).map(|v| -v)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.descend(|p| p.unary())
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<BigRational, ParseError> {
        let base = self.atom()?;
        if self.peek() != Some(&Token::Caret) {
            return Ok(base);
        }
        self.pos += 1;
        let exponent = self.descend(|p| p.unary())?;
        raise(base, &exponent)
    }

    fn atom(&mut self) -> Result<BigRational, ParseError> {
        match self.next() {
            Some(Token::Number(n)) => bounded(n),
            Some(Token::LParen) => {
                let value = self.descend(|p| p.expr())?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(_) => Err(ParseError::UnexpectedToken(self.pos - 1)),
                    None => Err(ParseError::UnexpectedEnd),
                }
            }
            Some(_) => Err(ParseError::UnexpectedToken(self.pos - 1)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep);
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

fn raise(base: BigRational, exponent: &BigRational) -> Result<BigRational, ParseError> {
    if !exponent.is_integer() {
        return Err(ParseError::BadExponent);
    }
    let e = exponent
        .to_integer()
        .to_i64()
        .filter(|e| e.abs() <= MAX_EXPONENT)
        .ok_or(ParseError::BadExponent)?;
    if bit_size(&base).saturating_mul(e.unsigned_abs()) > MAX_BITS {
        return Err(ParseError::TooLarge);
    }

    let mut result = BigRational::one();
    for _ in 0..e.abs() {
        result *= &base;
    }
    if e.is_negative() {
        if result.is_zero() {
            return Err(ParseError::DivisionByZero);
        }
        result = result.recip();
    }
    Ok(result)
}

fn bit_size(value: &BigRational) -> u64 {
    value.numer().bits() + value.denom().bits()
}

fn bounded(value: BigRational) -> Result<BigRational, ParseError> {
    if bit_size(&value) > MAX_BITS {
        Err(ParseError::TooLarge)
    } else {
        Ok(value)
    }
}
