//! Boolean tag expressions.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := and ("or" and)*
//! and     := unary ("and" unary)*
//! unary   := "not" unary | "(" expr ")" | TAG
//! ```
//!
//! A blank expression is the match-all expression. Keywords are lowercase;
//! any other run of characters other than whitespace and parentheses is a
//! tag name. Chains of `and`/`or` are flattened into a single node, and
//! `not` or parentheses may nest at most [`MAX_NESTING`] deep.

use crate::collection::error::{CollectionError, CollectionResult};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Deepest allowed nesting of `not` and parentheses.
pub const MAX_NESTING: usize = 256;

/// Anything that can decide whether a set of tags is selected.
pub trait TagMatcher: fmt::Debug {
    fn evaluate(&self, tags: &BTreeSet<String>) -> bool;

    /// True for the match-all expression, which selects every test,
    /// including those without tags.
    fn matches_everything(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagExpression {
    MatchAll,
    Tag(String),
    Not(Box<TagExpression>),
    And(Vec<TagExpression>),
    Or(Vec<TagExpression>),
}

impl TagExpression {
    pub fn match_all() -> Self {
        Self::MatchAll
    }

    pub fn from_text(text: &str) -> CollectionResult<Self> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(Self::MatchAll);
        }

        let mut parser = Parser {
            text,
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_or()?;

        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(parser.error(format!("unexpected '{token}'"))),
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Self::MatchAll)
    }
}

impl TagMatcher for TagExpression {
    fn evaluate(&self, tags: &BTreeSet<String>) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Tag(name) => tags.contains(name),
            Self::Not(inner) => !inner.evaluate(tags),
            Self::And(operands) => operands.iter().all(|expr| expr.evaluate(tags)),
            Self::Or(operands) => operands.iter().any(|expr| expr.evaluate(tags)),
        }
    }

    fn matches_everything(&self) -> bool {
        self.is_match_all()
    }
}

impl FromStr for TagExpression {
    type Err = CollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

impl fmt::Display for TagExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchAll => Ok(()),
            Self::Tag(name) => f.write_str(name),
            Self::Not(inner) => write!(f, "not {inner}"),
            Self::And(operands) => write_joined(f, operands, " and "),
            Self::Or(operands) => write_joined(f, operands, " or "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[TagExpression], op: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(op)?;
        }
        write!(f, "{operand}")?;
    }
    f.write_str(")")
}

fn tokenize(text: &str) -> Vec<&str> {
    let pattern =
        TOKEN_PATTERN.get_or_init(|| Regex::new(r"[()]|[^\s()]+").expect("Invalid regex"));
    pattern.find_iter(text).map(|m| m.as_str()).collect()
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<&'a str>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<&'a str> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn error(&self, reason: String) -> CollectionError {
        CollectionError::MalformedTagExpression {
            expression: self.text.to_string(),
            reason,
        }
    }

    fn parse_or(&mut self) -> CollectionResult<TagExpression> {
        let mut operands = vec![self.parse_and()?];
        while self.peek() == Some("or") {
            self.pos += 1;
            operands.push(self.parse_and()?);
        }
        Ok(flatten(operands, TagExpression::Or))
    }

    fn parse_and(&mut self) -> CollectionResult<TagExpression> {
        let mut operands = vec![self.parse_unary()?];
        while self.peek() == Some("and") {
            self.pos += 1;
            operands.push(self.parse_unary()?);
        }
        Ok(flatten(operands, TagExpression::And))
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> CollectionResult<T>,
    ) -> CollectionResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("expression nested too deeply".into()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_unary(&mut self) -> CollectionResult<TagExpression> {
        match self.bump() {
            Some("not") => {
                let inner = self.nested(Self::parse_unary)?;
                Ok(TagExpression::Not(Box::new(inner)))
            }
            Some("(") => {
                let inner = self.nested(Self::parse_or)?;
                match self.bump() {
                    Some(")") => Ok(inner),
                    Some(token) => Err(self.error(format!("expected ')' but found '{token}'"))),
                    None => Err(self.error("unclosed '('".into())),
                }
            }
            Some(token @ (")" | "and" | "or")) => {
                Err(self.error(format!("expected a tag but found '{token}'")))
            }
            Some(tag) => Ok(TagExpression::Tag(tag.to_string())),
            None => Err(self.error("expected a tag but the expression ended".into())),
        }
    }
}

fn flatten(
    mut operands: Vec<TagExpression>,
    combine: fn(Vec<TagExpression>) -> TagExpression,
) -> TagExpression {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        combine(operands)
    }
}
