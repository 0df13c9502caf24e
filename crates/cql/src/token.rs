//! Tokens produced by the CQL tokenizer.

use std::fmt;

use serde::Serialize;

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// A bare attribute name such as `NAME`.
    Property,
    /// `=`, `<>`, `<`, `<=`, `>`, `>=`, `LIKE` or `ILIKE`.
    Comparison,
    /// A quoted string or a number.
    Value,
    /// `AND` or `OR`.
    Logical,
    /// `IS NULL`.
    IsNull,
    Comma,
    #[serde(rename = "LPAREN")]
    LParen,
    #[serde(rename = "RPAREN")]
    RParen,
    /// A spatial function name such as `BBOX` or `INTERSECTS`.
    Spatial,
    Not,
    Between,
    /// A complete well-known-text geometry literal, parentheses included.
    Geometry,
    /// The empty match at the end of input.
    End,
}

impl TokenKind {
    /// The canonical upper-case name of the kind, as used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Property => "PROPERTY",
            TokenKind::Comparison => "COMPARISON",
            TokenKind::Value => "VALUE",
            TokenKind::Logical => "LOGICAL",
            TokenKind::IsNull => "IS_NULL",
            TokenKind::Comma => "COMMA",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Spatial => "SPATIAL",
            TokenKind::Not => "NOT",
            TokenKind::Between => "BETWEEN",
            TokenKind::Geometry => "GEOMETRY",
            TokenKind::End => "END",
        }
    }

    /// A short human readable description of what this kind matches.
    pub fn pattern(self) -> &'static str {
        match self {
            TokenKind::Property => "an identifier ([_a-zA-Z][_a-zA-Z0-9]*)",
            TokenKind::Comparison => "one of =, <>, <=, <, >=, >, LIKE, ILIKE",
            TokenKind::Value => "a quoted string or a number",
            TokenKind::Logical => "AND or OR",
            TokenKind::IsNull => "IS NULL",
            TokenKind::Comma => "','",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Spatial => "one of BBOX, INTERSECTS, DWITHIN, WITHIN, CONTAINS",
            TokenKind::Not => "NOT",
            TokenKind::Between => "BETWEEN",
            TokenKind::Geometry => "a WKT geometry such as POINT(1 2)",
            TokenKind::End => "end of input",
        }
    }

    /// Operator precedence used when reordering tokens into postfix form.
    ///
    /// Kinds without an entry return `None`. Such operators never force a pop from the operator
    /// stack and are never popped by comparison with an incoming operator.
    pub fn precedence(self) -> Option<u8> {
        match self {
            TokenKind::RParen => Some(3),
            TokenKind::Logical => Some(2),
            TokenKind::Comparison => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified slice of the input text.
///
/// Tokens borrow from the text handed to [`tokenize`](crate::tokenizer::tokenize) and live only
/// as long as a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// The matched text.
    pub text: &'a str,
    /// Everything after the match, with leading whitespace removed.
    pub remainder: &'a str,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.text)
    }
}
