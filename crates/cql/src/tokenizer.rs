//! Tokenizer for CQL filter expressions.
//!
//! Every [`TokenKind`] has a matcher anchored at the start of the remaining input. At each position
//! only the kinds allowed by the follow table in [`grammar`](crate::grammar) are tried, in table
//! order, and the first match wins. This means grammatical validation happens while tokenizing:
//! the first token that cannot follow its predecessor is reported as an error.
//!
//! Keywords are case insensitive and must end at a word boundary, so `NOTE` is a property and not
//! `NOT` followed by `E`.
//!
//! # Examples
//!
//! ```
//! use sld_cql::token::TokenKind;
//! use sld_cql::tokenizer::tokenize;
//!
//! let tokens = tokenize("NAME = 'road'").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![TokenKind::Property, TokenKind::Comparison, TokenKind::Value, TokenKind::End]
//! );
//! ```

use log::trace;
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, tag_no_case, take_while};
use nom::character::complete::{char, multispace1, satisfy};
use nom::combinator::{eof, recognize, verify};
use nom::error::{ErrorKind, make_error};
use nom::multi::many0;
use nom::number::complete::recognize_float;
use nom::sequence::pair;
use nom::{IResult, Parser};

use crate::ast::GeometryType;
use crate::error::ParseError;
use crate::grammar::{INITIAL, follows};
use crate::token::{Token, TokenKind};

/// Split `text` into tokens, validating each against the follow table.
///
/// The returned list always ends with a single [`TokenKind::End`] token.
///
/// # Errors
///
/// Returns [`ParseError::UnexpectedToken`] at the first position where none of the allowed kinds
/// match.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = Vec::new();
    let mut remaining = text.trim_start();
    let mut expected = INITIAL;

    loop {
        let token = next_token(remaining, expected)?;
        trace!("token {token}");
        remaining = token.remainder;
        tokens.push(token);

        if token.kind == TokenKind::End {
            return Ok(tokens);
        }
        expected = follows(token.kind).ok_or(ParseError::UngrammaticalSequence(token.kind))?;
    }
}

/// Match the first of `expected` that fits the start of `input`.
pub fn next_token<'a>(input: &'a str, expected: &[TokenKind]) -> Result<Token<'a>, ParseError> {
    for &kind in expected {
        if let Ok((rest, text)) = match_kind(kind, input) {
            return Ok(Token {
                kind,
                text,
                remainder: rest.trim_start(),
            });
        }
    }

    Err(ParseError::UnexpectedToken {
        input: input.to_string(),
        expected: expected.to_vec(),
    })
}

fn match_kind(kind: TokenKind, input: &str) -> IResult<&str, &str> {
    match kind {
        TokenKind::Property => property(input),
        TokenKind::Comparison => comparison(input),
        TokenKind::Value => value(input),
        TokenKind::Logical => alt((keyword("AND"), keyword("OR"))).parse(input),
        TokenKind::IsNull => is_null(input),
        TokenKind::Comma => tag(",").parse(input),
        TokenKind::LParen => tag("(").parse(input),
        TokenKind::RParen => tag(")").parse(input),
        TokenKind::Spatial => spatial(input),
        TokenKind::Not => keyword("NOT").parse(input),
        TokenKind::Between => keyword("BETWEEN").parse(input),
        TokenKind::Geometry => geometry(input),
        TokenKind::End => eof(input),
    }
}

/// Operator keywords that can never name a property.
const RESERVED: &[&str] = &["AND", "OR", "NOT", "BETWEEN", "LIKE", "ILIKE", "IS"];

fn property(input: &str) -> IResult<&str, &str> {
    verify(
        recognize(pair(satisfy(is_ident_start), take_while(is_ident_continue))),
        |name: &str| !RESERVED.iter().any(|word| word.eq_ignore_ascii_case(name)),
    )
    .parse(input)
}

fn comparison(input: &str) -> IResult<&str, &str> {
    alt((
        tag("<>"),
        tag("<="),
        tag(">="),
        tag("="),
        tag("<"),
        tag(">"),
        keyword("LIKE"),
        keyword("ILIKE"),
    ))
    .parse(input)
}

fn value(input: &str) -> IResult<&str, &str> {
    alt((quoted_string, number)).parse(input)
}

/// A single quoted string in which `''` stands for one quote.
fn quoted_string(input: &str) -> IResult<&str, &str> {
    recognize((char('\''), many0(alt((tag("''"), is_not("'")))), char('\''))).parse(input)
}

/// A signed decimal number: `12`, `12.`, `12.5`, `.5`, with an optional exponent.
fn number(input: &str) -> IResult<&str, &str> {
    recognize_float(input)
}

fn is_null(input: &str) -> IResult<&str, &str> {
    let (rest, matched) =
        recognize((tag_no_case("IS"), multispace1, tag_no_case("NULL"))).parse(input)?;
    word_boundary(input, rest, matched)
}

fn spatial(input: &str) -> IResult<&str, &str> {
    alt((
        keyword("BBOX"),
        keyword("INTERSECTS"),
        keyword("DWITHIN"),
        keyword("WITHIN"),
        keyword("CONTAINS"),
    ))
    .parse(input)
}

/// A WKT geometry. After the type keyword the matcher counts parenthesis depth so the whole
/// coordinate payload, nested rings included, becomes one token.
fn geometry(input: &str) -> IResult<&str, &str> {
    let (after_type, _) = geometry_type(input)?;
    let body = after_type.trim_start();
    if !body.starts_with('(') {
        return Err(nom::Err::Error(make_error(body, ErrorKind::Char)));
    }

    let body_start = input.len() - body.len();
    let mut depth = 0usize;
    for (idx, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let end = body_start + idx + 1;
                    return Ok((&input[end..], &input[..end]));
                }
            }
            _ => {}
        }
    }

    // Ran out of input before the parentheses balanced
    Err(nom::Err::Error(make_error(input, ErrorKind::Eof)))
}

fn geometry_type(input: &str) -> IResult<&str, &str> {
    for kind in GeometryType::ALL {
        if let Ok(matched) = keyword(kind.name()).parse(input) {
            return Ok(matched);
        }
    }
    Err(nom::Err::Error(make_error(input, ErrorKind::Alpha)))
}

/// Case insensitive keyword that must not run on into an identifier character.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| {
        let (rest, matched) = tag_no_case(word).parse(input)?;
        word_boundary(input, rest, matched)
    }
}

fn word_boundary<'a>(input: &'a str, rest: &'a str, matched: &'a str) -> IResult<&'a str, &'a str> {
    if rest.chars().next().is_some_and(is_ident_continue) {
        Err(nom::Err::Error(make_error(input, ErrorKind::Alpha)))
    } else {
        Ok((rest, matched))
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}
