//! Turns a validated token list into a [`FilterNode`] tree.
//!
//! Tokens are first reordered into postfix form with an operator stack (a shunting-yard variant
//! driven by [`TokenKind::precedence`]) and the tree is then assembled recursively by popping
//! from the end of the postfix list.
//!
//! Precedence is partial. `COMPARISON` (1) and `LOGICAL` (2) pop operators of equal
//! or lower value, while `BETWEEN`, `IS_NULL`, `NOT`, `SPATIAL` and `(` have no precedence at all:
//! they never cause a pop and are never popped by comparison. As a result `NOT` applies to
//! everything that follows it, and a `BETWEEN` or `IS NULL` followed by another logical operator
//! needs parentheses.

use log::trace;

use crate::ast::{
    Bounds, Comparison, FilterNode, Geometry, Literal, Logical, LogicalOperator, Spatial,
    SpatialOperator,
};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

/// Build a filter tree from the output of [`tokenize`](crate::tokenizer::tokenize).
///
/// # Errors
///
/// Returns [`ParseError::UnbalancedExpression`] if the operators and operands do not reduce to
/// exactly one tree, and [`ParseError::InvalidOperand`] if an operand has the wrong shape.
pub fn build(tokens: Vec<Token<'_>>) -> Result<FilterNode, ParseError> {
    let mut postfix = to_postfix(tokens)?;
    trace!(
        "postfix: {}",
        postfix
            .iter()
            .map(|token| token.text)
            .collect::<Vec<_>>()
            .join(" ")
    );

    let tree = build_tree(&mut postfix)?;
    if !postfix.is_empty() {
        let remaining = postfix
            .iter()
            .rev()
            .map(|token| token.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ParseError::UnbalancedExpression(format!(
            "remaining tokens after building the tree: {remaining}"
        )));
    }
    Ok(tree)
}

/// Reorder tokens into postfix form. Commas, parentheses and the end marker are dropped.
pub fn to_postfix(tokens: Vec<Token<'_>>) -> Result<Vec<Token<'_>>, ParseError> {
    let mut operators: Vec<Token<'_>> = Vec::new();
    let mut postfix = Vec::with_capacity(tokens.len());

    for token in tokens {
        match token.kind {
            TokenKind::Property | TokenKind::Geometry | TokenKind::Value => postfix.push(token),
            TokenKind::Comparison | TokenKind::Between | TokenKind::IsNull | TokenKind::Logical => {
                while operators
                    .last()
                    .is_some_and(|top| binds_before(top.kind, token.kind))
                {
                    postfix.extend(operators.pop());
                }
                operators.push(token);
            }
            TokenKind::Spatial | TokenKind::Not | TokenKind::LParen => operators.push(token),
            TokenKind::RParen => {
                loop {
                    match operators.pop() {
                        Some(op) if op.kind == TokenKind::LParen => break,
                        Some(op) => postfix.push(op),
                        None => {
                            return Err(ParseError::UnbalancedExpression(
                                "closing parenthesis without a matching opening one".into(),
                            ));
                        }
                    }
                }
                // A spatial call closes with its operator right after its arguments
                if operators
                    .last()
                    .is_some_and(|top| top.kind == TokenKind::Spatial)
                {
                    postfix.extend(operators.pop());
                }
            }
            TokenKind::Comma | TokenKind::End => {}
        }
    }

    while let Some(op) = operators.pop() {
        if op.kind == TokenKind::LParen {
            return Err(ParseError::UnbalancedExpression(
                "opening parenthesis is never closed".into(),
            ));
        }
        postfix.push(op);
    }
    Ok(postfix)
}

/// Whether the operator on top of the stack must be emitted before `incoming` is pushed.
fn binds_before(top: TokenKind, incoming: TokenKind) -> bool {
    top.precedence()
        .zip(incoming.precedence())
        .is_some_and(|(top, incoming)| top <= incoming)
}

fn build_tree(postfix: &mut Vec<Token<'_>>) -> Result<FilterNode, ParseError> {
    let token = postfix.pop().ok_or_else(|| {
        ParseError::UnbalancedExpression("ran out of operands while building the tree".into())
    })?;

    match token.kind {
        TokenKind::Logical => {
            let rhs = build_tree(postfix)?;
            let lhs = build_tree(postfix)?;
            let op: LogicalOperator = token.text.parse()?;
            Ok(Logical::binary(op, lhs, rhs).into())
        }
        TokenKind::Not => {
            let operand = build_tree(postfix)?;
            Ok(Logical::not(operand).into())
        }
        TokenKind::Between => {
            // The AND separating the two bounds
            match postfix.pop() {
                Some(separator)
                    if separator.kind == TokenKind::Logical
                        && separator.text.eq_ignore_ascii_case("AND") => {}
                Some(other) => {
                    return Err(ParseError::UnbalancedExpression(format!(
                        "BETWEEN bounds must be separated by AND, found {other}"
                    )));
                }
                None => {
                    return Err(ParseError::UnbalancedExpression(
                        "BETWEEN is missing its bounds".into(),
                    ));
                }
            }
            let upper = expect_literal(build_tree(postfix)?)?;
            let lower = expect_literal(build_tree(postfix)?)?;
            let property = build_tree(postfix)?;
            Ok(Comparison::between(property, lower, upper).into())
        }
        TokenKind::Comparison => {
            let value = build_tree(postfix)?;
            let property = build_tree(postfix)?;
            Ok(Comparison::binary(token.text.parse()?, property, value).into())
        }
        TokenKind::IsNull => {
            let property = build_tree(postfix)?;
            Ok(Comparison::is_null(property).into())
        }
        TokenKind::Value => Ok(parse_literal(token.text)?.into()),
        TokenKind::Spatial => build_spatial(token.text.parse()?, postfix),
        TokenKind::Geometry => Ok(Geometry::from_wkt(token.text)?.into()),
        TokenKind::Property => Ok(FilterNode::Property(token.text.to_string())),
        TokenKind::Comma | TokenKind::LParen | TokenKind::RParen | TokenKind::End => {
            Err(ParseError::UnbalancedExpression(format!(
                "unexpected {token} in expression"
            )))
        }
    }
}

/// Pop the arguments of a spatial call. They come off the list in reverse order.
fn build_spatial(
    op: SpatialOperator,
    postfix: &mut Vec<Token<'_>>,
) -> Result<FilterNode, ParseError> {
    let spatial = match op {
        SpatialOperator::Bbox => {
            let max_y = expect_number(build_tree(postfix)?)?;
            let max_x = expect_number(build_tree(postfix)?)?;
            let min_y = expect_number(build_tree(postfix)?)?;
            let min_x = expect_number(build_tree(postfix)?)?;
            let property = expect_property(build_tree(postfix)?)?;
            Spatial::bbox(property, Bounds::new(min_x, min_y, max_x, max_y))
        }
        SpatialOperator::Intersects | SpatialOperator::Within | SpatialOperator::Contains => {
            let geometry = expect_geometry(build_tree(postfix)?)?;
            let property = expect_property(build_tree(postfix)?)?;
            Spatial::relate(op, property, geometry)
        }
        SpatialOperator::DWithin => {
            let distance = expect_number(build_tree(postfix)?)?;
            let geometry = expect_geometry(build_tree(postfix)?)?;
            let property = expect_property(build_tree(postfix)?)?;
            Spatial::dwithin(property, geometry, distance)
        }
    };
    Ok(spatial.into())
}

/// Convert the text of a `VALUE` token. Quoted text becomes a string with `''` collapsed to `'`,
/// anything else a finite number.
pub fn parse_literal(text: &str) -> Result<Literal, ParseError> {
    if let Some(inner) = text
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return Ok(Literal::String(inner.replace("''", "'")));
    }

    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Literal::Number(n)),
        _ => Err(ParseError::InvalidOperand {
            expected: "finite number",
            found: text.to_string(),
        }),
    }
}

fn expect_literal(node: FilterNode) -> Result<Literal, ParseError> {
    match node {
        FilterNode::Literal(literal) => Ok(literal),
        other => Err(invalid("literal value", &other)),
    }
}

fn expect_number(node: FilterNode) -> Result<f64, ParseError> {
    match node {
        FilterNode::Literal(Literal::Number(n)) => Ok(n),
        other => Err(invalid("number", &other)),
    }
}

fn expect_property(node: FilterNode) -> Result<String, ParseError> {
    match node {
        FilterNode::Property(name) => Ok(name),
        other => Err(invalid("property name", &other)),
    }
}

fn expect_geometry(node: FilterNode) -> Result<Geometry, ParseError> {
    match node {
        FilterNode::Geometry(geometry) => Ok(geometry),
        other => Err(invalid("geometry", &other)),
    }
}

fn invalid(expected: &'static str, found: &FilterNode) -> ParseError {
    ParseError::InvalidOperand {
        expected,
        found: found.describe(),
    }
}
