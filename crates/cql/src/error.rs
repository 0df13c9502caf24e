//! Error types for CQL filter parsing.

use thiserror::Error;

use crate::token::TokenKind;

/// Everything that can go wrong while turning CQL text into a [`FilterNode`](crate::FilterNode).
///
/// Parsing is all or nothing: any of these means the whole input is not a valid filter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// None of the kinds allowed at this position matched the remaining input.
    #[error("In parsing: [{input}], expected one of:{}", describe_expected(.expected))]
    UnexpectedToken {
        /// The remaining, unmatched input.
        input: String,
        /// The kinds that were tried, in order.
        expected: Vec<TokenKind>,
    },
    /// A token kind was produced that the follow table has no entry for.
    #[error("no follow set for token kind {0}")]
    UngrammaticalSequence(TokenKind),
    /// Operators and operands do not reduce to exactly one tree.
    #[error("unbalanced expression: {0}")]
    UnbalancedExpression(String),
    /// An operand reduced to something of the wrong shape, such as a string where a BBOX
    /// coordinate was expected.
    #[error("invalid operand, expected {expected} but found {found}")]
    InvalidOperand { expected: &'static str, found: String },
    /// The input was empty or only whitespace.
    #[error("empty filter expression")]
    EmptyFilter,
}

fn describe_expected(expected: &[TokenKind]) -> String {
    expected
        .iter()
        .map(|kind| format!("\n    {kind}: {}", kind.pattern()))
        .collect()
}
