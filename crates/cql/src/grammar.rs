//! Follow-set table driving the tokenizer.
//!
//! Rather than tokenizing everything and validating afterwards, the tokenizer only tries the kinds
//! that may legally appear after the previous token. An input is rejected at the first token that
//! does not fit.

use crate::token::TokenKind::{self, *};

/// Kinds that may start an expression.
pub const INITIAL: &[TokenKind] = &[Not, Geometry, Spatial, Property, LParen];

/// Returns the kinds that may follow `kind`, in the order they are tried.
///
/// `End` has no successors and returns `None`.
pub fn follows(kind: TokenKind) -> Option<&'static [TokenKind]> {
    let next: &'static [TokenKind] = match kind {
        // Keyword kinds come before PROPERTY: a keyword is also a valid identifier
        LParen => &[Geometry, Spatial, Not, Property, Value, LParen],
        RParen => &[Not, Logical, End, RParen],
        Property => &[Comparison, Between, Comma, IsNull],
        Between => &[Value],
        // No LOGICAL here: IS NULL has no precedence, so a trailing `AND ...` would be folded
        // into its property. `(A IS NULL) AND ...` works.
        IsNull => &[End, RParen],
        Comparison => &[Value],
        Comma => &[Geometry, Value, Property],
        Value => &[Logical, Comma, RParen, End],
        Spatial => &[LParen],
        Logical => &[Not, Value, Spatial, Property, LParen],
        Not => &[Not, Spatial, Property, LParen],
        Geometry => &[Comma, RParen, End],
        End => return None,
    };
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[TokenKind] = &[
        Property, Comparison, Value, Logical, IsNull, Comma, LParen, RParen, Spatial, Not,
        Between, Geometry, End,
    ];

    #[test]
    fn every_kind_but_end_has_successors() {
        for kind in ALL {
            match kind {
                End => assert!(follows(*kind).is_none()),
                other => assert!(
                    follows(*other).is_some_and(|next| !next.is_empty()),
                    "{other} has no successors"
                ),
            }
        }
    }

    #[test]
    fn end_is_reachable_only_from_closing_kinds() {
        let closers: Vec<TokenKind> = ALL
            .iter()
            .copied()
            .filter(|kind| follows(*kind).is_some_and(|next| next.contains(&End)))
            .collect();
        assert_eq!(closers, vec![Value, IsNull, RParen, Geometry]);
    }

    #[test]
    fn keyword_kinds_are_tried_before_property() {
        let lists = std::iter::once(INITIAL)
            .chain(ALL.iter().filter_map(|kind| follows(*kind)));
        for next in lists {
            if let Some(property) = next.iter().position(|kind| *kind == Property) {
                for keyword in [Not, Spatial, Geometry] {
                    if let Some(idx) = next.iter().position(|kind| *kind == keyword) {
                        assert!(idx < property, "{keyword} is tried after PROPERTY in {next:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn initial_kinds_cannot_end_an_expression() {
        assert!(!INITIAL.contains(&End));
        assert!(!INITIAL.contains(&Value));
    }
}
