//! The entry point for turning CQL text into a filter tree.

use log::debug;

use crate::ast::FilterNode;
use crate::builder::build;
use crate::error::ParseError;
use crate::tokenizer::tokenize;

/// Parse a CQL filter expression.
///
/// Parsing is a pure function of `text`; nothing is shared between calls.
///
/// # Examples
///
/// ```
/// use sld_cql::{Comparison, ComparisonOperator, FilterNode, Literal};
///
/// let filter = sld_cql::parse("NAME = 'A''B'").unwrap();
/// assert_eq!(
///     filter,
///     FilterNode::from(Comparison::binary(
///         ComparisonOperator::EqualTo,
///         FilterNode::Property("NAME".into()),
///         Literal::from("A'B"),
///     ))
/// );
/// ```
///
/// # Errors
///
/// Returns [`ParseError::EmptyFilter`] for empty or whitespace-only input. Any other failure
/// means the input is not a valid filter expression.
pub fn parse(text: &str) -> Result<FilterNode, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyFilter);
    }
    debug!("parsing CQL filter: {text}");
    build(tokenize(text)?)
}

/// A reusable CQL reader/writer that can remember the last successfully parsed filter.
///
/// This is a convenience for form-like callers that want to re-read the last result without
/// parsing the text again.
#[derive(Debug, Clone, Default)]
pub struct CqlCompiler {
    keep_data: bool,
    data: Option<FilterNode>,
}

impl CqlCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether successful parses are retained and available from [`CqlCompiler::data`].
    pub fn with_keep_data(mut self, keep_data: bool) -> Self {
        self.keep_data = keep_data;
        self
    }

    pub fn keep_data(&self) -> bool {
        self.keep_data
    }

    /// Parse `text`, keeping a copy of the result if `keep_data` is set. A failed parse leaves any
    /// previously kept filter untouched.
    pub fn parse(&mut self, text: &str) -> Result<FilterNode, ParseError> {
        let filter = parse(text)?;
        if self.keep_data {
            self.data = Some(filter.clone());
        }
        Ok(filter)
    }

    /// The last filter parsed while `keep_data` was set.
    pub fn data(&self) -> Option<&FilterNode> {
        self.data.as_ref()
    }

    /// Serialize a filter back into CQL.
    pub fn write(&self, filter: &FilterNode) -> String {
        filter.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(parse(""), Err(ParseError::EmptyFilter));
        assert_eq!(parse("  \n\t"), Err(ParseError::EmptyFilter));
    }

    #[test]
    fn keeps_last_successful_result_only_when_asked() {
        let mut compiler = CqlCompiler::new();
        compiler.parse("A = 1").unwrap();
        assert!(compiler.data().is_none());

        let mut compiler = CqlCompiler::new().with_keep_data(true);
        let first = compiler.parse("A = 1").unwrap();
        assert_eq!(compiler.data(), Some(&first));

        assert!(compiler.parse("A = ").is_err());
        assert_eq!(compiler.data(), Some(&first));

        let second = compiler.parse("B IS NULL").unwrap();
        assert_eq!(compiler.data(), Some(&second));
    }

    #[test]
    fn write_matches_display() {
        let compiler = CqlCompiler::new();
        let filter = parse("NOT (A = 'x')").unwrap();
        assert_eq!(compiler.write(&filter), "NOT (A = 'x')");
    }
}
