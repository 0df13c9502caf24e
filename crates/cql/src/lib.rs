//! Library for reading and writing CQL filter expressions as used in SLD style rules.
//!
//! Text goes through three stages: the [`tokenizer`] splits it into tokens while checking each
//! against the [`grammar`] follow table, the [`builder`] reorders the tokens into postfix form and
//! assembles a [`FilterNode`] tree, and the [`writer`] turns a tree back into CQL.

pub mod ast;
pub mod builder;
pub mod compiler;
pub mod error;
pub mod grammar;
pub mod rules;
pub mod token;
pub mod tokenizer;
pub mod writer;

pub use crate::ast::{
    Bounds, Comparison, ComparisonOperator, ComparisonType, FilterNode, Geometry, GeometryType,
    Literal, Logical, LogicalOperator, Spatial, SpatialOperator, SpatialValue,
};
pub use crate::compiler::{CqlCompiler, parse};
pub use crate::error::ParseError;
pub use crate::rules::{
    CompiledRule, CompiledRuleFile, Rule, RuleCheck, RuleFile, from_yaml_reader, from_yaml_str,
    load_rule_file,
};
pub use crate::token::{Token, TokenKind};
pub use crate::writer::to_cql;
pub use anyhow::Result;
