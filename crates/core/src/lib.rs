//! Shared command line plumbing for the SLD tools: output formats and rule file discovery.

pub mod printer;
pub mod reader;
