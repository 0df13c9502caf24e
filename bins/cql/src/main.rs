use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use serde::Serialize;
use tabled::Tabled;

use sld_core::{
    printer::{self, Format},
    reader,
};
use sld_cql::{FilterNode, RuleCheck, Token, load_rule_file, tokenizer::tokenize};

/// A command line tool for parsing, inspecting and validating CQL filter expressions.
///
/// Expressions are parsed into a filter tree that can be printed back as normalized CQL or
/// emitted as JSON/CBOR with the structured output formats. The `check` subcommand validates the
/// filters of every rule in one or more YAML style documents.
#[derive(Parser, Debug)]
#[command(name = "sld-cql", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub printer: printer::PrinterArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse one or more expressions
    Parse {
        /// The CQL expressions to parse
        #[arg(required = true, value_name = "EXPR")]
        expressions: Vec<String>,
    },
    /// Show the tokens an expression is split into
    Tokens {
        /// The CQL expression to tokenize
        #[arg(value_name = "EXPR")]
        expression: String,
    },
    /// Convert a JSON filter tree back into CQL
    Write {
        /// File containing the JSON tree. Reads stdin when omitted.
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },
    /// Validate every filter in one or more rule documents
    Check {
        #[command(flatten)]
        read_opts: reader::ReaderOpts,
    },
}

#[derive(Debug, Tabled)]
struct ExpressionRow<'a> {
    input: &'a str,
    cql: String,
}

#[derive(Debug, Tabled)]
struct TokenRow<'a> {
    kind: &'static str,
    text: &'a str,
}

impl<'a> From<&Token<'a>> for TokenRow<'a> {
    fn from(token: &Token<'a>) -> Self {
        TokenRow {
            kind: token.kind.name(),
            text: token.text,
        }
    }
}

/// The result of checking a single rule document.
#[derive(Debug, Serialize)]
struct DocumentReport {
    path: PathBuf,
    /// Set when the document itself could not be read or deserialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    rules: Vec<RuleCheck>,
}

impl DocumentReport {
    fn check(path: &Path) -> Self {
        match load_rule_file(path) {
            Ok(file) => DocumentReport {
                path: path.to_path_buf(),
                error: None,
                rules: file.validate(),
            },
            Err(err) => DocumentReport {
                path: path.to_path_buf(),
                error: Some(format!("{err:#}")),
                rules: vec![],
            },
        }
    }

    fn failures(&self) -> usize {
        usize::from(self.error.is_some()) + self.rules.iter().filter(|r| !r.is_ok()).count()
    }

    fn lines(&self) -> Vec<String> {
        let path = self.path.display();
        if let Some(err) = &self.error {
            return vec![format!("{path}: {err}")];
        }
        self.rules
            .iter()
            .map(|check| match &check.error {
                None => format!("{path}: {}: ok", check.rule),
                Some(err) => format!("{path}: {}: {}", check.rule, err.replace('\n', " ")),
            })
            .collect()
    }

    fn rows(&self) -> Vec<CheckRow> {
        let path = self.path.display().to_string();
        if let Some(err) = &self.error {
            return vec![CheckRow {
                path,
                rule: String::new(),
                status: err.clone(),
            }];
        }
        self.rules
            .iter()
            .map(|check| CheckRow {
                path: path.clone(),
                rule: check.rule.clone(),
                status: check.error.clone().unwrap_or_else(|| "ok".to_string()),
            })
            .collect()
    }
}

#[derive(Debug, Tabled)]
struct CheckRow {
    path: String,
    rule: String,
    status: String,
}

fn parse_expressions(expressions: &[String]) -> Result<Vec<FilterNode>> {
    expressions
        .iter()
        .map(|expr| sld_cql::parse(expr).with_context(|| format!("parsing [{expr}]")))
        .collect()
}

fn read_filter(path: Option<&Path>) -> Result<FilterNode> {
    let json = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin()).context("reading stdin")?,
    };
    serde_json::from_str(&json).context("decoding JSON filter tree")
}

fn run_parse<W: Write>(
    printer: &printer::PrinterArgs,
    expressions: &[String],
    writer: &mut W,
) -> Result<()> {
    let filters = parse_expressions(expressions)?;
    debug!("parsed {} expressions", filters.len());
    match printer.output {
        Format::Plain => printer.output.print_plain(&filters, writer),
        Format::Table => printer.output.print_table(
            expressions.iter().zip(&filters).map(|(input, filter)| ExpressionRow {
                input,
                cql: filter.to_string(),
            }),
            writer,
        ),
        Format::Json | Format::Binary => printer.print_structured(&filters, writer),
    }
}

fn run_tokens<W: Write>(
    printer: &printer::PrinterArgs,
    expression: &str,
    writer: &mut W,
) -> Result<()> {
    let tokens =
        tokenize(expression.trim()).with_context(|| format!("tokenizing [{expression}]"))?;
    match printer.output {
        Format::Plain => printer.output.print_plain(&tokens, writer),
        Format::Table => printer
            .output
            .print_table(tokens.iter().map(TokenRow::from), writer),
        Format::Json | Format::Binary => printer.print_structured(&tokens, writer),
    }
}

fn run_write<W: Write>(
    printer: &printer::PrinterArgs,
    path: Option<&Path>,
    writer: &mut W,
) -> Result<()> {
    let filter = read_filter(path)?;
    let cql = sld_cql::to_cql(&filter);
    match printer.output {
        Format::Plain | Format::Table => printer.output.print_plain([cql], &mut *writer),
        Format::Json | Format::Binary => printer.print_structured(cql, writer),
    }
}

fn run_check<W: Write>(
    printer: &printer::PrinterArgs,
    read_opts: &reader::ReaderOpts,
    writer: &mut W,
) -> Result<()> {
    let paths = read_opts.read_rule_paths()?;
    if paths.is_empty() {
        warn!("no rule documents found under {}", read_opts.path.display());
    }
    let reports: Vec<DocumentReport> = paths.iter().map(|p| DocumentReport::check(p)).collect();
    let failures: usize = reports.iter().map(DocumentReport::failures).sum();
    info!(
        "checked {} documents with {failures} failures",
        reports.len()
    );

    match printer.output {
        Format::Plain => printer
            .output
            .print_plain(reports.iter().flat_map(DocumentReport::lines), writer)?,
        Format::Table => printer
            .output
            .print_table(reports.iter().flat_map(DocumentReport::rows), writer)?,
        Format::Json | Format::Binary => printer.print_structured(&reports, writer)?,
    }

    if failures > 0 {
        bail!("{failures} rule filter(s) failed validation");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::init();

    let mut writer = std::io::stdout().lock();
    match &cli.command {
        Command::Parse { expressions } => run_parse(&cli.printer, expressions, &mut writer),
        Command::Tokens { expression } => run_tokens(&cli.printer, expression, &mut writer),
        Command::Write { path } => run_write(&cli.printer, path.as_deref(), &mut writer),
        Command::Check { read_opts } => run_check(&cli.printer, read_opts, &mut writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    fn rules_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-data/rules")
    }

    fn printer(output: Format) -> printer::PrinterArgs {
        printer::PrinterArgs {
            output,
            pretty: false,
        }
    }

    fn run(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> (Result<()>, String) {
        let mut buffer = Vec::new();
        let result = f(&mut buffer);
        (result, String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_global_output_after_subcommand() {
        let cli = Cli::try_parse_from(["sld-cql", "parse", "A = 1", "-o", "json"]).unwrap();
        assert_eq!(cli.printer.output, Format::Json);
        assert!(matches!(cli.command, Command::Parse { ref expressions } if expressions.len() == 1));
    }

    #[test]
    fn parse_prints_normalized_cql() {
        let expressions = vec!["a = 1 and b = 'x'".to_string(), "C is null".to_string()];
        let (result, out) = run(|w| run_parse(&printer(Format::Plain), &expressions, w));
        result.unwrap();
        assert_eq!(out, "(a = 1) AND (b = 'x')\nC IS NULL\n");
    }

    #[test]
    fn parse_reports_the_failing_expression() {
        let expressions = vec!["A = 1".to_string(), "A =".to_string()];
        let (result, out) = run(|w| run_parse(&printer(Format::Plain), &expressions, w));
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("parsing [A =]"), "{err:#}");
        assert!(out.is_empty());
    }

    #[test]
    fn parse_json_emits_trees() {
        let expressions = vec!["A = 1".to_string()];
        let (result, out) = run(|w| run_parse(&printer(Format::Json), &expressions, w));
        result.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["comparison"]["type"], "EQUAL_TO");
    }

    #[test]
    fn tokens_as_lines_and_table() {
        let (result, out) = run(|w| run_tokens(&printer(Format::Plain), "A = 1", w));
        result.unwrap();
        assert_eq!(out, "PROPERTY: A\nCOMPARISON: =\nVALUE: 1\nEND: \n");

        let (result, out) = run(|w| run_tokens(&printer(Format::Table), "A IS NULL", w));
        result.unwrap();
        assert!(out.contains("IS_NULL"), "{out}");
        assert!(out.contains("kind"), "{out}");
    }

    #[test]
    fn write_converts_json_back_to_cql() -> Result<()> {
        let filter = sld_cql::parse("NOT (A = 1 OR B LIKE 'x%')")?;
        let dir = std::env::temp_dir().join(format!("sld-cql-write-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("filter.json");
        std::fs::write(&path, serde_json::to_string(&filter)?)?;

        let (result, out) = run(|w| run_write(&printer(Format::Plain), Some(&path), w));
        std::fs::remove_dir_all(&dir)?;
        result?;
        assert_eq!(out.trim_end(), "NOT ((A = 1) OR (B LIKE 'x%'))");
        Ok(())
    }

    #[test]
    fn check_passes_valid_documents() {
        let opts = reader::ReaderOpts {
            no_recurse: false,
            path: rules_path().join("roads.yaml"),
        };
        let (result, out) = run(|w| run_check(&printer(Format::Plain), &opts, w));
        result.unwrap();
        assert_eq!(out.lines().count(), 5);
        assert!(out.lines().all(|line| line.ends_with(": ok")), "{out}");
    }

    #[test]
    fn check_fails_when_any_filter_is_invalid() {
        let opts = reader::ReaderOpts {
            no_recurse: false,
            path: rules_path(),
        };
        let (result, out) = run(|w| run_check(&printer(Format::Json), &opts, w));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("2 rule filter(s) failed"), "{err}");

        let reports: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(reports.as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn check_fails_on_duplicate_rule_names() {
        let opts = reader::ReaderOpts {
            no_recurse: false,
            path: rules_path().join("../duplicate-rules"),
        };
        let (result, out) = run(|w| run_check(&printer(Format::Plain), &opts, w));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("1 rule filter(s) failed"), "{err}");
        assert!(
            out.contains("rules['rivers']: Duplicate rule name 'rivers'"),
            "{out}"
        );
    }

    #[test]
    fn unreadable_documents_count_as_failures() {
        let report = DocumentReport::check(&rules_path().join("notes.txt"));
        assert_eq!(report.failures(), 1);
        assert_eq!(report.lines().len(), 1);
    }
}
