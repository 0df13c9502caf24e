//! YAML style documents whose rules carry CQL filters.
//!
//! A document looks like this:
//!
//! ```yaml
//! name: roads
//! rules:
//!   - name: highways
//!     title: Highways
//!     filter: "TYPE = 'highway'"
//!   - name: other
//!     elseFilter: true
//! ```
//!
//! Deserializing only checks the document structure. [`RuleFile::compile`] parses every filter
//! and [`RuleFile::validate`] reports per-rule results without stopping at the first failure.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::ast::FilterNode;
use crate::compiler::parse;

/// Top-level rule document.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RuleFile {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A single styling rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Rule {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// CQL filter text. A rule without a filter applies to every feature.
    #[serde(default)]
    pub filter: Option<String>,

    /// Applies to features no other rule matched. Cannot be combined with `filter`.
    #[serde(rename = "elseFilter", default)]
    pub else_filter: bool,
}

/// A rule document with every filter parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRuleFile {
    original: RuleFile,
    pub name: Option<String>,
    pub rules: Vec<CompiledRule>,
}

impl CompiledRuleFile {
    /// Returns the document this was compiled from.
    pub fn original(&self) -> &RuleFile {
        &self.original
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub name: Option<String>,
    pub title: Option<String>,
    pub filter: Option<FilterNode>,
    pub else_filter: bool,
}

/// The outcome of checking one rule's filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleCheck {
    /// The rule name, or `rules[<index>]` for unnamed rules.
    pub rule: String,
    pub filter: Option<String>,
    /// The parse error message if the filter is invalid.
    pub error: Option<String>,
}

impl RuleCheck {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl RuleFile {
    /// Parse every filter, failing on the first invalid one.
    pub fn compile(&self) -> Result<CompiledRuleFile> {
        ensure_unique_rule_names(self)?;

        let rules = self
            .rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| compile_rule(rule, idx))
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledRuleFile {
            original: self.clone(),
            name: self.name.clone(),
            rules,
        })
    }

    /// Check every rule and report each result. A rule reusing an earlier rule's name fails.
    pub fn validate(&self) -> Vec<RuleCheck> {
        let mut seen = HashMap::new();
        self.rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                let duplicate = duplicate_name(&mut seen, rule, idx);
                RuleCheck {
                    rule: rule_label(rule, idx),
                    filter: rule.filter.clone(),
                    error: duplicate.or_else(|| {
                        compile_rule(rule, idx).err().map(|err| format!("{err:#}"))
                    }),
                }
            })
            .collect()
    }
}

impl TryFrom<RuleFile> for CompiledRuleFile {
    type Error = anyhow::Error;

    fn try_from(file: RuleFile) -> Result<Self> {
        file.compile()
    }
}

fn ensure_unique_rule_names(file: &RuleFile) -> Result<()> {
    let mut seen = HashMap::new();
    for (idx, rule) in file.rules.iter().enumerate() {
        if let Some(message) = duplicate_name(&mut seen, rule, idx) {
            bail!(message);
        }
    }
    Ok(())
}

/// Records the rule's name and describes the clash if an earlier rule already used it.
fn duplicate_name<'a>(
    seen: &mut HashMap<&'a str, usize>,
    rule: &'a Rule,
    idx: usize,
) -> Option<String> {
    let name = rule.name.as_deref()?;
    if let Some(previous) = seen.get(name) {
        return Some(format!(
            "Duplicate rule name '{name}' detected at indices {previous} and {idx}"
        ));
    }
    seen.insert(name, idx);
    None
}

fn compile_rule(rule: &Rule, index: usize) -> Result<CompiledRule> {
    let label = rule_label(rule, index);
    if rule.else_filter && rule.filter.is_some() {
        bail!("{label} sets both filter and elseFilter");
    }

    let filter = rule
        .filter
        .as_deref()
        .map(parse)
        .transpose()
        .with_context(|| format!("{label}.filter"))?;

    Ok(CompiledRule {
        name: rule.name.clone(),
        title: rule.title.clone(),
        filter,
        else_filter: rule.else_filter,
    })
}

fn rule_label(rule: &Rule, index: usize) -> String {
    match &rule.name {
        Some(name) => format!("rules['{name}']"),
        None => format!("rules[{index}]"),
    }
}

/// Loads a rule document from the provided path.
pub fn load_rule_file(path: impl AsRef<Path>) -> Result<RuleFile> {
    let path = path.as_ref();
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    from_yaml_str(&contents)
}

/// Deserializes a rule document from a YAML string slice.
pub fn from_yaml_str(yaml: &str) -> Result<RuleFile> {
    Ok(serde_norway::from_str(yaml)?)
}

/// Deserializes a rule document from a YAML reader.
pub fn from_yaml_reader<R>(reader: R) -> Result<RuleFile>
where
    R: std::io::Read,
{
    Ok(serde_norway::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_YAML: &str = r#"name: roads
rules:
  - name: highways
    title: Highways
    filter: "TYPE = 'highway' AND LANES >= 2"
  - name: unnamed streets
    filter: "NAME IS NULL"
  - elseFilter: true
"#;

    #[test]
    fn deserialize_example() {
        let parsed = from_yaml_str(EXAMPLE_YAML).expect("example YAML should parse");
        assert_eq!(parsed.name.as_deref(), Some("roads"));
        assert_eq!(parsed.rules.len(), 3);
        assert_eq!(parsed.rules[0].title.as_deref(), Some("Highways"));
        assert!(parsed.rules[2].else_filter);
        assert!(parsed.rules[2].filter.is_none());
    }

    #[test]
    fn deserialize_minimal_document() {
        let parsed = from_yaml_str("rules: []\n").expect("minimal document should parse");
        assert!(parsed.name.is_none());
        assert!(parsed.rules.is_empty());
    }

    #[test]
    fn invalid_structure_returns_error() {
        assert!(from_yaml_str("rules: 123").is_err());
    }

    #[test]
    fn filter_and_else_filter_are_exclusive() {
        let file = from_yaml_str("rules:\n  - filter: \"A = 1\"\n    elseFilter: true\n").unwrap();
        let err = file.compile().expect_err("should reject both");
        assert!(err.to_string().contains("rules[0] sets both filter and elseFilter"));
    }
}
