use std::path::{Path, PathBuf};

use sld_cql::{FilterNode, Logical, LogicalOperator, SpatialOperator, load_rule_file};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-data/rules")
        .join(name)
}

#[test]
fn compiles_every_filter_in_a_document() -> anyhow::Result<()> {
    let file = load_rule_file(fixture("roads.yaml"))?;
    let compiled = file.compile()?;

    assert_eq!(compiled.name.as_deref(), Some("roads"));
    assert_eq!(compiled.rules.len(), 5);
    assert_eq!(compiled.original(), &file);

    let highways = &compiled.rules[0];
    assert_eq!(highways.name.as_deref(), Some("highways"));
    assert_eq!(highways.title.as_deref(), Some("Highways"));
    assert!(matches!(
        highways.filter,
        Some(FilterNode::Logical(Logical {
            op: LogicalOperator::And,
            ..
        }))
    ));

    let construction = compiled.rules[3]
        .filter
        .as_ref()
        .expect("construction rule has a filter");
    assert_eq!(
        construction.to_string(),
        "(OPENED BETWEEN 2020 AND 2030) AND (STATUS <> 'open')"
    );

    let fallback = &compiled.rules[4];
    assert!(fallback.else_filter);
    assert!(fallback.filter.is_none());
    Ok(())
}

#[test]
fn compiles_spatial_filters() -> anyhow::Result<()> {
    let compiled = load_rule_file(fixture("nested/water.yml"))?.compile()?;
    assert_eq!(compiled.rules.len(), 4);

    let Some(FilterNode::Spatial(harbour)) = &compiled.rules[1].filter else {
        panic!("expected a spatial filter for the harbour rule");
    };
    assert_eq!(harbour.op, SpatialOperator::DWithin);
    assert_eq!(harbour.distance, Some(500.0));

    assert!(compiled.rules[3].filter.is_none());
    Ok(())
}

#[test]
fn compile_stops_at_the_first_invalid_filter() -> anyhow::Result<()> {
    let file = load_rule_file(fixture("invalid.yaml"))?;
    let err = file.compile().expect_err("invalid filters should fail");
    let message = format!("{err:#}");
    assert!(message.contains("rules['dangling'].filter"), "{message}");
    Ok(())
}

#[test]
fn validate_reports_each_rule() -> anyhow::Result<()> {
    let file = load_rule_file(fixture("invalid.yaml"))?;
    let checks = file.validate();

    assert_eq!(checks.len(), 3);
    assert!(checks[0].is_ok());
    assert_eq!(checks[0].rule, "rules['fine']");

    assert!(!checks[1].is_ok());
    assert_eq!(checks[1].filter.as_deref(), Some("POP > 1000 AND"));

    let between = checks[2].error.as_deref().expect("BETWEEN with OR should fail");
    assert!(between.contains("separated by AND"), "{between}");
    Ok(())
}

#[test]
fn duplicate_rule_names_are_rejected() {
    let yaml = "rules:\n  - name: a\n    filter: \"A = 1\"\n  - name: a\n    filter: \"A = 2\"\n";
    let file = sld_cql::from_yaml_str(yaml).unwrap();
    let err = file.compile().expect_err("duplicate names should fail");
    assert!(
        err.to_string()
            .contains("Duplicate rule name 'a' detected at indices 0 and 1"),
        "{err}"
    );
}

#[test]
fn validate_reports_duplicate_rule_names() -> anyhow::Result<()> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-data/duplicate-rules/duplicates.yaml");
    let file = load_rule_file(&path)?;
    assert!(file.compile().is_err());

    let checks = file.validate();
    assert_eq!(checks.len(), 3);
    assert!(checks[0].is_ok());
    assert!(checks[1].is_ok());
    assert_eq!(
        checks[2].error.as_deref(),
        Some("Duplicate rule name 'rivers' detected at indices 0 and 2")
    );
    Ok(())
}

#[test]
fn load_errors_name_the_file() {
    let err = load_rule_file(fixture("missing.yaml")).unwrap_err();
    assert!(format!("{err:#}").contains("missing.yaml"), "{err:#}");
}

#[test]
fn reads_from_any_reader() -> anyhow::Result<()> {
    let yaml = b"name: inline\nrules:\n  - filter: \"KIND = 'x'\"\n";
    let file = sld_cql::from_yaml_reader(&yaml[..])?;
    let compiled = file.compile()?;
    assert_eq!(compiled.rules[0].filter.as_ref().map(ToString::to_string).as_deref(), Some("KIND = 'x'"));
    Ok(())
}
