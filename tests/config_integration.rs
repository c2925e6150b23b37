//! Integration tests for `tabula.toml` configuration.
//!
//! These tests verify that configuration flows into compilation and paging:
//! - Parsing, validation and environment overrides
//! - Compile options derived from the filter section
//! - Page size limits enforced by the pager

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::LazyLock;

use tabula::prelude::*;
use tabula::query::ErrorCode;
use tabula::schema::PagingConfig;

struct Visit(Value);

impl Record for Visit {
    fn field(&self, name: &str) -> FieldValue<'_> {
        self.0.field(name)
    }
}

impl Model for Visit {
    fn schema() -> &'static RecordSchema {
        static SCHEMA: LazyLock<RecordSchema> = LazyLock::new(|| {
            RecordSchema::builder("Visit")
                .field("id", FieldType::Int64)
                .field("seen_at", FieldType::DateTime)
                .build()
                .expect("valid schema")
        });
        &SCHEMA
    }
}

const FULL_CONFIG: &str = r#"
    [paging]
    default_page_size = 20
    max_page_size = 100

    [filter]
    minute_split = "truncated"
    default_date_time_format = "date"

    [debug]
    log_predicates = true

    [environments.ci.paging]
    default_page_size = 5
    max_page_size = 10

    [environments.ci.filter]
    minute_split = "component-wise"
"#;

#[test]
fn test_parse_full_config() {
    let config = TabulaConfig::from_str(FULL_CONFIG).unwrap();

    assert_eq!(config.paging.default_page_size, 20);
    assert_eq!(config.paging.max_page_size, 100);
    assert_eq!(config.filter.minute_split, MinuteSplit::Truncated);
    assert_eq!(config.filter.default_date_time_format, DateTimeFormat::Date);
    assert!(config.debug.log_predicates);
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = TabulaConfig::from_str("").unwrap();

    assert_eq!(config.paging, PagingConfig::default());
    assert_eq!(Pager::from_config(&config.paging), Pager::default());
    assert_eq!(CompileOptions::from(&config), CompileOptions::default());
}

#[test]
fn test_environment_override_applies() {
    let config = TabulaConfig::from_str(FULL_CONFIG)
        .unwrap()
        .with_environment("ci")
        .unwrap();

    assert_eq!(config.paging.default_page_size, 5);
    assert_eq!(config.paging.max_page_size, 10);
    assert_eq!(config.filter.minute_split, MinuteSplit::ComponentWise);
    // Not overridden.
    assert_eq!(config.filter.default_date_time_format, DateTimeFormat::Date);
}

#[test]
fn test_unknown_environment_is_a_no_op() {
    let base = TabulaConfig::from_str(FULL_CONFIG).unwrap();
    let config = base.clone().with_environment("production").unwrap();

    assert_eq!(config.paging, base.paging);
    assert_eq!(config.filter, base.filter);
}

#[test]
fn test_invalid_config_rejected() {
    let unknown_key = TabulaConfig::from_str("[filter]\nsplit = \"truncated\"").unwrap_err();
    let bad_split = TabulaConfig::from_str("[filter]\nminute_split = \"hourly\"").unwrap_err();
    let bad_sizes =
        TabulaConfig::from_str("[paging]\ndefault_page_size = 50\nmax_page_size = 10").unwrap_err();

    for err in [unknown_key, bad_split, bad_sizes] {
        let err = QueryError::from(err);
        assert!(err.is_configuration_error(), "{}", err.display_full());
    }
}

#[test]
fn test_missing_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = QueryError::from(TabulaConfig::from_file(dir.path().join("tabula.toml")).unwrap_err());
    assert_eq!(err.code, ErrorCode::InvalidConfiguration);
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tabula.toml");
    std::fs::write(&path, "[paging]\ndefault_page_size = 15\n").unwrap();

    let config = TabulaConfig::from_file(&path).unwrap();
    assert_eq!(config.paging.default_page_size, 15);
}

#[test]
fn test_compile_options_follow_filter_section() {
    let config = TabulaConfig::from_str(FULL_CONFIG).unwrap();
    let options = CompileOptions::from(&config);

    assert_eq!(options.minute_split, MinuteSplit::Truncated);
    assert_eq!(options.default_date_time_format, DateTimeFormat::Date);
    assert!(options.log_predicates);

    // The filter section alone never turns on predicate logging.
    assert!(!CompileOptions::from(&config.filter).log_predicates);
}

#[test]
fn test_configured_granularity_applies_to_unformatted_columns() {
    let config = TabulaConfig::from_str(FULL_CONFIG).unwrap();
    let options = CompileOptions::from(&config);

    let mut rule = FilterRule::<Visit>::for_column(Column::new("seen_at"), Operator::Equals).unwrap();
    rule.update_filter_value(Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap());
    let predicate = rule.generate_expression_with(&options).unwrap();

    let (sql, _) = predicate.to_sql(0);
    assert_eq!(sql, "CAST(seen_at AS DATE) = $1");

    let later_that_day = Visit(json!({ "id": 1, "seen_at": "2024-07-01T23:59:00Z" }));
    let next_day = Visit(json!({ "id": 2, "seen_at": "2024-07-02T00:00:00Z" }));
    assert!(predicate.evaluate(&later_that_day));
    assert!(!predicate.evaluate(&next_day));
}

#[test]
fn test_request_compiles_with_configured_options() {
    let config = TabulaConfig::from_str(FULL_CONFIG).unwrap();
    let column = Column::new("seen_at").with_date_time_format(DateTimeFormat::DateHourMinute);
    let rule = FilterRule::<Visit>::for_column(column, Operator::GreaterThan).unwrap();

    let args = RequestArgs::from_pager(Pager::from_config(&config.paging), vec![rule])
        .with_options(CompileOptions::from(&config));

    let (sql, params) = args.filter_expression().unwrap().to_sql(0);
    assert_eq!(sql, "date_trunc('minute', seen_at) > $1");
    assert_eq!(params.len(), 1);
    assert_eq!(args.pager().page_size(), 20);
}

#[test]
fn test_pager_respects_max_page_size() {
    let paging = TabulaConfig::from_str(FULL_CONFIG).unwrap().paging;

    let within = Pager::new(1, 100, "", SortDirection::Ascending).unwrap();
    assert!(within.validate_with(&paging).is_ok());

    let over = Pager::new(1, 101, "", SortDirection::Ascending).unwrap();
    let err = over.validate_with(&paging).unwrap_err();
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(!err.context.suggestions.is_empty());
}
