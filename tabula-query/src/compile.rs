//! Rule compilation: from (path, kind, operator, value) to a [`Predicate`].
//!
//! Non-DateTime rules compile to a single operator application. DateTime
//! rules compare at the column's granularity:
//!
//! | Granularity | Shape |
//! |---|---|
//! | `Date` | `CAST(field AS DATE) op date(value)` |
//! | `DateHourMinute` | component-wise: date, hour and minute each compared with `op` and AND-ed, or truncated: `date_trunc('minute', field) op trunc(value)` |
//! | `DateHourMinuteSecond` | `field op value` |

use chrono::{DateTime, Timelike, Utc};
use tracing::trace;

use tabula_schema::{DateTimeFormat, FilterConfig, MinuteSplit, TabulaConfig, ValueKind};

use crate::error::{QueryError, QueryResult};
use crate::operator::Operator;
use crate::predicate::{Access, FieldRef, Operand, Predicate, truncate_to_minute};
use crate::value::FilterValue;

/// Knobs for rule compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// How minute-granularity DateTime rules are compiled.
    pub minute_split: MinuteSplit,
    /// Granularity for DateTime columns that do not set one.
    pub default_date_time_format: DateTimeFormat,
    /// Log every compiled predicate at debug level.
    pub log_predicates: bool,
}

impl CompileOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minute split mode.
    pub fn minute_split(mut self, split: MinuteSplit) -> Self {
        self.minute_split = split;
        self
    }

    /// Set the fallback DateTime granularity.
    pub fn default_date_time_format(mut self, format: DateTimeFormat) -> Self {
        self.default_date_time_format = format;
        self
    }
}

impl From<&FilterConfig> for CompileOptions {
    fn from(config: &FilterConfig) -> Self {
        Self {
            minute_split: config.minute_split,
            default_date_time_format: config.default_date_time_format,
            log_predicates: false,
        }
    }
}

impl From<&TabulaConfig> for CompileOptions {
    fn from(config: &TabulaConfig) -> Self {
        Self {
            log_predicates: config.debug.log_predicates,
            ..Self::from(&config.filter)
        }
    }
}

/// What a single rule compiles from.
pub(crate) struct RuleInput<'a> {
    pub path: &'a str,
    pub kind: &'a ValueKind,
    pub nullable: bool,
    pub format: DateTimeFormat,
    pub operator: Operator,
    pub value: Option<&'a FilterValue>,
}

/// Compile one rule.
pub(crate) fn compile_rule(input: RuleInput<'_>, options: &CompileOptions) -> QueryResult<Predicate> {
    let RuleInput {
        path,
        kind,
        nullable,
        format,
        operator,
        value,
    } = input;

    if !operator.allows_column(kind, nullable) {
        return Err(QueryError::incompatible_operator(operator, path, kind));
    }

    let value = if operator.value_required() {
        let value = value.ok_or_else(|| {
            QueryError::invalid_value(path, format!("{} requires a value", operator))
        })?;
        let coerced = value.coerce_to(kind).map_err(|e| {
            QueryError::invalid_value(path, e.to_string())
                .with_context("Compiling filter rule")
                .with_source(e)
        })?;
        Some(coerced)
    } else {
        None
    };

    trace!(path, %operator, kind = %kind, ?value, "compiling filter rule");

    if *kind == ValueKind::DateTime {
        return compile_date_time(path, format, operator, value, options);
    }

    let field = match kind {
        ValueKind::Enum(def) => FieldRef::new(path).with_access(Access::Ordinal(def.clone())),
        _ => FieldRef::new(path),
    };
    let operand = value
        .map(|value| to_operand(kind, &value, path))
        .transpose()?;
    operator.compile(field, operand)
}

fn to_operand(kind: &ValueKind, value: &FilterValue, path: &str) -> QueryResult<Operand> {
    match (kind, value) {
        (ValueKind::Enum(def), FilterValue::Enum(member)) => def
            .ordinal_of(member)
            .map(Operand::Int)
            .ok_or_else(|| {
                QueryError::invalid_value(path, format!("`{}` is not a member of enum {}", member, def.name))
            }),
        _ => Ok(Operand::from_value(value)),
    }
}

fn compile_date_time(
    path: &str,
    format: DateTimeFormat,
    operator: Operator,
    value: Option<FilterValue>,
    options: &CompileOptions,
) -> QueryResult<Predicate> {
    let instant = match value {
        Some(FilterValue::DateTime(dt)) => Some(dt),
        Some(other) => {
            return Err(QueryError::invalid_kind(format!(
                "DateTime rule on `{}` carries a {} value",
                path,
                other.variant_name()
            )));
        }
        None => None,
    };
    let field = |access| FieldRef::new(path).with_access(access);
    let part = |access, operand: Option<Operand>| operator.compile(field(access), operand);

    match format {
        DateTimeFormat::Date => part(Access::Date, instant.map(|dt| Operand::Date(dt.date_naive()))),
        DateTimeFormat::DateHourMinuteSecond => part(Access::Value, instant.map(Operand::DateTime)),
        DateTimeFormat::DateHourMinute => match options.minute_split {
            MinuteSplit::ComponentWise => Ok(Predicate::And(vec![
                part(Access::Date, instant.map(|dt| Operand::Date(dt.date_naive())))?,
                part(Access::Hour, instant.map(|dt| Operand::Int(dt.hour().into())))?,
                part(Access::Minute, instant.map(|dt| Operand::Int(dt.minute().into())))?,
            ])),
            MinuteSplit::Truncated => {
                let operand = instant.map(truncated_operand).transpose()?;
                part(Access::TruncatedMinute, operand)
            }
        },
    }
}

fn truncated_operand(dt: DateTime<Utc>) -> QueryResult<Operand> {
    truncate_to_minute(dt)
        .map(Operand::DateTime)
        .ok_or_else(|| QueryError::internal(format!("cannot truncate {} to the minute", dt)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 30).unwrap()
    }

    fn date_rule(
        format: DateTimeFormat,
        operator: Operator,
        value: &FilterValue,
        options: &CompileOptions,
    ) -> Predicate {
        compile_rule(
            RuleInput {
                path: "created_at",
                kind: &ValueKind::DateTime,
                nullable: true,
                format,
                operator,
                value: Some(value),
            },
            options,
        )
        .unwrap()
    }

    #[test]
    fn test_component_wise_minute_split_yields_three_parts() {
        let value = FilterValue::DateTime(at());
        let predicate = date_rule(
            DateTimeFormat::DateHourMinute,
            Operator::GreaterThanOrEquals,
            &value,
            &CompileOptions::default(),
        );

        let Predicate::And(parts) = &predicate else {
            panic!("expected AND, got {:?}", predicate);
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(
            predicate.to_sql(0).0,
            "(CAST(created_at AS DATE) >= $1 AND EXTRACT(HOUR FROM created_at) >= $2 AND EXTRACT(MINUTE FROM created_at) >= $3)"
        );
        assert_eq!(
            predicate.to_sql(0).1,
            vec![
                Operand::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()),
                Operand::Int(14),
                Operand::Int(5),
            ]
        );
    }

    #[test]
    fn test_null_check_also_splits() {
        let predicate = compile_rule(
            RuleInput {
                path: "created_at",
                kind: &ValueKind::DateTime,
                nullable: true,
                format: DateTimeFormat::DateHourMinute,
                operator: Operator::IsNull,
                value: None,
            },
            &CompileOptions::default(),
        )
        .unwrap();
        assert!(matches!(predicate, Predicate::And(ref parts) if parts.len() == 3));
        assert!(predicate.evaluate(&json!({ "created_at": null })));
        assert!(!predicate.evaluate(&json!({ "created_at": "2024-03-09T14:05:00Z" })));
    }

    #[test]
    fn test_truncated_minute_split() {
        let value = FilterValue::DateTime(at());
        let options = CompileOptions::new().minute_split(MinuteSplit::Truncated);
        let predicate = date_rule(DateTimeFormat::DateHourMinute, Operator::Equals, &value, &options);

        assert_eq!(
            predicate.to_sql(0),
            (
                "date_trunc('minute', created_at) = $1".to_string(),
                vec![Operand::DateTime(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap())]
            )
        );
        assert!(predicate.evaluate(&json!({ "created_at": "2024-03-09T14:05:59Z" })));
        assert!(!predicate.evaluate(&json!({ "created_at": "2024-03-09T14:06:00Z" })));
    }

    #[test]
    fn test_date_granularity_ignores_time() {
        let value = FilterValue::DateTime(at());
        let predicate = date_rule(DateTimeFormat::Date, Operator::Equals, &value, &CompileOptions::default());
        assert!(predicate.evaluate(&json!({ "created_at": "2024-03-09T00:00:01Z" })));
        assert!(!predicate.evaluate(&json!({ "created_at": "2024-03-10T14:05:30Z" })));
    }

    #[test]
    fn test_second_granularity_is_exact() {
        let value = FilterValue::DateTime(at());
        let predicate = date_rule(
            DateTimeFormat::DateHourMinuteSecond,
            Operator::LessThan,
            &value,
            &CompileOptions::default(),
        );
        assert_eq!(predicate.to_sql(0).0, "created_at < $1");
        assert!(predicate.evaluate(&json!({ "created_at": "2024-03-09T14:05:29Z" })));
        assert!(!predicate.evaluate(&json!({ "created_at": "2024-03-09T14:05:30Z" })));
    }

    #[test]
    fn test_incompatible_operator_rejected() {
        let err = compile_rule(
            RuleInput {
                path: "paid",
                kind: &ValueKind::Boolean,
                nullable: false,
                format: DateTimeFormat::default(),
                operator: Operator::GreaterThan,
                value: Some(&FilterValue::Bool(true)),
            },
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::IncompatibleOperator);
    }

    #[test]
    fn test_options_from_config() {
        let config = TabulaConfig::from_str(
            "[filter]\nminute_split = \"truncated\"\n[debug]\nlog_predicates = true",
        )
        .unwrap();
        let options = CompileOptions::from(&config);
        assert_eq!(options.minute_split, MinuteSplit::Truncated);
        assert!(options.log_predicates);
        assert!(!CompileOptions::from(&config.filter).log_predicates);
    }
}
