//! Compiled predicates.
//!
//! A [`Predicate`] is the result of compiling filter rules. It can be
//! evaluated against any [`Record`] in memory or rendered to parameterised SQL
//! for sources that push filtering down to a database.
//!
//! ```rust
//! use tabula_query::{FieldRef, Operator, Operand, Predicate};
//!
//! let name = Operator::StartsWith
//!     .compile(FieldRef::new("customer.name"), Some(Operand::Text("Ac".into())))
//!     .unwrap();
//! let total = Operator::GreaterThan
//!     .compile(FieldRef::new("total"), Some(Operand::Int(100)))
//!     .unwrap();
//!
//! let (sql, params) = Predicate::True.and_then(name).and_then(total).to_sql(0);
//! assert_eq!(sql, "(customer.name LIKE $1 AND total > $2)");
//! assert_eq!(params.len(), 2);
//! ```

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use regex_lite::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tabula_schema::{DateTimeFormat, EnumDef};

use crate::error::{QueryError, QueryResult};
use crate::record::{FieldValue, Record, lookup};
use crate::value::{FilterValue, parse_date_time};

/// A value on the right-hand side of a comparison.
///
/// Field values are projected into the same shape before comparing, so an
/// `Int16` column compares against an `Int` operand and an enum column against
/// the member's ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Signed integer (also enum ordinals and date components).
    Int(i64),
    /// Unsigned integer too large for `Int`.
    UInt(u64),
    /// Float.
    Float(f64),
    /// Decimal.
    Decimal(Decimal),
    /// Boolean.
    Bool(bool),
    /// Text.
    Text(String),
    /// Instant.
    DateTime(DateTime<Utc>),
    /// Calendar date.
    Date(NaiveDate),
}

enum Number {
    Int(i128),
    Float(f64),
    Decimal(Decimal),
}

impl Operand {
    /// Project a filter value into an operand. Enum members become text.
    pub fn from_value(value: &FilterValue) -> Self {
        match value {
            FilterValue::Int16(v) => Self::Int((*v).into()),
            FilterValue::Int32(v) => Self::Int((*v).into()),
            FilterValue::Int64(v) => Self::Int(*v),
            FilterValue::UInt16(v) => Self::Int((*v).into()),
            FilterValue::UInt32(v) => Self::Int((*v).into()),
            FilterValue::UInt64(v) => Self::UInt(*v),
            FilterValue::Byte(v) => Self::Int((*v).into()),
            FilterValue::Float(v) => Self::Float(*v),
            FilterValue::Decimal(v) => Self::Decimal(*v),
            FilterValue::Bool(v) => Self::Bool(*v),
            FilterValue::Text(v) | FilterValue::Enum(v) => Self::Text(v.clone()),
            FilterValue::DateTime(v) => Self::DateTime(*v),
        }
    }

    fn number(&self) -> Option<Number> {
        match self {
            Self::Int(v) => Some(Number::Int((*v).into())),
            Self::UInt(v) => Some(Number::Int((*v).into())),
            Self::Float(v) => Some(Number::Float(*v)),
            Self::Decimal(v) => Some(Number::Decimal(*v)),
            _ => None,
        }
    }

    /// Order two operands of compatible shape.
    ///
    /// Numbers compare across representations; RFC 3339 text compares against
    /// instants. Anything else of differing shape is incomparable.
    pub fn compare(&self, other: &Operand) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.number(), other.number()) {
            return compare_numbers(a, b);
        }

        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Text(text), Self::DateTime(b)) => {
                parse_date_time(text, DateTimeFormat::default()).map(|a| a.cmp(b))
            }
            (Self::DateTime(a), Self::Text(text)) => {
                parse_date_time(text, DateTimeFormat::default()).map(|b| a.cmp(&b))
            }
            _ => None,
        }
    }
}

fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
        (Number::Float(a), b) => a.partial_cmp(&number_to_f64(b)?),
        (a, Number::Float(b)) => number_to_f64(a)?.partial_cmp(&b),
        (a, b) => Some(number_to_decimal(a)?.cmp(&number_to_decimal(b)?)),
    }
}

fn number_to_f64(n: Number) -> Option<f64> {
    match n {
        Number::Int(v) => Some(v as f64),
        Number::Float(v) => Some(v),
        Number::Decimal(v) => v.to_f64(),
    }
}

fn number_to_decimal(n: Number) -> Option<Decimal> {
    match n {
        Number::Int(v) => Decimal::from_i128(v),
        Number::Float(v) => Decimal::from_f64(v),
        Number::Decimal(v) => Some(v),
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Self::DateTime(v) => write!(f, "'{}'", v.to_rfc3339()),
            Self::Date(v) => write!(f, "'{}'", v),
        }
    }
}

/// Which part of a field's value a predicate looks at.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// The value itself.
    Value,
    /// The calendar date of an instant.
    Date,
    /// The hour of an instant.
    Hour,
    /// The minute of an instant.
    Minute,
    /// An instant truncated to the minute.
    TruncatedMinute,
    /// The ordinal of an enum member.
    Ordinal(Arc<EnumDef>),
}

/// A property path plus the part of its value being compared.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    path: String,
    segments: Vec<String>,
    access: Access,
}

impl FieldRef {
    /// Reference the value at a dot-separated path.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let segments = path.split('.').map(str::to_string).collect();
        Self {
            path,
            segments,
            access: Access::Value,
        }
    }

    /// Look at a different part of the value.
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// The dot-separated path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The accessed part.
    pub fn access(&self) -> &Access {
        &self.access
    }

    /// Project a record value into an operand according to the access.
    fn project(&self, value: FilterValue) -> Option<Operand> {
        let instant = |value: &FilterValue| match value {
            FilterValue::DateTime(dt) => Some(*dt),
            FilterValue::Text(text) => parse_date_time(text, DateTimeFormat::default()),
            _ => None,
        };

        match &self.access {
            Access::Value => Some(Operand::from_value(&value)),
            Access::Date => instant(&value).map(|dt| Operand::Date(dt.date_naive())),
            Access::Hour => instant(&value).map(|dt| Operand::Int(dt.hour().into())),
            Access::Minute => instant(&value).map(|dt| Operand::Int(dt.minute().into())),
            Access::TruncatedMinute => instant(&value)
                .and_then(truncate_to_minute)
                .map(Operand::DateTime),
            Access::Ordinal(def) => match value {
                FilterValue::Enum(name) | FilterValue::Text(name) => {
                    def.ordinal_of(&name).map(Operand::Int)
                }
                other => other
                    .as_integer()
                    .and_then(|v| i64::try_from(v).ok())
                    .map(Operand::Int),
            },
        }
    }

    /// SQL expression for this reference.
    pub fn to_sql(&self) -> String {
        let column = self.segments.join(".");
        match self.access {
            Access::Value | Access::Ordinal(_) => column,
            Access::Date => format!("CAST({} AS DATE)", column),
            Access::Hour => format!("EXTRACT(HOUR FROM {})", column),
            Access::Minute => format!("EXTRACT(MINUTE FROM {})", column),
            Access::TruncatedMinute => format!("date_trunc('minute', {})", column),
        }
    }
}

/// Drop seconds and sub-second precision.
pub(crate) fn truncate_to_minute(dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
    dt.with_second(0)?.with_nanosecond(0)
}

/// Comparison operators a predicate can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`, with null counting as different.
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl CompareOp {
    /// SQL operator. Inequality uses `IS DISTINCT FROM` so null rows match it
    /// the same way they do in memory.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "IS DISTINCT FROM",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }

    fn holds(self, ordering: Option<Ordering>) -> bool {
        match self {
            Self::Eq => ordering == Some(Ordering::Equal),
            Self::Ne => ordering != Some(Ordering::Equal),
            Self::Gt => ordering == Some(Ordering::Greater),
            Self::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            Self::Lt => ordering == Some(Ordering::Less),
            Self::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

/// A SQL `LIKE` pattern: `%` matches any run of characters, `_` exactly one.
///
/// Matching is case-sensitive and anchored at both ends.
#[derive(Debug, Clone)]
pub struct LikePattern {
    raw: String,
    regex: Regex,
}

impl LikePattern {
    /// Compile a pattern.
    pub fn new(raw: impl Into<String>) -> QueryResult<Self> {
        let raw = raw.into();
        let mut expr = String::with_capacity(raw.len() + 8);
        expr.push_str("(?s)^");
        let mut buf = [0u8; 4];
        for c in raw.chars() {
            match c {
                '%' => expr.push_str(".*"),
                '_' => expr.push('.'),
                other => expr.push_str(&regex_lite::escape(other.encode_utf8(&mut buf))),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| {
            QueryError::internal(format!("LIKE pattern `{}` did not compile", raw)).with_source(e)
        })?;
        Ok(Self { raw, regex })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `text` matches.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

/// A compiled filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Predicate {
    /// Matches every record.
    #[default]
    True,
    /// Compare a field with an operand.
    Compare {
        /// Field being compared.
        field: FieldRef,
        /// Comparison.
        op: CompareOp,
        /// Right-hand side.
        operand: Operand,
    },
    /// Match a text field against a `LIKE` pattern.
    Like {
        /// Field being matched.
        field: FieldRef,
        /// Pattern.
        pattern: LikePattern,
        /// `NOT LIKE` when set.
        negated: bool,
    },
    /// Null check.
    Null {
        /// Field being checked.
        field: FieldRef,
        /// `IS NOT NULL` when set.
        negated: bool,
    },
    /// Every sub-predicate must hold.
    And(Vec<Predicate>),
}

impl Predicate {
    /// Check if this predicate matches everything.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Create an AND predicate.
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        predicates.into_iter().fold(Self::True, Self::and_then)
    }

    /// Combine with another predicate using AND.
    ///
    /// Nested ANDs are flattened and `True` operands dropped.
    pub fn and_then(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::True, other) => other,
            (this, Self::True) => this,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (this, Self::And(right)) => {
                let mut parts = Vec::with_capacity(right.len() + 1);
                parts.push(this);
                parts.extend(right);
                Self::And(parts)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    /// Evaluate against a record.
    ///
    /// Null fields never satisfy comparisons or `LIKE`, except inequality,
    /// which holds. A null record along the path makes the field null.
    pub fn evaluate(&self, record: &dyn Record) -> bool {
        match self {
            Self::True => true,
            Self::Compare { field, op, operand } => match lookup(record, field.segments()) {
                FieldValue::Scalar(value) => {
                    let ordering = field.project(value).and_then(|lhs| lhs.compare(operand));
                    op.holds(ordering)
                }
                FieldValue::Null | FieldValue::Record(_) => *op == CompareOp::Ne,
            },
            Self::Like {
                field,
                pattern,
                negated,
            } => match lookup(record, field.segments()) {
                FieldValue::Scalar(FilterValue::Text(text)) => pattern.matches(&text) != *negated,
                _ => false,
            },
            Self::Null { field, negated } => {
                let is_null = matches!(lookup(record, field.segments()), FieldValue::Null);
                is_null != *negated
            }
            Self::And(parts) => parts.iter().all(|p| p.evaluate(record)),
        }
    }

    /// Generate SQL for this predicate with parameter placeholders.
    /// Returns (sql, params) where params are the values to bind.
    pub fn to_sql(&self, param_offset: usize) -> (String, Vec<Operand>) {
        let mut params = Vec::new();
        let sql = self.to_sql_with_params(param_offset, &mut params);
        (sql, params)
    }

    fn to_sql_with_params(&self, offset: usize, params: &mut Vec<Operand>) -> String {
        match self {
            Self::True => "TRUE".to_string(),
            Self::Compare { field, op, operand } => {
                params.push(operand.clone());
                format!("{} {} ${}", field.to_sql(), op.as_sql(), offset + params.len())
            }
            Self::Like {
                field,
                pattern,
                negated,
            } => {
                params.push(Operand::Text(pattern.as_str().to_string()));
                let keyword = if *negated { "NOT LIKE" } else { "LIKE" };
                format!("{} {} ${}", field.to_sql(), keyword, offset + params.len())
            }
            Self::Null { field, negated } => {
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                format!("{} {}", field.to_sql(), keyword)
            }
            Self::And(parts) => {
                if parts.is_empty() {
                    return "TRUE".to_string();
                }
                let parts: Vec<_> = parts
                    .iter()
                    .map(|p| p.to_sql_with_params(offset, params))
                    .collect();
                format!("({})", parts.join(" AND "))
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("TRUE"),
            Self::Compare { field, op, operand } => {
                write!(f, "{} {} {}", field.to_sql(), op.as_sql(), operand)
            }
            Self::Like {
                field,
                pattern,
                negated,
            } => {
                let keyword = if *negated { "NOT LIKE" } else { "LIKE" };
                write!(f, "{} {} '{}'", field.to_sql(), keyword, pattern.as_str())
            }
            Self::Null { field, negated } => {
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                write!(f, "{} {}", field.to_sql(), keyword)
            }
            Self::And(parts) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{}", part)?;
                }
                f.write_str(")")
            }
        }
    }
}
