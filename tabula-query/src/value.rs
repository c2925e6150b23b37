//! Filter values and their conversion into a column's kind.
//!
//! A [`FilterValue`] carries exactly one variant per [`ValueKind`]. Rules seed
//! it with [`FilterValue::default_for`] and, at compile time, coerce whatever
//! the caller stored into the column's kind with checked conversions:
//!
//! ```rust
//! use tabula_query::FilterValue;
//! use tabula_schema::ValueKind;
//!
//! assert_eq!(
//!     FilterValue::Int32(7).coerce_to(&ValueKind::Int64).unwrap(),
//!     FilterValue::Int64(7)
//! );
//! assert!(FilterValue::Int64(300).coerce_to(&ValueKind::Byte).is_err());
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use tabula_schema::{DateTimeFormat, ValueKind};

/// A typed value a filter rule compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum FilterValue {
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// Double precision float.
    Float(f64),
    /// Fixed-point decimal.
    Decimal(Decimal),
    /// Boolean.
    Bool(bool),
    /// String.
    Text(String),
    /// UTC instant.
    DateTime(DateTime<Utc>),
    /// Enum member, by name.
    Enum(String),
    /// Unsigned byte.
    Byte(u8),
}

/// Why a value could not be converted into a column's kind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// The value's variant cannot represent the kind at all.
    #[error("expected a {expected} value, got {found}")]
    Mismatch {
        /// Expected kind name.
        expected: String,
        /// Variant name of the value.
        found: &'static str,
    },

    /// A numeric conversion would lose information.
    #[error("{value} does not fit into {kind}")]
    OutOfRange {
        /// Rendered value.
        value: String,
        /// Target kind name.
        kind: String,
    },

    /// The enum has no member with that name or ordinal.
    #[error("`{member}` is not a member of enum {enum_name}")]
    UnknownMember {
        /// Requested member.
        member: String,
        /// Enum type name.
        enum_name: String,
    },

    /// Text could not be parsed into the kind.
    #[error("cannot parse `{text}` as {kind}")]
    Parse {
        /// Input text.
        text: String,
        /// Target kind name.
        kind: String,
    },
}

impl FilterValue {
    /// The default filter value for a kind.
    ///
    /// Zero of the proper width for numbers, `false`, the empty string, the
    /// current UTC instant, or the first declared enum member. Returns `None`
    /// only for an enum without members.
    pub fn default_for(kind: &ValueKind) -> Option<Self> {
        let value = match kind {
            ValueKind::Int16 => Self::Int16(0),
            ValueKind::Int32 => Self::Int32(0),
            ValueKind::Int64 => Self::Int64(0),
            ValueKind::UInt16 => Self::UInt16(0),
            ValueKind::UInt32 => Self::UInt32(0),
            ValueKind::UInt64 => Self::UInt64(0),
            ValueKind::Float => Self::Float(0.0),
            ValueKind::Decimal => Self::Decimal(Decimal::ZERO),
            ValueKind::Boolean => Self::Bool(false),
            ValueKind::Text => Self::Text(String::new()),
            ValueKind::DateTime => Self::DateTime(Utc::now()),
            ValueKind::Enum(def) => Self::Enum(def.first_member()?.to_string()),
            ValueKind::Byte => Self::Byte(0),
        };
        Some(value)
    }

    /// Variant name.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Int16(_) => "Int16",
            Self::Int32(_) => "Int32",
            Self::Int64(_) => "Int64",
            Self::UInt16(_) => "UInt16",
            Self::UInt32(_) => "UInt32",
            Self::UInt64(_) => "UInt64",
            Self::Float(_) => "Float",
            Self::Decimal(_) => "Decimal",
            Self::Bool(_) => "Bool",
            Self::Text(_) => "Text",
            Self::DateTime(_) => "DateTime",
            Self::Enum(_) => "Enum",
            Self::Byte(_) => "Byte",
        }
    }

    /// Whether the value already has the representation of `kind`.
    ///
    /// Enum values must also name a declared member.
    pub fn matches_kind(&self, kind: &ValueKind) -> bool {
        match (self, kind) {
            (Self::Int16(_), ValueKind::Int16)
            | (Self::Int32(_), ValueKind::Int32)
            | (Self::Int64(_), ValueKind::Int64)
            | (Self::UInt16(_), ValueKind::UInt16)
            | (Self::UInt32(_), ValueKind::UInt32)
            | (Self::UInt64(_), ValueKind::UInt64)
            | (Self::Float(_), ValueKind::Float)
            | (Self::Decimal(_), ValueKind::Decimal)
            | (Self::Bool(_), ValueKind::Boolean)
            | (Self::Text(_), ValueKind::Text)
            | (Self::DateTime(_), ValueKind::DateTime)
            | (Self::Byte(_), ValueKind::Byte) => true,
            (Self::Enum(member), ValueKind::Enum(def)) => def.ordinal_of(member).is_some(),
            _ => false,
        }
    }

    /// Integer payload, widened.
    pub(crate) fn as_integer(&self) -> Option<i128> {
        match *self {
            Self::Int16(v) => Some(v.into()),
            Self::Int32(v) => Some(v.into()),
            Self::Int64(v) => Some(v.into()),
            Self::UInt16(v) => Some(v.into()),
            Self::UInt32(v) => Some(v.into()),
            Self::UInt64(v) => Some(v.into()),
            Self::Byte(v) => Some(v.into()),
            _ => None,
        }
    }

    /// Convert into the representation of `kind`.
    ///
    /// Integer widths, bytes, floats and decimals convert into each other when
    /// no information is lost. Enums accept a member name (as text or enum
    /// value) or an integer ordinal. Every other kind must match exactly.
    pub fn coerce_to(&self, kind: &ValueKind) -> Result<Self, ValueError> {
        if self.matches_kind(kind) {
            return Ok(self.clone());
        }

        let out_of_range = || ValueError::OutOfRange {
            value: self.to_string(),
            kind: kind.name().to_string(),
        };
        let mismatch = || ValueError::Mismatch {
            expected: kind.name().to_string(),
            found: self.variant_name(),
        };

        match kind {
            ValueKind::Int16 => self.exact_integer()?.ok_or_else(mismatch)
                .and_then(|v| i16::try_from(v).map(Self::Int16).map_err(|_| out_of_range())),
            ValueKind::Int32 => self.exact_integer()?.ok_or_else(mismatch)
                .and_then(|v| i32::try_from(v).map(Self::Int32).map_err(|_| out_of_range())),
            ValueKind::Int64 => self.exact_integer()?.ok_or_else(mismatch)
                .and_then(|v| i64::try_from(v).map(Self::Int64).map_err(|_| out_of_range())),
            ValueKind::UInt16 => self.exact_integer()?.ok_or_else(mismatch)
                .and_then(|v| u16::try_from(v).map(Self::UInt16).map_err(|_| out_of_range())),
            ValueKind::UInt32 => self.exact_integer()?.ok_or_else(mismatch)
                .and_then(|v| u32::try_from(v).map(Self::UInt32).map_err(|_| out_of_range())),
            ValueKind::UInt64 => self.exact_integer()?.ok_or_else(mismatch)
                .and_then(|v| u64::try_from(v).map(Self::UInt64).map_err(|_| out_of_range())),
            ValueKind::Byte => self.exact_integer()?.ok_or_else(mismatch)
                .and_then(|v| u8::try_from(v).map(Self::Byte).map_err(|_| out_of_range())),
            ValueKind::Float => match self {
                Self::Decimal(d) => d.to_f64().map(Self::Float).ok_or_else(out_of_range),
                other => other
                    .as_integer()
                    .map(|v| Self::Float(v as f64))
                    .ok_or_else(mismatch),
            },
            ValueKind::Decimal => match self {
                Self::Float(f) => Decimal::from_f64(*f).map(Self::Decimal).ok_or_else(out_of_range),
                other => other
                    .as_integer()
                    .ok_or_else(mismatch)
                    .and_then(|v| Decimal::from_i128(v).map(Self::Decimal).ok_or_else(out_of_range)),
            },
            ValueKind::Enum(def) => {
                let unknown = |member: String| ValueError::UnknownMember {
                    member,
                    enum_name: def.name.clone(),
                };
                match self {
                    Self::Enum(name) | Self::Text(name) => def
                        .ordinal_of(name)
                        .map(|_| Self::Enum(name.clone()))
                        .ok_or_else(|| unknown(name.clone())),
                    other => {
                        let ordinal = other.as_integer().ok_or_else(mismatch)?;
                        i64::try_from(ordinal)
                            .ok()
                            .and_then(|o| def.name_of(o))
                            .map(|name| Self::Enum(name.to_string()))
                            .ok_or_else(|| unknown(ordinal.to_string()))
                    }
                }
            }
            ValueKind::Boolean | ValueKind::Text | ValueKind::DateTime => Err(mismatch()),
        }
    }

    /// Integer payload of integral numbers, including whole floats and decimals.
    ///
    /// `Ok(None)` for non-numeric values; an error for fractional ones.
    fn exact_integer(&self) -> Result<Option<i128>, ValueError> {
        let fractional = || ValueError::OutOfRange {
            value: self.to_string(),
            kind: "an integer".to_string(),
        };
        match self {
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(*f as i128)),
            Self::Float(_) => Err(fractional()),
            Self::Decimal(d) if d.fract().is_zero() => d.to_i128().map(Some).ok_or_else(fractional),
            Self::Decimal(_) => Err(fractional()),
            other => Ok(other.as_integer()),
        }
    }

    /// Parse widget text into a value of `kind`.
    ///
    /// DateTime text may be RFC 3339 or follow any granularity pattern
    /// (`format` is tried first); it is interpreted as UTC.
    pub fn parse(kind: &ValueKind, text: &str, format: DateTimeFormat) -> Result<Self, ValueError> {
        let err = || ValueError::Parse {
            text: text.to_string(),
            kind: kind.name().to_string(),
        };
        let trimmed = text.trim();

        match kind {
            ValueKind::Int16 => trimmed.parse().map(Self::Int16).map_err(|_| err()),
            ValueKind::Int32 => trimmed.parse().map(Self::Int32).map_err(|_| err()),
            ValueKind::Int64 => trimmed.parse().map(Self::Int64).map_err(|_| err()),
            ValueKind::UInt16 => trimmed.parse().map(Self::UInt16).map_err(|_| err()),
            ValueKind::UInt32 => trimmed.parse().map(Self::UInt32).map_err(|_| err()),
            ValueKind::UInt64 => trimmed.parse().map(Self::UInt64).map_err(|_| err()),
            ValueKind::Byte => trimmed.parse().map(Self::Byte).map_err(|_| err()),
            ValueKind::Float => trimmed.parse().map(Self::Float).map_err(|_| err()),
            ValueKind::Decimal => trimmed.parse().map(Self::Decimal).map_err(|_| err()),
            ValueKind::Boolean => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(Self::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(Self::Bool(false))
                } else {
                    Err(err())
                }
            }
            ValueKind::Text => Ok(Self::Text(text.to_string())),
            ValueKind::Enum(_) => match trimmed.parse::<i64>() {
                Ok(ordinal) => Self::Int64(ordinal).coerce_to(kind),
                Err(_) => Self::Enum(trimmed.to_string()).coerce_to(kind),
            },
            ValueKind::DateTime => parse_date_time(trimmed, format)
                .map(Self::DateTime)
                .ok_or_else(err),
        }
    }
}

/// Parse an instant, trying RFC 3339 first, then `preferred`, then the other
/// granularity patterns.
pub(crate) fn parse_date_time(text: &str, preferred: DateTimeFormat) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    std::iter::once(preferred)
        .chain(DateTimeFormat::ALL.into_iter().filter(|f| *f != preferred))
        .find_map(|format| match format {
            DateTimeFormat::Date => NaiveDate::parse_from_str(text, format.strftime())
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0)),
            _ => NaiveDateTime::parse_from_str(text, format.strftime()).ok(),
        })
        .map(|naive| naive.and_utc())
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Text(v) | Self::Enum(v) => f.write_str(v),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Byte(v) => write!(f, "{}", v),
        }
    }
}

impl From<i16> for FilterValue {
    fn from(v: i16) -> Self {
        Self::Int16(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u16> for FilterValue {
    fn from(v: u16) -> Self {
        Self::UInt16(v)
    }
}

impl From<u32> for FilterValue {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<u64> for FilterValue {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<u8> for FilterValue {
    fn from(v: u8) -> Self {
        Self::Byte(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Decimal> for FilterValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

/// Input-widget helpers for [`ValueKind`].
pub trait ValueKindExt {
    /// Smallest and largest representable value, for numeric and DateTime
    /// kinds. Enums, booleans and text have no range.
    fn bounds(&self) -> Option<(FilterValue, FilterValue)>;
}

impl ValueKindExt for ValueKind {
    fn bounds(&self) -> Option<(FilterValue, FilterValue)> {
        use FilterValue as V;
        let pair = match self {
            ValueKind::Int16 => (V::Int16(i16::MIN), V::Int16(i16::MAX)),
            ValueKind::Int32 => (V::Int32(i32::MIN), V::Int32(i32::MAX)),
            ValueKind::Int64 => (V::Int64(i64::MIN), V::Int64(i64::MAX)),
            ValueKind::UInt16 => (V::UInt16(0), V::UInt16(u16::MAX)),
            ValueKind::UInt32 => (V::UInt32(0), V::UInt32(u32::MAX)),
            ValueKind::UInt64 => (V::UInt64(0), V::UInt64(u64::MAX)),
            ValueKind::Byte => (V::Byte(0), V::Byte(u8::MAX)),
            ValueKind::Float => (V::Float(f64::MIN), V::Float(f64::MAX)),
            ValueKind::Decimal => (V::Decimal(Decimal::MIN), V::Decimal(Decimal::MAX)),
            ValueKind::DateTime => (
                V::DateTime(DateTime::<Utc>::MIN_UTC),
                V::DateTime(DateTime::<Utc>::MAX_UTC),
            ),
            ValueKind::Boolean | ValueKind::Text | ValueKind::Enum(_) => return None,
        };
        Some(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tabula_schema::EnumDef;

    fn status() -> ValueKind {
        ValueKind::Enum(Arc::new(EnumDef::new("Status", ["Draft", "Sent", "Paid"])))
    }

    #[test]
    fn test_defaults_per_kind() {
        assert_eq!(FilterValue::default_for(&ValueKind::Int16), Some(FilterValue::Int16(0)));
        assert_eq!(FilterValue::default_for(&ValueKind::UInt64), Some(FilterValue::UInt64(0)));
        assert_eq!(
            FilterValue::default_for(&ValueKind::Decimal),
            Some(FilterValue::Decimal(Decimal::ZERO))
        );
        assert_eq!(FilterValue::default_for(&ValueKind::Boolean), Some(FilterValue::Bool(false)));
        assert_eq!(
            FilterValue::default_for(&ValueKind::Text),
            Some(FilterValue::Text(String::new()))
        );
        assert_eq!(
            FilterValue::default_for(&status()),
            Some(FilterValue::Enum("Draft".to_string()))
        );
    }

    #[test]
    fn test_default_date_time_is_now() {
        let before = Utc::now();
        let Some(FilterValue::DateTime(value)) = FilterValue::default_for(&ValueKind::DateTime) else {
            panic!("expected a DateTime default");
        };
        assert!(value >= before && value <= Utc::now());
    }

    #[test]
    fn test_empty_enum_has_no_default() {
        let kind = ValueKind::Enum(Arc::new(EnumDef::new("Nothing", Vec::<String>::new())));
        assert_eq!(FilterValue::default_for(&kind), None);
    }

    #[test]
    fn test_checked_integer_conversion() {
        assert_eq!(
            FilterValue::Int32(7).coerce_to(&ValueKind::Int64).unwrap(),
            FilterValue::Int64(7)
        );
        assert_eq!(
            FilterValue::Int64(200).coerce_to(&ValueKind::Byte).unwrap(),
            FilterValue::Byte(200)
        );
        assert!(matches!(
            FilterValue::Int64(300).coerce_to(&ValueKind::Byte),
            Err(ValueError::OutOfRange { .. })
        ));
        assert!(FilterValue::Int32(-1).coerce_to(&ValueKind::UInt32).is_err());
    }

    #[test]
    fn test_float_and_decimal_conversion() {
        assert_eq!(
            FilterValue::Float(4.0).coerce_to(&ValueKind::Int32).unwrap(),
            FilterValue::Int32(4)
        );
        assert!(FilterValue::Float(4.5).coerce_to(&ValueKind::Int32).is_err());
        assert_eq!(
            FilterValue::Int32(12).coerce_to(&ValueKind::Decimal).unwrap(),
            FilterValue::Decimal(Decimal::new(12, 0))
        );
        assert_eq!(
            FilterValue::Decimal(Decimal::new(25, 1)).coerce_to(&ValueKind::Float).unwrap(),
            FilterValue::Float(2.5)
        );
    }

    #[test]
    fn test_enum_coercion() {
        let kind = status();
        assert_eq!(
            FilterValue::Text("Sent".into()).coerce_to(&kind).unwrap(),
            FilterValue::Enum("Sent".into())
        );
        assert_eq!(
            FilterValue::Int32(2).coerce_to(&kind).unwrap(),
            FilterValue::Enum("Paid".into())
        );
        assert!(matches!(
            FilterValue::Enum("Void".into()).coerce_to(&kind),
            Err(ValueError::UnknownMember { .. })
        ));
        assert!(!FilterValue::Enum("Void".into()).matches_kind(&kind));
    }

    #[test]
    fn test_mismatched_kinds_fail() {
        assert!(matches!(
            FilterValue::Text("5".into()).coerce_to(&ValueKind::Int32),
            Err(ValueError::Mismatch { .. })
        ));
        assert!(FilterValue::Int32(1).coerce_to(&ValueKind::Boolean).is_err());
        assert!(FilterValue::Bool(true).coerce_to(&ValueKind::Text).is_err());
    }

    #[test]
    fn test_parse_text() {
        let fmt = DateTimeFormat::default();
        assert_eq!(
            FilterValue::parse(&ValueKind::Int32, " 42 ", fmt).unwrap(),
            FilterValue::Int32(42)
        );
        assert_eq!(
            FilterValue::parse(&ValueKind::Boolean, "TRUE", fmt).unwrap(),
            FilterValue::Bool(true)
        );
        assert_eq!(
            FilterValue::parse(&status(), "1", fmt).unwrap(),
            FilterValue::Enum("Sent".into())
        );
        assert!(FilterValue::parse(&ValueKind::Byte, "256", fmt).is_err());
        assert!(FilterValue::parse(&ValueKind::Boolean, "yes", fmt).is_err());
    }

    #[test]
    fn test_parse_date_time_patterns() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(
            FilterValue::parse(&ValueKind::DateTime, "2024-03-09T14:05", DateTimeFormat::DateHourMinute)
                .unwrap(),
            FilterValue::DateTime(expected)
        );
        assert_eq!(
            FilterValue::parse(&ValueKind::DateTime, "2024-03-09T14:05:00Z", DateTimeFormat::Date)
                .unwrap(),
            FilterValue::DateTime(expected)
        );
        assert_eq!(
            FilterValue::parse(&ValueKind::DateTime, "2024-03-09", DateTimeFormat::Date).unwrap(),
            FilterValue::DateTime(Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(FilterValue::Bool(true).to_string(), "True");
        assert_eq!(FilterValue::Bool(false).to_string(), "False");
        assert_eq!(FilterValue::Decimal(Decimal::new(1050, 2)).to_string(), "10.50");
        assert_eq!(FilterValue::Enum("Paid".into()).to_string(), "Paid");
    }

    #[test]
    fn test_bounds() {
        assert_eq!(
            ValueKind::Byte.bounds(),
            Some((FilterValue::Byte(0), FilterValue::Byte(255)))
        );
        assert_eq!(
            ValueKind::Int16.bounds(),
            Some((FilterValue::Int16(-32768), FilterValue::Int16(32767)))
        );
        assert!(ValueKind::DateTime.bounds().is_some());
        assert_eq!(ValueKind::Text.bounds(), None);
        assert_eq!(status().bounds(), None);
    }
}
