//! Value kinds, declared field types and DateTime granularity.
//!
//! A [`FieldType`] is what the host declares for a record field. Resolving it
//! yields the [`ValueKind`] the filter engine works with:
//!
//! ```rust
//! use tabula_schema::{FieldType, ValueKind};
//!
//! let (kind, nullable) = FieldType::nullable(FieldType::Int32).resolve_kind().unwrap();
//! assert_eq!(kind, ValueKind::Int32);
//! assert!(nullable);
//!
//! assert!(FieldType::Char.resolve_kind().is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::descriptor::RecordSchema;

/// Comparison category of a value kind.
///
/// Operators declare which categories they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindCategory {
    /// Integers, floats, decimals, bytes and enums (compared by ordinal).
    Numeric,
    /// `true` / `false`.
    Boolean,
    /// Strings.
    Text,
    /// Instants.
    DateTime,
}

/// An enum type a column may be declared as.
///
/// Members keep their declaration order; the first one is the default filter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumDef {
    /// Enum type name.
    pub name: String,
    /// Members as `(name, ordinal)` in declaration order.
    pub members: Vec<(String, i64)>,
}

impl EnumDef {
    /// Create an enum whose ordinals follow declaration order, starting at 0.
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            members: members
                .into_iter()
                .enumerate()
                .map(|(i, m)| (m.into(), i as i64))
                .collect(),
        }
    }

    /// Create an enum with explicit ordinals.
    pub fn with_ordinals(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (impl Into<String>, i64)>,
    ) -> Self {
        Self {
            name: name.into(),
            members: members.into_iter().map(|(m, o)| (m.into(), o)).collect(),
        }
    }

    /// Name of the first declared member.
    pub fn first_member(&self) -> Option<&str> {
        self.members.first().map(|(name, _)| name.as_str())
    }

    /// Ordinal of a member, looked up by name.
    pub fn ordinal_of(&self, member: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(name, _)| name == member)
            .map(|(_, ordinal)| *ordinal)
    }

    /// Member name for an ordinal.
    pub fn name_of(&self, ordinal: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, o)| *o == ordinal)
            .map(|(name, _)| name.as_str())
    }

    /// Whether the enum declares no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The comparable kind of a filterable column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// Double precision float.
    Float,
    /// Fixed-point decimal.
    Decimal,
    /// Boolean.
    Boolean,
    /// String.
    Text,
    /// UTC instant.
    DateTime,
    /// Enum compared by ordinal.
    Enum(Arc<EnumDef>),
    /// Unsigned byte.
    Byte,
}

impl ValueKind {
    /// The comparison category of this kind.
    pub fn category(&self) -> KindCategory {
        match self {
            Self::Int16
            | Self::Int32
            | Self::Int64
            | Self::UInt16
            | Self::UInt32
            | Self::UInt64
            | Self::Float
            | Self::Decimal
            | Self::Enum(_)
            | Self::Byte => KindCategory::Numeric,
            Self::Boolean => KindCategory::Boolean,
            Self::Text => KindCategory::Text,
            Self::DateTime => KindCategory::DateTime,
        }
    }

    /// Whether this kind is numeric (enums included).
    pub fn is_numeric(&self) -> bool {
        self.category() == KindCategory::Numeric
    }

    /// Short name used in error messages.
    pub fn name(&self) -> &str {
        match self {
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::Text => "Text",
            Self::DateTime => "DateTime",
            Self::Enum(def) => &def.name,
            Self::Byte => "Byte",
        }
    }

    /// The enum definition, for enum kinds.
    pub fn enum_def(&self) -> Option<&Arc<EnumDef>> {
        match self {
            Self::Enum(def) => Some(def),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a declared type cannot be filtered on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedType {
    /// The declared type name.
    pub type_name: String,
    /// Human readable reason.
    pub reason: &'static str,
}

/// A field type as declared by the host record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// Double precision float.
    Float,
    /// Fixed-point decimal.
    Decimal,
    /// Boolean.
    Boolean,
    /// String.
    Text,
    /// UTC instant.
    DateTime,
    /// Enum.
    Enum(Arc<EnumDef>),
    /// Unsigned byte.
    Byte,
    /// Single precision float (unsupported).
    Single,
    /// Single character (unsupported).
    Char,
    /// Signed byte (unsupported).
    SByte,
    /// Opaque object (unsupported).
    Object,
    /// Database null placeholder (unsupported).
    DbNull,
    /// No type at all (unsupported).
    Empty,
    /// Nested record; traversable but not filterable.
    Record(Arc<RecordSchema>),
    /// Optional wrapper around another type.
    Nullable(Box<FieldType>),
}

impl FieldType {
    /// Wrap a type as nullable.
    pub fn nullable(inner: FieldType) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Strip a nullable wrapper, reporting whether one was present.
    pub fn unwrap_nullable(&self) -> (&FieldType, bool) {
        match self {
            Self::Nullable(inner) => (inner.unwrap_nullable().0, true),
            other => (other, false),
        }
    }

    /// Whether the declared type admits null.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// The nested record descriptor, if this is a record field.
    pub fn as_record(&self) -> Option<&Arc<RecordSchema>> {
        match self.unwrap_nullable().0 {
            Self::Record(schema) => Some(schema),
            _ => None,
        }
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Self::Int16 => "Int16".into(),
            Self::Int32 => "Int32".into(),
            Self::Int64 => "Int64".into(),
            Self::UInt16 => "UInt16".into(),
            Self::UInt32 => "UInt32".into(),
            Self::UInt64 => "UInt64".into(),
            Self::Float => "Float".into(),
            Self::Decimal => "Decimal".into(),
            Self::Boolean => "Boolean".into(),
            Self::Text => "Text".into(),
            Self::DateTime => "DateTime".into(),
            Self::Enum(def) => def.name.clone(),
            Self::Byte => "Byte".into(),
            Self::Single => "Single".into(),
            Self::Char => "Char".into(),
            Self::SByte => "SByte".into(),
            Self::Object => "Object".into(),
            Self::DbNull => "DBNull".into(),
            Self::Empty => "Empty".into(),
            Self::Record(schema) => schema.name().to_string(),
            Self::Nullable(inner) => format!("{}?", inner.type_name()),
        }
    }

    /// Resolve into a filterable kind, returning `(kind, nullable)`.
    pub fn resolve_kind(&self) -> Result<(ValueKind, bool), UnsupportedType> {
        let (ty, nullable) = self.unwrap_nullable();
        let unsupported = |reason| UnsupportedType {
            type_name: ty.type_name(),
            reason,
        };

        let kind = match ty {
            Self::Int16 => ValueKind::Int16,
            Self::Int32 => ValueKind::Int32,
            Self::Int64 => ValueKind::Int64,
            Self::UInt16 => ValueKind::UInt16,
            Self::UInt32 => ValueKind::UInt32,
            Self::UInt64 => ValueKind::UInt64,
            Self::Float => ValueKind::Float,
            Self::Decimal => ValueKind::Decimal,
            Self::Boolean => ValueKind::Boolean,
            Self::Text => ValueKind::Text,
            Self::DateTime => ValueKind::DateTime,
            Self::Byte => ValueKind::Byte,
            Self::Enum(def) if def.is_empty() => {
                return Err(unsupported("enum declares no members"));
            }
            Self::Enum(def) => ValueKind::Enum(Arc::clone(def)),
            Self::Single => return Err(unsupported("single precision floats are not filterable")),
            Self::Char => return Err(unsupported("characters are not filterable")),
            Self::SByte => return Err(unsupported("signed bytes are not filterable")),
            Self::Object => return Err(unsupported("opaque objects are not filterable")),
            Self::DbNull | Self::Empty => {
                return Err(unsupported("placeholder types carry no filterable value"));
            }
            Self::Record(_) => return Err(unsupported("nested records must be traversed, not filtered")),
            Self::Nullable(inner) => return inner.resolve_kind().map(|(kind, _)| (kind, true)),
        };

        Ok((kind, nullable))
    }
}

impl From<ValueKind> for FieldType {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int16 => Self::Int16,
            ValueKind::Int32 => Self::Int32,
            ValueKind::Int64 => Self::Int64,
            ValueKind::UInt16 => Self::UInt16,
            ValueKind::UInt32 => Self::UInt32,
            ValueKind::UInt64 => Self::UInt64,
            ValueKind::Float => Self::Float,
            ValueKind::Decimal => Self::Decimal,
            ValueKind::Boolean => Self::Boolean,
            ValueKind::Text => Self::Text,
            ValueKind::DateTime => Self::DateTime,
            ValueKind::Enum(def) => Self::Enum(def),
            ValueKind::Byte => Self::Byte,
        }
    }
}

/// Precision at which DateTime columns are displayed and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateTimeFormat {
    /// Calendar date only.
    Date = 1,
    /// Date, hour and minute.
    DateHourMinute = 2,
    /// Date, hour, minute and second.
    DateHourMinuteSecond = 3,
}

impl DateTimeFormat {
    /// Every granularity in id order.
    pub const ALL: [Self; 3] = [Self::Date, Self::DateHourMinute, Self::DateHourMinuteSecond];

    /// Stable numeric id.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::DateHourMinute => "DateHourMinute",
            Self::DateHourMinuteSecond => "DateHourMinuteSecond",
        }
    }

    /// Display pattern, in the notation grid front-ends use.
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Date => "yyyy-MM-dd",
            Self::DateHourMinute => "yyyy-MM-ddTHH:mm",
            Self::DateHourMinuteSecond => "yyyy-MM-ddTHH:mm:ss",
        }
    }

    /// Equivalent `strftime` format string.
    pub const fn strftime(self) -> &'static str {
        match self {
            Self::Date => "%Y-%m-%d",
            Self::DateHourMinute => "%Y-%m-%dT%H:%M",
            Self::DateHourMinuteSecond => "%Y-%m-%dT%H:%M:%S",
        }
    }

    /// Look up a granularity by id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.id() == id)
    }

    /// Look up a granularity by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl Default for DateTimeFormat {
    fn default() -> Self {
        Self::DateHourMinuteSecond
    }
}

impl fmt::Display for DateTimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
