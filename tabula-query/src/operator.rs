//! The operator catalog.
//!
//! Operators form a closed set with stable ids. Each carries a capability
//! row saying whether it needs a value and which kind categories it accepts:
//!
//! ```rust
//! use tabula_query::Operator;
//! use tabula_schema::ValueKind;
//!
//! assert!(!Operator::GreaterThan.allows_type(&ValueKind::Boolean));
//! assert!(Operator::Equals.allows_type(&ValueKind::Boolean));
//! assert!(!Operator::Contains.allows_type(&ValueKind::Int32));
//! assert_eq!(Operator::from_id(8), Some(Operator::NotContains));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tabula_schema::{KindCategory, ValueKind};

use crate::error::{QueryError, QueryResult};
use crate::predicate::{CompareOp, FieldRef, LikePattern, Operand, Predicate};

/// A filter operator.
///
/// Serializes as its numeric id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Operator {
    /// `field == value`
    Equals = 1,
    /// `field != value`
    NotEquals = 2,
    /// `field > value`
    GreaterThan = 3,
    /// `field >= value`
    GreaterThanOrEquals = 4,
    /// `field < value`
    LessThan = 5,
    /// `field <= value`
    LessThanOrEquals = 6,
    /// `field LIKE %value%`
    Contains = 7,
    /// `field NOT LIKE %value%`
    NotContains = 8,
    /// `field LIKE value%`
    StartsWith = 9,
    /// `field LIKE %value`
    EndsWith = 10,
    /// `field IS NULL`
    IsNull = 11,
    /// `field IS NOT NULL`
    IsNotNull = 12,
}

/// Capability row of one operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Capabilities {
    value_required: bool,
    number: bool,
    boolean: bool,
    text: bool,
    date_time: bool,
    non_nullable: bool,
}

const fn caps(value_required: bool, number: bool, boolean: bool, text: bool, date_time: bool) -> Capabilities {
    Capabilities {
        value_required,
        number,
        boolean,
        text,
        date_time,
        non_nullable: true,
    }
}

impl Operator {
    const ALL: [Self; 12] = [
        Self::Equals,
        Self::NotEquals,
        Self::GreaterThan,
        Self::GreaterThanOrEquals,
        Self::LessThan,
        Self::LessThanOrEquals,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::IsNull,
        Self::IsNotNull,
    ];

    /// Every operator in id order.
    pub fn all() -> &'static [Self] {
        &Self::ALL
    }

    const fn capabilities(self) -> Capabilities {
        match self {
            Self::Equals | Self::NotEquals => caps(true, true, true, true, true),
            Self::GreaterThan | Self::LessThan => caps(true, true, false, true, true),
            Self::GreaterThanOrEquals | Self::LessThanOrEquals => caps(true, true, true, true, true),
            Self::Contains | Self::NotContains | Self::StartsWith | Self::EndsWith => {
                caps(true, false, false, true, false)
            }
            Self::IsNull | Self::IsNotNull => caps(false, true, true, true, true),
        }
    }

    /// Stable numeric id.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::NotEquals => "NotEquals",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanOrEquals => "GreaterThanOrEquals",
            Self::LessThan => "LessThan",
            Self::LessThanOrEquals => "LessThanOrEquals",
            Self::Contains => "Contains",
            Self::NotContains => "NotContains",
            Self::StartsWith => "StartsWith",
            Self::EndsWith => "EndsWith",
            Self::IsNull => "IsNull",
            Self::IsNotNull => "IsNotNull",
        }
    }

    /// Look up an operator by id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.id() == id)
    }

    /// Look up an operator by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Whether the operator compares against a value.
    pub const fn value_required(self) -> bool {
        self.capabilities().value_required
    }

    /// Whether the operator may be used on non-nullable columns.
    pub const fn allows_non_nullable(self) -> bool {
        self.capabilities().non_nullable
    }

    /// Whether the operator accepts the kind's category.
    pub fn allows_type(self, kind: &ValueKind) -> bool {
        let caps = self.capabilities();
        match kind.category() {
            KindCategory::Numeric => caps.number,
            KindCategory::Boolean => caps.boolean,
            KindCategory::Text => caps.text,
            KindCategory::DateTime => caps.date_time,
        }
    }

    /// Whether the operator can be used on a column of this kind and nullability.
    pub fn allows_column(self, kind: &ValueKind, nullable: bool) -> bool {
        self.allows_type(kind) && (nullable || self.allows_non_nullable())
    }

    /// The operators a column of this kind offers, in id order.
    pub fn operators_for(kind: &ValueKind, nullable: bool) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|op| op.allows_column(kind, nullable))
            .collect()
    }

    /// Build the predicate for one field and operand.
    ///
    /// Text operators need a text operand; other value operators need any
    /// operand; null checks ignore it.
    pub fn compile(self, field: FieldRef, operand: Option<Operand>) -> QueryResult<Predicate> {
        let compare = |op| -> QueryResult<Predicate> {
            let operand = operand.clone().ok_or_else(|| self.missing_value(&field))?;
            Ok(Predicate::Compare {
                field: field.clone(),
                op,
                operand,
            })
        };
        let like = |pattern: fn(&str) -> String, negated| -> QueryResult<Predicate> {
            match &operand {
                Some(Operand::Text(text)) => Ok(Predicate::Like {
                    field: field.clone(),
                    pattern: LikePattern::new(pattern(text))?,
                    negated,
                }),
                Some(other) => Err(QueryError::invalid_value(
                    field.path(),
                    format!("{} needs a text value, got {}", self, other),
                )),
                None => Err(self.missing_value(&field)),
            }
        };

        match self {
            Self::Equals => compare(CompareOp::Eq),
            Self::NotEquals => compare(CompareOp::Ne),
            Self::GreaterThan => compare(CompareOp::Gt),
            Self::GreaterThanOrEquals => compare(CompareOp::Ge),
            Self::LessThan => compare(CompareOp::Lt),
            Self::LessThanOrEquals => compare(CompareOp::Le),
            Self::Contains => like(|v| format!("%{}%", v), false),
            Self::NotContains => like(|v| format!("%{}%", v), true),
            Self::StartsWith => like(|v| format!("{}%", v), false),
            Self::EndsWith => like(|v| format!("%{}", v), false),
            Self::IsNull => Ok(Predicate::Null {
                field,
                negated: false,
            }),
            Self::IsNotNull => Ok(Predicate::Null {
                field,
                negated: true,
            }),
        }
    }

    fn missing_value(self, field: &FieldRef) -> QueryError {
        QueryError::invalid_value(field.path(), format!("{} requires a value", self))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Operator> for u8 {
    fn from(op: Operator) -> Self {
        op.id()
    }
}

impl TryFrom<u8> for Operator {
    type Error = QueryError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| {
            QueryError::invalid_kind(format!("unknown operator id {}", id))
                .with_suggestion("Operator ids run from 1 (Equals) to 12 (IsNotNull)")
        })
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            QueryError::invalid_kind(format!("unknown operator `{}`", s))
                .with_suggestion("Use a display name such as `Equals` or `StartsWith`")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tabula_schema::EnumDef;

    #[test]
    fn test_ids_are_stable_and_ordered() {
        let ids: Vec<u8> = Operator::all().iter().map(|op| op.id()).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<u8>>());
        assert!(Operator::Equals < Operator::IsNotNull);
        assert_eq!(Operator::from_id(0), None);
        assert_eq!(Operator::from_id(13), None);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!("GreaterThanOrEquals".parse::<Operator>().unwrap(), Operator::GreaterThanOrEquals);
        assert!("Like".parse::<Operator>().is_err());
        assert_eq!(Operator::NotContains.to_string(), "NotContains");
    }

    #[test]
    fn test_capability_table() {
        let status = ValueKind::Enum(Arc::new(EnumDef::new("Status", ["A"])));
        assert!(!Operator::GreaterThan.allows_type(&ValueKind::Boolean));
        assert!(!Operator::LessThan.allows_type(&ValueKind::Boolean));
        assert!(Operator::GreaterThanOrEquals.allows_type(&ValueKind::Boolean));
        assert!(Operator::Equals.allows_type(&ValueKind::Boolean));
        assert!(!Operator::Contains.allows_type(&ValueKind::Decimal));
        assert!(!Operator::StartsWith.allows_type(&ValueKind::DateTime));
        assert!(Operator::EndsWith.allows_type(&ValueKind::Text));
        assert!(Operator::LessThan.allows_type(&status));
        assert!(!Operator::IsNull.value_required());
        assert!(Operator::Contains.value_required());
    }

    #[test]
    fn test_operators_for_kind() {
        assert_eq!(
            Operator::operators_for(&ValueKind::Boolean, false),
            vec![
                Operator::Equals,
                Operator::NotEquals,
                Operator::GreaterThanOrEquals,
                Operator::LessThanOrEquals,
                Operator::IsNull,
                Operator::IsNotNull,
            ]
        );
        assert_eq!(Operator::operators_for(&ValueKind::Text, true).len(), 12);
    }

    #[test]
    fn test_serializes_as_id() {
        assert_eq!(serde_json::to_string(&Operator::StartsWith).unwrap(), "9");
        let op: Operator = serde_json::from_str("11").unwrap();
        assert_eq!(op, Operator::IsNull);
        assert!(serde_json::from_str::<Operator>("42").is_err());
    }

    #[test]
    fn test_compile_like_patterns() {
        let text = Some(Operand::Text("ab".into()));
        let pattern_of = |op: Operator| match op.compile(FieldRef::new("name"), text.clone()).unwrap() {
            Predicate::Like { pattern, negated, .. } => (pattern.as_str().to_string(), negated),
            other => panic!("expected LIKE, got {:?}", other),
        };

        assert_eq!(pattern_of(Operator::Contains), ("%ab%".to_string(), false));
        assert_eq!(pattern_of(Operator::NotContains), ("%ab%".to_string(), true));
        assert_eq!(pattern_of(Operator::StartsWith), ("ab%".to_string(), false));
        assert_eq!(pattern_of(Operator::EndsWith), ("%ab".to_string(), false));
    }

    #[test]
    fn test_compile_requires_value() {
        let err = Operator::Equals.compile(FieldRef::new("id"), None).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidValue);

        let err = Operator::Contains
            .compile(FieldRef::new("id"), Some(Operand::Int(1)))
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidValue);

        assert_eq!(
            Operator::IsNotNull.compile(FieldRef::new("id"), None).unwrap(),
            Predicate::Null {
                field: FieldRef::new("id"),
                negated: true
            }
        );
    }
}
