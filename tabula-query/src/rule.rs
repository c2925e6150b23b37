//! Filter rules: one column, one operator, one value.
//!
//! A rule derives its expected kind from the column's declared type and seeds
//! a default value of that kind. Rebinding the rule to another column resets
//! both; the rule id never changes.
//!
//! ```rust
//! use std::sync::LazyLock;
//! use tabula_query::{Column, FieldValue, FilterRule, FilterValue, Model, Operator, Record};
//! use tabula_schema::{FieldType, RecordSchema};
//!
//! struct Invoice {
//!     number: i64,
//! }
//!
//! impl Record for Invoice {
//!     fn field(&self, name: &str) -> FieldValue<'_> {
//!         match name {
//!             "number" => FieldValue::Scalar(FilterValue::Int64(self.number)),
//!             _ => FieldValue::Null,
//!         }
//!     }
//! }
//!
//! impl Model for Invoice {
//!     fn schema() -> &'static RecordSchema {
//!         static SCHEMA: LazyLock<RecordSchema> = LazyLock::new(|| {
//!             RecordSchema::builder("Invoice")
//!                 .field("number", FieldType::Int64)
//!                 .build()
//!                 .expect("valid schema")
//!         });
//!         &SCHEMA
//!     }
//! }
//!
//! let mut rule = FilterRule::<Invoice>::for_column(Column::new("number"), Operator::GreaterThan).unwrap();
//! rule.update_filter_value(FilterValue::Int64(10));
//!
//! let predicate = rule.generate_expression().unwrap();
//! assert!(predicate.evaluate(&Invoice { number: 11 }));
//! assert!(!predicate.evaluate(&Invoice { number: 10 }));
//! assert_eq!(rule.applied_filter_rule_text(), "number\tGreaterThan\t10");
//! ```

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;
use uuid::Uuid;

use tabula_schema::{FieldType, SchemaResolver, ValueKind};

use crate::column::Column;
use crate::compile::{CompileOptions, RuleInput, compile_rule};
use crate::error::{QueryError, QueryResult};
use crate::operator::Operator;
use crate::predicate::Predicate;
use crate::record::Model;
use crate::value::FilterValue;

/// A single filter condition over records of type `M`.
pub struct FilterRule<M> {
    id: Uuid,
    column: Column,
    property_name: String,
    operator: Operator,
    expected_kind: ValueKind,
    nullable: bool,
    value: Option<FilterValue>,
    applied: bool,
    _model: PhantomData<fn() -> M>,
}

/// Derive `(kind, nullable, default value)` from a declared type.
fn bind(declared_type: &FieldType) -> QueryResult<(ValueKind, bool, FilterValue)> {
    let (kind, nullable) = declared_type
        .resolve_kind()
        .map_err(|e| QueryError::unsupported_kind(e.type_name, e.reason))?;
    let default = FilterValue::default_for(&kind).ok_or_else(|| {
        QueryError::unsupported_kind(kind.name(), "enum declares no members")
    })?;
    Ok((kind, nullable, default))
}

impl<M> FilterRule<M> {
    /// Create a rule for a column of the given declared type.
    ///
    /// Fails with `UnsupportedKind` for types that cannot be filtered on and
    /// with `IncompatibleOperator` when the operator does not accept the kind.
    pub fn new(
        column: Column,
        declared_type: &FieldType,
        property_name: impl Into<String>,
        operator: Operator,
    ) -> QueryResult<Self> {
        let (kind, nullable, default) = bind(declared_type)?;
        if !operator.allows_column(&kind, nullable) {
            return Err(QueryError::incompatible_operator(operator, column.property_path(), &kind));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            column,
            property_name: property_name.into(),
            operator,
            expected_kind: kind,
            nullable,
            value: Some(default),
            applied: false,
            _model: PhantomData,
        })
    }

    /// Rebind the rule to another column, resetting kind and value.
    ///
    /// If the current operator does not accept the new kind the rule is left
    /// unchanged and `IncompatibleOperator` is returned.
    pub fn update_filter_property(
        &mut self,
        column: Column,
        declared_type: &FieldType,
        property_name: impl Into<String>,
    ) -> QueryResult<()> {
        let (kind, nullable, default) = bind(declared_type)?;
        if !self.operator.allows_column(&kind, nullable) {
            return Err(QueryError::incompatible_operator(
                self.operator,
                column.property_path(),
                &kind,
            ));
        }

        self.column = column;
        self.property_name = property_name.into();
        self.expected_kind = kind;
        self.nullable = nullable;
        self.value = Some(default);
        Ok(())
    }

    /// Change the operator, keeping the value.
    pub fn set_operator(&mut self, operator: Operator) -> QueryResult<()> {
        if !operator.allows_column(&self.expected_kind, self.nullable) {
            return Err(QueryError::incompatible_operator(
                operator,
                self.column.property_path(),
                &self.expected_kind,
            ));
        }
        self.operator = operator;
        Ok(())
    }

    /// Replace the value verbatim. Kind checks happen at compile time.
    pub fn update_filter_value(&mut self, value: impl Into<FilterValue>) {
        self.value = Some(value.into());
    }

    /// Replace the value with widget text parsed into the expected kind.
    pub fn update_filter_value_from_text(&mut self, text: &str) -> QueryResult<()> {
        let format = self.column.date_time_format();
        let value = FilterValue::parse(&self.expected_kind, text, format).map_err(|e| {
            QueryError::invalid_value(self.column.property_path(), e.to_string()).with_source(e)
        })?;
        self.value = Some(value);
        Ok(())
    }

    /// Mark the rule as applied or pending.
    pub fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }

    /// Whether the rule is applied.
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Rule id, stable across edits.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The targeted column.
    pub fn column(&self) -> &Column {
        &self.column
    }

    /// The property name the rule was bound with.
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// The operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The kind values are coerced into.
    pub fn expected_kind(&self) -> &ValueKind {
        &self.expected_kind
    }

    /// Whether the column admits null.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The current value.
    pub fn value(&self) -> Option<&FilterValue> {
        self.value.as_ref()
    }

    /// The operators this rule's column offers.
    pub fn allowed_operators(&self) -> Vec<Operator> {
        Operator::operators_for(&self.expected_kind, self.nullable)
    }

    /// Compact description for "applied filter" chips:
    /// `column\toperator\tvalue`, or `column\toperator` for null checks.
    pub fn applied_filter_rule_text(&self) -> String {
        self.applied_filter_rule_text_with(&CompileOptions::default())
    }

    /// Like [`applied_filter_rule_text`](Self::applied_filter_rule_text), with
    /// DateTime values shown at the granularity the rule compiles at under
    /// `options`.
    pub fn applied_filter_rule_text_with(&self, options: &CompileOptions) -> String {
        let name = self.column.display_name();
        if !self.operator.value_required() {
            return format!("{}\t{}", name, self.operator);
        }

        let value = match &self.value {
            Some(FilterValue::DateTime(dt)) => {
                let format = self.column.date_time_format_or(options.default_date_time_format);
                dt.format(format.strftime()).to_string()
            }
            Some(value) => value.to_string(),
            None => String::new(),
        };
        format!("{}\t{}\t{}", name, self.operator, value)
    }
}

impl<M: Model> FilterRule<M> {
    /// Create a rule whose declared type is looked up in the model's schema.
    pub fn for_column(column: Column, operator: Operator) -> QueryResult<Self> {
        let resolved = M::schema().resolve(column.property_path())?;
        let property_name = resolved
            .segments
            .last()
            .cloned()
            .unwrap_or_else(|| resolved.path.clone());
        let declared = if resolved.nullable && !resolved.field_type.is_nullable() {
            FieldType::nullable(resolved.field_type)
        } else {
            resolved.field_type
        };
        Self::new(column, &declared, property_name, operator)
    }

    /// Compile with default options.
    pub fn generate_expression(&self) -> QueryResult<Predicate> {
        self.generate_expression_with(&CompileOptions::default())
    }

    /// Compile into a predicate.
    ///
    /// The column path is resolved against the model's schema first, so a
    /// rule bound to a path the model does not have fails with `InvalidPath`.
    pub fn generate_expression_with(&self, options: &CompileOptions) -> QueryResult<Predicate> {
        let path = self.column.property_path();
        M::schema().resolve(path)?;

        let predicate = compile_rule(
            RuleInput {
                path,
                kind: &self.expected_kind,
                nullable: self.nullable,
                format: self.column.date_time_format_or(options.default_date_time_format),
                operator: self.operator,
                value: self.value.as_ref(),
            },
            options,
        )?;

        if options.log_predicates {
            debug!(rule = %self.id, predicate = %predicate, "compiled filter rule");
        }
        Ok(predicate)
    }
}

impl<M> Clone for FilterRule<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            column: self.column.clone(),
            property_name: self.property_name.clone(),
            operator: self.operator,
            expected_kind: self.expected_kind.clone(),
            nullable: self.nullable,
            value: self.value.clone(),
            applied: self.applied,
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for FilterRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRule")
            .field("id", &self.id)
            .field("column", &self.column)
            .field("property_name", &self.property_name)
            .field("operator", &self.operator)
            .field("expected_kind", &self.expected_kind)
            .field("nullable", &self.nullable)
            .field("value", &self.value)
            .field("applied", &self.applied)
            .finish()
    }
}
