//! # Tabula
//!
//! A type-driven filter-predicate compiler and paging engine for data-grid
//! backends.
//!
//! Tabula provides:
//! - Filter rules bound to a column, an operator and a typed value
//! - An operator catalog that knows which operators fit which value kinds
//! - Predicates that evaluate in memory or render to parameterised SQL
//! - Skip/take paging with sort and page metadata
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::LazyLock;
//! use serde_json::{Value, json};
//! use tabula::prelude::*;
//!
//! struct Order(Value);
//!
//! impl Record for Order {
//!     fn field(&self, name: &str) -> FieldValue<'_> {
//!         self.0.field(name)
//!     }
//! }
//!
//! impl Model for Order {
//!     fn schema() -> &'static RecordSchema {
//!         static SCHEMA: LazyLock<RecordSchema> = LazyLock::new(|| {
//!             RecordSchema::builder("Order")
//!                 .field("id", FieldType::Int64)
//!                 .field("customer", FieldType::Text)
//!                 .build()
//!                 .expect("valid schema")
//!         });
//!         &SCHEMA
//!     }
//! }
//!
//! # fn main() -> Result<(), QueryError> {
//! let mut rule = FilterRule::<Order>::for_column(Column::new("customer"), Operator::StartsWith)?;
//! rule.update_filter_value("Ac");
//!
//! let predicate = rule.generate_expression()?;
//! assert!(predicate.evaluate(&Order(json!({ "id": 1, "customer": "Acme" }))));
//! assert!(!predicate.evaluate(&Order(json!({ "id": 2, "customer": "Globex" }))));
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Record descriptors, value kinds and configuration.
pub mod schema {
    pub use tabula_schema::*;
}

/// Filter rules, predicates and paging.
pub mod query {
    pub use tabula_query::*;
}

pub use tabula_query::logging;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::query::{
        Column, CompileOptions, FieldValue, FilterRule, FilterValue, MemorySource, Model,
        Operator, PagedResult, Pager, PagingInfo, Predicate, QueryError, QueryResult, Record,
        RecordSource, RequestArgs, SortDirection,
    };
    pub use crate::schema::{
        DateTimeFormat, EnumDef, FieldType, MinuteSplit, RecordSchema, SchemaResolver,
        TabulaConfig, ValueKind,
    };
}

// Re-export key types at the crate root
pub use query::{QueryError, QueryResult};
pub use schema::{SchemaError, TabulaConfig};
