//! # tabula-query
//!
//! Filter rules, predicate compilation and paging for data-grid backends.
//!
//! This crate provides:
//! - The operator catalog with its capability table
//! - Filter rules with type-driven value defaulting and coercion
//! - A predicate compiler, including DateTime granularity splitting
//! - In-memory predicate evaluation and parameterised SQL rendering
//! - Skip/take paging over in-memory collections and async record sources
//!
//! ## Operators
//!
//! ```rust
//! use tabula_query::Operator;
//! use tabula_schema::ValueKind;
//!
//! let offered = Operator::operators_for(&ValueKind::Boolean, false);
//! assert!(offered.contains(&Operator::Equals));
//! assert!(!offered.contains(&Operator::GreaterThan));
//! ```
//!
//! ## Predicates
//!
//! ```rust
//! use serde_json::json;
//! use tabula_query::{FieldRef, Operand, Operator, Predicate};
//!
//! let predicate = Predicate::and([
//!     Operator::Contains
//!         .compile(FieldRef::new("title"), Some(Operand::Text("grid".into())))
//!         .unwrap(),
//!     Operator::IsNotNull.compile(FieldRef::new("owner.name"), None).unwrap(),
//! ]);
//!
//! let row = json!({ "title": "datagrid", "owner": { "name": "Ana" } });
//! assert!(predicate.evaluate(&row));
//! assert_eq!(predicate.to_sql(0).0, "(title LIKE $1 AND owner.name IS NOT NULL)");
//! ```
//!
//! ## Paging
//!
//! ```rust
//! use tabula_query::{Pager, PagedResult, SortDirection};
//!
//! let pager = Pager::new(2, 10, "", SortDirection::Ascending).unwrap();
//! assert_eq!((pager.skip(), pager.take()), (10, 10));
//!
//! let page = PagedResult::new(vec!["a", "b"], 2, 10, 12);
//! assert_eq!(page.paging.page_count, 2);
//! assert!(page.paging.has_previous());
//! ```

pub mod column;
pub mod compile;
pub mod error;
pub mod logging;
pub mod operator;
pub mod pager;
pub mod paging;
pub mod predicate;
pub mod record;
pub mod request;
pub mod rule;
pub mod source;
pub mod value;

pub use column::{Column, DateTimeFormat};
pub use compile::CompileOptions;
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use operator::Operator;
pub use pager::{Pager, Sort, SortDirection};
pub use paging::{PagedResult, PagingInfo, apply_paging, apply_paging_async, sort_records};
pub use predicate::{Access, CompareOp, FieldRef, LikePattern, Operand, Predicate};
pub use record::{FieldValue, Model, Record, lookup};
pub use request::RequestArgs;
pub use rule::FilterRule;
pub use source::{MemorySource, RecordSource};
pub use value::{FilterValue, ValueError, ValueKindExt};

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}
