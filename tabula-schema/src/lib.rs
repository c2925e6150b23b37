//! # tabula-schema
//!
//! Record descriptors and configuration for Tabula.
//!
//! This crate provides:
//! - [`ValueKind`] and [`FieldType`]: what a column holds and what the host declared
//! - [`RecordSchema`]: descriptor tables resolving dot-separated property paths
//! - [`TabulaConfig`]: the `tabula.toml` configuration file
//!
//! ## Example
//!
//! ```rust
//! use tabula_schema::{FieldType, RecordSchema, SchemaResolver, TabulaConfig};
//!
//! let schema = RecordSchema::builder("Invoice")
//!     .field("number", FieldType::Int64)
//!     .field("paid_at", FieldType::nullable(FieldType::DateTime))
//!     .build()
//!     .unwrap();
//! assert!(schema.resolve("paid_at").unwrap().nullable);
//!
//! let config = TabulaConfig::from_str("[paging]\ndefault_page_size = 10").unwrap();
//! assert_eq!(config.paging.default_page_size, 10);
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod kind;

pub use config::{DebugConfig, FilterConfig, MinuteSplit, PagingConfig, TabulaConfig};
pub use descriptor::{FieldDescriptor, RecordSchema, RecordSchemaBuilder, ResolvedField, SchemaResolver};
pub use error::{SchemaError, SchemaResult};
pub use kind::{DateTimeFormat, EnumDef, FieldType, KindCategory, UnsupportedType, ValueKind};
