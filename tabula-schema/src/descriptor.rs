//! Record descriptors and property-path resolution.
//!
//! A [`RecordSchema`] is a descriptor table built once per record type. It maps
//! field names to declared [`FieldType`]s; nested records are traversed with
//! dot-separated paths.
//!
//! ```rust
//! use std::sync::Arc;
//! use tabula_schema::{FieldType, RecordSchema, SchemaResolver};
//!
//! let customer = RecordSchema::builder("Customer")
//!     .field("name", FieldType::Text)
//!     .build()
//!     .unwrap();
//!
//! let order = RecordSchema::builder("Order")
//!     .field("id", FieldType::Int32)
//!     .field("customer", FieldType::nullable(FieldType::Record(Arc::new(customer))))
//!     .build()
//!     .unwrap();
//!
//! let resolved = order.resolve("customer.name").unwrap();
//! assert_eq!(resolved.segments, vec!["customer", "name"]);
//! assert!(resolved.nullable);
//! assert!(order.resolve("customer.email").is_err());
//! ```

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{SchemaError, SchemaResult};
use crate::kind::FieldType;

/// One field of a record descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, as used in property paths.
    pub name: String,
    /// Declared type.
    pub ty: FieldType,
}

/// Descriptor table for one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    name: String,
    fields: IndexMap<String, FieldDescriptor>,
}

impl RecordSchema {
    /// Start building a descriptor.
    pub fn builder(name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Record type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a direct field.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Number of direct fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`RecordSchema`].
#[derive(Debug)]
pub struct RecordSchemaBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordSchemaBuilder {
    /// Add a field.
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            ty,
        });
        self
    }

    /// Finish the descriptor, rejecting duplicate or dotted field names.
    pub fn build(self) -> SchemaResult<RecordSchema> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            if field.name.is_empty() || field.name.contains('.') {
                return Err(SchemaError::invalid_path(
                    field.name,
                    format!("field names of `{}` must be non-empty and undotted", self.name),
                ));
            }
            if fields.contains_key(&field.name) {
                return Err(SchemaError::DuplicateField {
                    record: self.name,
                    field: field.name,
                });
            }
            fields.insert(field.name.clone(), field);
        }
        Ok(RecordSchema {
            name: self.name,
            fields,
        })
    }
}

/// A property path resolved against a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// The original dotted path.
    pub path: String,
    /// Path split into field names.
    pub segments: Vec<String>,
    /// Declared type of the final field.
    pub field_type: FieldType,
    /// Whether the value at the end of the path can be null, either because the
    /// field is nullable or because a record along the way is.
    pub nullable: bool,
}

/// Resolves property paths into declared types.
///
/// Hosts that do not describe their records with [`RecordSchema`] can
/// implement this directly.
pub trait SchemaResolver {
    /// Resolve a dot-separated property path.
    fn resolve(&self, path: &str) -> SchemaResult<ResolvedField>;
}

impl SchemaResolver for RecordSchema {
    fn resolve(&self, path: &str) -> SchemaResult<ResolvedField> {
        if path.is_empty() {
            return Err(SchemaError::invalid_path(path, "path is empty"));
        }

        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(SchemaError::invalid_path(path, "path contains an empty segment"));
        }

        let mut current = self;
        let mut nullable = false;

        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| SchemaError::invalid_path(path, "path has no segments"))?;

        for segment in parents {
            let field = current
                .field(segment)
                .ok_or_else(|| SchemaError::unknown_field(current.name(), segment, path))?;
            nullable |= field.ty.is_nullable();

            current = field.ty.as_record().map(|schema| &**schema).ok_or_else(|| {
                SchemaError::invalid_path(
                    path,
                    format!("`{segment}` is not a record and cannot be traversed"),
                )
            })?;
        }

        let field = current
            .field(last)
            .ok_or_else(|| SchemaError::unknown_field(current.name(), last, path))?;
        nullable |= field.ty.is_nullable();
        let field_type = field.ty.clone();

        trace!(path, record = %self.name, "resolved property path");
        Ok(ResolvedField {
            path: path.to_string(),
            segments,
            field_type,
            nullable,
        })
    }
}

impl<T: SchemaResolver + ?Sized> SchemaResolver for &T {
    fn resolve(&self, path: &str) -> SchemaResult<ResolvedField> {
        (**self).resolve(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn order_schema() -> RecordSchema {
        let address = RecordSchema::builder("Address")
            .field("city", FieldType::Text)
            .field("zip", FieldType::nullable(FieldType::Text))
            .build()
            .unwrap();
        let customer = RecordSchema::builder("Customer")
            .field("name", FieldType::Text)
            .field("address", FieldType::Record(Arc::new(address)))
            .build()
            .unwrap();
        RecordSchema::builder("Order")
            .field("id", FieldType::Int32)
            .field("total", FieldType::Decimal)
            .field("customer", FieldType::Record(Arc::new(customer)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_direct_field() {
        let schema = order_schema();
        let resolved = schema.resolve("id").unwrap();
        assert_eq!(resolved.field_type, FieldType::Int32);
        assert!(!resolved.nullable);
    }

    #[test]
    fn test_resolve_nested_path() {
        let schema = order_schema();
        let resolved = schema.resolve("customer.address.zip").unwrap();
        assert_eq!(resolved.segments, vec!["customer", "address", "zip"]);
        assert!(resolved.nullable);
    }

    #[test]
    fn test_unknown_segment() {
        let schema = order_schema();
        let err = schema.resolve("customer.email").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { ref record, .. } if record == "Customer"));
    }

    #[test]
    fn test_traversal_through_scalar_fails() {
        let schema = order_schema();
        let err = schema.resolve("id.value").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPath { .. }));
    }

    #[test]
    fn test_empty_segments_fail() {
        let schema = order_schema();
        assert!(schema.resolve("").is_err());
        assert!(schema.resolve("customer..name").is_err());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = RecordSchema::builder("Order")
            .field("id", FieldType::Int32)
            .field("id", FieldType::Int64)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = order_schema();
        let names: Vec<_> = schema.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "total", "customer"]);
    }
}
