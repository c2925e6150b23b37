//! Records that predicates evaluate against.
//!
//! Hosts expose their rows through [`Record`], a read-only field accessor.
//! Typed rows additionally implement [`Model`] to describe their fields so
//! rules can resolve property paths before any data is touched.

use tabula_schema::RecordSchema;

use crate::value::FilterValue;

/// The value found at one field of a record.
#[derive(Debug)]
pub enum FieldValue<'a> {
    /// The field is null or absent.
    Null,
    /// A scalar value.
    Scalar(FilterValue),
    /// A nested record.
    Record(&'a dyn Record),
}

impl FieldValue<'_> {
    /// Check if the field is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Read access to the fields of a row.
pub trait Record: Send + Sync {
    /// The value of a direct field. Unknown fields read as null.
    fn field(&self, name: &str) -> FieldValue<'_>;
}

impl std::fmt::Debug for dyn Record + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Record")
    }
}

/// A record type with a static descriptor.
pub trait Model: Record {
    /// Field descriptors for property-path resolution.
    fn schema() -> &'static RecordSchema;
}

/// Walk a property path. A null or scalar value before the last segment
/// makes the result null.
pub fn lookup<'a>(record: &'a dyn Record, segments: &[String]) -> FieldValue<'a> {
    let Some((last, parents)) = segments.split_last() else {
        return FieldValue::Null;
    };

    let mut current = record;
    for segment in parents {
        match current.field(segment) {
            FieldValue::Record(next) => current = next,
            FieldValue::Null | FieldValue::Scalar(_) => return FieldValue::Null,
        }
    }
    current.field(last)
}

impl<T: Record> Record for Option<T> {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match self {
            Some(record) => record.field(name),
            None => FieldValue::Null,
        }
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn field(&self, name: &str) -> FieldValue<'_> {
        (**self).field(name)
    }
}

impl<T: Record + ?Sized> Record for std::sync::Arc<T> {
    fn field(&self, name: &str) -> FieldValue<'_> {
        (**self).field(name)
    }
}

/// JSON objects are records. Strings stay text; RFC 3339 strings still
/// compare against DateTime predicates.
impl Record for serde_json::Value {
    fn field(&self, name: &str) -> FieldValue<'_> {
        use serde_json::Value;

        let Some(value) = self.as_object().and_then(|map| map.get(name)) else {
            return FieldValue::Null;
        };

        match value {
            Value::Null | Value::Array(_) => FieldValue::Null,
            Value::Bool(b) => FieldValue::Scalar(FilterValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Scalar(FilterValue::Int64(i))
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Scalar(FilterValue::UInt64(u))
                } else {
                    n.as_f64()
                        .map_or(FieldValue::Null, |f| FieldValue::Scalar(FilterValue::Float(f)))
                }
            }
            Value::String(s) => FieldValue::Scalar(FilterValue::Text(s.clone())),
            Value::Object(_) => FieldValue::Record(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    #[test]
    fn test_json_fields() {
        let row = json!({ "id": 7, "big": u64::MAX, "ratio": 0.5, "ok": true, "name": "x" });
        assert!(matches!(row.field("id"), FieldValue::Scalar(FilterValue::Int64(7))));
        assert!(matches!(row.field("big"), FieldValue::Scalar(FilterValue::UInt64(u64::MAX))));
        assert!(matches!(row.field("ratio"), FieldValue::Scalar(FilterValue::Float(_))));
        assert!(matches!(row.field("ok"), FieldValue::Scalar(FilterValue::Bool(true))));
        assert!(row.field("missing").is_null());
    }

    #[test]
    fn test_lookup_nested() {
        let row = json!({ "customer": { "address": { "city": "Ghent" } }, "owner": null });
        match lookup(&row, &path("customer.address.city")) {
            FieldValue::Scalar(FilterValue::Text(city)) => assert_eq!(city, "Ghent"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(lookup(&row, &path("owner.name")).is_null());
        assert!(lookup(&row, &path("customer.address.city.len")).is_null());
    }

    #[test]
    fn test_optional_record() {
        let none: Option<serde_json::Value> = None;
        assert!(none.field("id").is_null());
        let some = Some(json!({ "id": 1 }));
        assert!(!some.field("id").is_null());
    }
}
