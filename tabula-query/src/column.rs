//! Grid columns a filter rule can target.

use serde::{Deserialize, Serialize};

pub use tabula_schema::DateTimeFormat;

/// A filterable column of a grid.
///
/// ```rust
/// use tabula_query::{Column, DateTimeFormat};
///
/// let column = Column::new("customer.name");
/// assert_eq!(column.display_name(), "customer.name");
///
/// let column = Column::new("created_at")
///     .with_display_name("Created")
///     .with_date_time_format(DateTimeFormat::Date);
/// assert_eq!(column.date_time_format(), DateTimeFormat::Date);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    property_path: String,
    display_name: Option<String>,
    date_time_format: Option<DateTimeFormat>,
}

impl Column {
    /// Create a column for a dot-separated property path.
    pub fn new(property_path: impl Into<String>) -> Self {
        Self {
            property_path: property_path.into(),
            display_name: None,
            date_time_format: None,
        }
    }

    /// Set the header text.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the DateTime granularity.
    pub fn with_date_time_format(mut self, format: DateTimeFormat) -> Self {
        self.date_time_format = Some(format);
        self
    }

    /// The dot-separated property path.
    pub fn property_path(&self) -> &str {
        &self.property_path
    }

    /// Header text; the property path when none was set.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.property_path)
    }

    /// DateTime granularity, [`DateTimeFormat::DateHourMinuteSecond`] unless set.
    pub fn date_time_format(&self) -> DateTimeFormat {
        self.date_time_format.unwrap_or_default()
    }

    /// DateTime granularity, falling back to `default` when unset.
    pub fn date_time_format_or(&self, default: DateTimeFormat) -> DateTimeFormat {
        self.date_time_format.unwrap_or(default)
    }
}
