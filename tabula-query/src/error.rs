//! Error types for filter compilation and paging, with actionable messages.
//!
//! Every error is raised where the problem is detected: while a rule is built
//! or rebound, while it is compiled, or while a pager is validated. Nothing is
//! deferred to predicate evaluation and nothing is retried.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: T{category}{number}
//! - 1xxx: Filter errors (unsupported kind, bad path, bad value, operator)
//! - 2xxx: Paging errors (validation)
//! - 5xxx: Record source errors
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use tabula_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::invalid_path("custmer.name", "unknown field `custmer`");
//! assert_eq!(err.code, ErrorCode::InvalidPath);
//! assert_eq!(err.code.code(), "T1003");
//! ```

use std::fmt;
use thiserror::Error;

use tabula_schema::SchemaError;

/// Result type for filter and paging operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Filter errors (1xxx)
    /// Column type cannot be filtered on (T1001).
    UnsupportedKind = 1001,
    /// Value kind outside the known set reached dispatch (T1002).
    InvalidKind = 1002,
    /// Property path does not resolve (T1003).
    InvalidPath = 1003,
    /// Filter value does not fit the column (T1004).
    InvalidValue = 1004,
    /// Operator does not accept the column's kind (T1005).
    IncompatibleOperator = 1005,

    // Paging errors (2xxx)
    /// Page number or page size out of range (T2001).
    Validation = 2001,

    // Record source errors (5xxx)
    /// The record source failed to count or fetch (T5001).
    SourceFailed = 5001,

    // Configuration errors (7xxx)
    /// Invalid configuration (T7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (T9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "T1001").
    pub fn code(&self) -> String {
        format!("T{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedKind => "Unsupported column kind",
            Self::InvalidKind => "Invalid value kind",
            Self::InvalidPath => "Invalid property path",
            Self::InvalidValue => "Invalid filter value",
            Self::IncompatibleOperator => "Operator not allowed for column",
            Self::Validation => "Invalid paging parameters",
            Self::SourceFailed => "Record source failure",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The property path or parameter involved.
    pub field: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors raised while building rules, compiling predicates or paging.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// The declared column type cannot be filtered on.
    pub fn unsupported_kind(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self::new(
            ErrorCode::UnsupportedKind,
            format!("Unsupported property type `{}` for filtering: {}", type_name, reason.into()),
        )
        .with_suggestion("Expose the column as a supported kind (integer, float, decimal, bool, text, DateTime, enum or byte)")
    }

    /// A value kind outside the known set reached dispatch.
    pub fn invalid_kind(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidKind, message)
            .with_help("This indicates an inconsistent rule; rebuild it from its column")
    }

    /// A property path did not resolve.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::InvalidPath,
            format!("Invalid property path `{}`: {}", path, message.into()),
        )
        .with_field(&path)
        .with_suggestion("Check the column's property path against the record descriptor")
    }

    /// A filter value does not fit the column.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidValue,
            format!("Invalid filter value for `{}`: {}", field, message.into()),
        )
        .with_field(&field)
    }

    /// The operator does not accept the column's kind.
    pub fn incompatible_operator(
        operator: impl fmt::Display,
        field: impl Into<String>,
        kind: impl fmt::Display,
    ) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::IncompatibleOperator,
            format!("Operator {} cannot be applied to `{}` of kind {}", operator, field, kind),
        )
        .with_field(&field)
        .with_suggestion("Pick one of the operators offered for this column")
    }

    /// Paging parameters out of range.
    pub fn validation(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        let parameter = parameter.into();
        Self::new(
            ErrorCode::Validation,
            format!("Invalid {}: {}", parameter, message.into()),
        )
        .with_field(&parameter)
    }

    /// The record source failed.
    pub fn source_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::SourceFailed,
            format!("Record source error: {}", message.into()),
        )
    }

    /// Invalid configuration.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    // ============== Error Checks ==============

    /// Whether the caller can recover by re-prompting or clamping input.
    pub fn is_validation(&self) -> bool {
        self.code == ErrorCode::Validation
    }

    /// Whether this error comes from the filter compiler.
    pub fn is_filter_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnsupportedKind
                | ErrorCode::InvalidKind
                | ErrorCode::InvalidPath
                | ErrorCode::InvalidValue
                | ErrorCode::IncompatibleOperator
        )
    }

    /// Whether this is a configuration error.
    pub fn is_configuration_error(&self) -> bool {
        self.code == ErrorCode::InvalidConfiguration
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

impl From<SchemaError> for QueryError {
    fn from(err: SchemaError) -> Self {
        match &err {
            SchemaError::UnknownField { path, .. } | SchemaError::InvalidPath { path, .. } => {
                Self::invalid_path(path.clone(), err.to_string()).with_source(err)
            }
            _ => Self::configuration(err.to_string()).with_source(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::UnsupportedKind.code(), "T1001");
        assert_eq!(ErrorCode::Validation.code(), "T2001");
        assert_eq!(ErrorCode::InvalidConfiguration.code(), "T7001");
    }

    #[test]
    fn test_validation_is_recoverable() {
        let err = QueryError::validation("page_nr", "must be positive, got 0");
        assert!(err.is_validation());
        assert!(!err.is_filter_error());
        assert_eq!(err.context.field, Some("page_nr".to_string()));
    }

    #[test]
    fn test_filter_errors() {
        assert!(QueryError::unsupported_kind("Char", "characters are not filterable").is_filter_error());
        assert!(QueryError::invalid_path("a.b", "unknown").is_filter_error());
        assert!(QueryError::incompatible_operator("Contains", "age", "Int32").is_filter_error());
    }

    #[test]
    fn test_schema_error_conversion() {
        let err: QueryError = SchemaError::unknown_field("Order", "custmer", "custmer.name").into();
        assert_eq!(err.code, ErrorCode::InvalidPath);
        assert_eq!(err.context.field, Some("custmer.name".to_string()));
        assert!(err.source.is_some());

        let err: QueryError = SchemaError::config("bad").into();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::invalid_value("age", "expected Int32, got Text")
            .with_context("Compiling filter rule");

        let output = err.display_full();
        assert!(output.contains("T1004"));
        assert!(output.contains("age"));
        assert!(output.contains("Compiling filter rule"));
    }
}
