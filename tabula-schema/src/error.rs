//! Error types for record descriptors and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while resolving property paths or loading configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(tabula::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A path segment does not name a field of the record it is applied to.
    #[error("unknown field `{field}` on record `{record}` (path `{path}`)")]
    #[diagnostic(
        code(tabula::schema::unknown_field),
        help("check the column's property path against the record descriptor")
    )]
    UnknownField {
        record: String,
        field: String,
        path: String,
    },

    /// The path is syntactically broken or traverses through a scalar.
    #[error("invalid property path `{path}`: {message}")]
    #[diagnostic(code(tabula::schema::invalid_path))]
    InvalidPath { path: String, message: String },

    /// Duplicate field in a record descriptor.
    #[error("duplicate field `{field}` on record `{record}`")]
    #[diagnostic(code(tabula::schema::duplicate_field))]
    DuplicateField { record: String, field: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(tabula::schema::config_error))]
    ConfigError { message: String },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(tabula::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },
}

impl SchemaError {
    /// Create an unknown field error.
    pub fn unknown_field(
        record: impl Into<String>,
        field: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::UnknownField {
            record: record.into(),
            field: field.into(),
            path: path.into(),
        }
    }

    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// The offending path, for path-related errors.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::UnknownField { path, .. } | Self::InvalidPath { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether this error describes a bad property path.
    pub fn is_path_error(&self) -> bool {
        matches!(self, Self::UnknownField { .. } | Self::InvalidPath { .. })
    }
}
