//! Configuration file parsing for `tabula.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};
use crate::kind::DateTimeFormat;

/// Main configuration structure for `tabula.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TabulaConfig {
    /// Paging defaults and limits.
    #[serde(default)]
    pub paging: PagingConfig,

    /// Filter compilation settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl TabulaConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content)?;

        let config: Self =
            toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> SchemaResult<()> {
        self.paging.validate()
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> SchemaResult<Self> {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(paging) = overrides.paging {
                if let Some(size) = paging.default_page_size {
                    self.paging.default_page_size = size;
                }
                if let Some(max) = paging.max_page_size {
                    self.paging.max_page_size = max;
                }
            }
            if let Some(filter) = overrides.filter {
                if let Some(split) = filter.minute_split {
                    self.filter.minute_split = split;
                }
                if let Some(format) = filter.default_date_time_format {
                    self.filter.default_date_time_format = format;
                }
            }
            if let Some(debug) = overrides.debug {
                if let Some(log_predicates) = debug.log_predicates {
                    self.debug.log_predicates = log_predicates;
                }
            }
        }
        self.validate()?;
        Ok(self)
    }
}

/// Paging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PagingConfig {
    /// Page size used when a request does not carry one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest page size a request may ask for.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl PagingConfig {
    /// Reject zero sizes and a default above the maximum.
    pub fn validate(&self) -> SchemaResult<()> {
        if self.default_page_size == 0 {
            return Err(SchemaError::config("paging.default_page_size must be positive"));
        }
        if self.max_page_size < self.default_page_size {
            return Err(SchemaError::config(format!(
                "paging.max_page_size ({}) is smaller than paging.default_page_size ({})",
                self.max_page_size, self.default_page_size
            )));
        }
        Ok(())
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> u32 { 30 }
fn default_max_page_size() -> u32 { 500 }

/// How a minute-granularity DateTime rule is compiled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MinuteSplit {
    /// Date, hour and minute are compared separately with the rule's operator
    /// and AND-ed together.
    #[default]
    ComponentWise,
    /// The field truncated to the minute is compared with the value truncated
    /// to the minute.
    Truncated,
}

/// Filter compilation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Interpretation of minute-granularity DateTime rules.
    #[serde(default)]
    pub minute_split: MinuteSplit,

    /// Granularity for DateTime columns that do not set one.
    #[serde(default)]
    pub default_date_time_format: DateTimeFormat,
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log every compiled predicate at debug level.
    #[serde(default)]
    pub log_predicates: bool,
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Paging overrides.
    pub paging: Option<PagingOverride>,

    /// Filter overrides.
    pub filter: Option<FilterOverride>,

    /// Debug overrides.
    pub debug: Option<DebugOverride>,
}

/// Paging configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PagingOverride {
    /// Override default_page_size.
    pub default_page_size: Option<u32>,

    /// Override max_page_size.
    pub max_page_size: Option<u32>,
}

/// Filter configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterOverride {
    /// Override minute_split.
    pub minute_split: Option<MinuteSplit>,

    /// Override default_date_time_format.
    pub default_date_time_format: Option<DateTimeFormat>,
}

/// Debug configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    /// Override log_predicates.
    pub log_predicates: Option<bool>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> SchemaResult<String> {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| SchemaError::config(format!("invalid interpolation pattern: {e}")))?;

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    Ok(result)
}
