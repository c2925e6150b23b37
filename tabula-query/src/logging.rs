//! Logging setup for Tabula.
//!
//! Library code logs through `tracing`: `debug!` when rules compile and pages
//! are produced, `trace!` for per-rule details, `warn!` when a request is
//! rejected. Nothing is printed unless a subscriber is installed.
//!
//! # Environment Variables
//!
//! - `TABULA_DEBUG=true|1|yes` - Enable debug logging
//! - `TABULA_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `TABULA_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use tabula_query::logging;
//!
//! // Installs a subscriber when the `tracing-subscriber` feature is on
//! // and TABULA_DEBUG or TABULA_LOG_LEVEL is set.
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "TABULA_DEBUG";
const LEVEL_VAR: &str = "TABULA_LOG_LEVEL";
const FORMAT_VAR: &str = "TABULA_LOG_FORMAT";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

/// Whether `TABULA_DEBUG` is set to "true", "1" or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Level from `TABULA_LOG_LEVEL`; "debug" when `TABULA_DEBUG` is on, else "warn".
pub fn log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var(LEVEL_VAR) {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// Format from `TABULA_LOG_FORMAT`, defaulting to JSON.
pub fn log_format() -> LogFormat {
    match env::var(FORMAT_VAR).map(|f| f.to_lowercase()) {
        Ok(f) if f == "pretty" => LogFormat::Pretty,
        Ok(f) if f == "compact" => LogFormat::Compact,
        _ => LogFormat::Json,
    }
}

/// Install the Tabula subscriber. Subsequent calls are no-ops.
///
/// Does nothing unless `TABULA_DEBUG` or `TABULA_LOG_LEVEL` is set, or when
/// built without the `tracing-subscriber` feature.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = log_level();
            let filter = EnvFilter::try_new(format!(
                "tabula={},tabula_query={},tabula_schema={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match log_format() {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format = ?log_format(), "Tabula logging initialized");
            }
        }
    });
}

/// Install the subscriber at a given level.
///
/// # Safety
///
/// This sets `TABULA_LOG_LEVEL`, which is unsafe once other threads run.
/// Call it at program startup.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as a startup-only call.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

/// Debug-level log gated on `TABULA_DEBUG` at runtime.
#[macro_export]
macro_rules! tabula_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            $crate::__private::tracing::debug!($($arg)*);
        }
    };
}

/// Trace-level log gated on `TABULA_DEBUG` at runtime.
#[macro_export]
macro_rules! tabula_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            $crate::__private::tracing::trace!($($arg)*);
        }
    };
}
