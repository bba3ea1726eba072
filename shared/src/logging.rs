//! Shared logging utilities for consistent tracing across the orchestrator and its units

use crate::types::UnitId;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Crate-level filter applied when no explicit `RUST_LOG` is present
fn default_filter(base_level: &str) -> String {
    format!("orchestrator={base_level},worker={base_level},shared={base_level}")
}

/// Initialize the tracing subscriber with an optional log level.
///
/// A `RUST_LOG` directive in the environment wins over `log_level`. Calling
/// this more than once is harmless; only the first subscriber is installed.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, EnvFilter};

    let base_level = log_level.unwrap_or("info");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(base_level)));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for unit-aware info logging
#[macro_export]
macro_rules! unit_info {
    ($unit_id:expr, $($arg:tt)*) => {
        tracing::info!(
            unit = %$unit_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for unit-aware warning logging
#[macro_export]
macro_rules! unit_warn {
    ($unit_id:expr, $($arg:tt)*) => {
        tracing::warn!(
            unit = %$unit_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for unit-aware error logging
#[macro_export]
macro_rules! unit_error {
    ($unit_id:expr, $($arg:tt)*) => {
        tracing::error!(
            unit = %$unit_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for unit-aware debug logging
#[macro_export]
macro_rules! unit_debug {
    ($unit_id:expr, $($arg:tt)*) => {
        tracing::debug!(
            unit = %$unit_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for error conditions
pub fn log_error(unit_id: UnitId, context: &str, error: &dyn std::fmt::Display) {
    error!(
        unit = %unit_id,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(unit_id: UnitId, message: &str) {
    info!(
        unit = %unit_id,
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}

/// Contextual logging helper for progress updates
pub fn log_progress(unit_id: UnitId, action: &str, details: &str) {
    info!(
        unit = %unit_id,
        timestamp = format_timestamp(),
        "📋 {}: {}",
        action,
        details
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_all_crates() {
        let filter = default_filter("debug");
        assert!(filter.contains("orchestrator=debug"));
        assert!(filter.contains("worker=debug"));
        assert!(filter.contains("shared=debug"));
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(Some("warn"));
        init_tracing(None);
        crate::unit_info!(UnitId::current(), "still logging after double init");
    }
}
