//! # Structured Logging Module
//!
//! Environment-aware structured logging for transitions and admission decisions.
//! Production emits JSON lines; other environments get human-readable console output.

use crate::config::LoggingConfig;
use chrono::Utc;
use std::fmt::Display;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    init_structured_logging_with(&LoggingConfig::default());
}

/// Initialize structured logging, honouring the loaded logging section.
/// Only the first call in a process has any effect.
pub fn init_structured_logging_with(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = config.json || environment == "production";

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Use try_init to avoid panic if global subscriber already set
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
pub(crate) fn get_environment() -> String {
    std::env::var("PREMISES_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log an applied lifecycle transition
pub fn log_transition(
    entity_kind: &str,
    entity_id: i64,
    from: &impl Display,
    to: &impl Display,
    reason: &str,
) {
    tracing::info!(
        entity_kind = %entity_kind,
        entity_id = entity_id,
        from = %from,
        to = %to,
        reason = %reason,
        "{from} -> {to} ({reason})"
    );
}

/// Log a single admission handler decision
pub fn log_admission(chain: &str, handler: &str, outcome: &str, details: Option<&str>) {
    tracing::debug!(
        chain = %chain,
        handler = %handler,
        outcome = %outcome,
        details = details,
        "ADMISSION_CHECK"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        log_transition("store", 1, &"closed", &"normal_operation", "reopen");
    }
}
