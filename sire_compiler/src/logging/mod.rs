//! Global logging for the sire front end
//!
//! A process-wide `LoggingService` set once by the driver, a per-thread
//! source context attached to every event, and the macro support functions.
//! Logging before initialisation is a no-op.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, MultiLogger, StructuredLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static FILE_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from the runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    let logging_service = Arc::new(service::create_configured_service());

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized")?;

    logging_service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

/// Initialize with a custom service (primarily for testing)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// FILE CONTEXT MANAGEMENT
// ============================================================================

/// Name the source being compiled on this thread
pub fn set_file_context(source_name: impl Into<String>) {
    let source_name = source_name.into();
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(source_name);
    });
}

pub fn clear_file_context() {
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
}

/// Run `f` with the source name attached to every event it logs
pub fn with_file_context<F, R>(source_name: impl Into<String>, f: F) -> R
where
    F: FnOnce() -> R,
{
    set_file_context(source_name);
    let result = f();
    clear_file_context();
    result
}

/// Current source name (used by macros)
pub fn get_current_file_context() -> Option<String> {
    if !config::include_file_context() {
        return None;
    }
    FILE_CONTEXT.with(|ctx| ctx.borrow().clone())
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

fn dispatch(mut event: LogEvent, context: Vec<(&str, &str)>) {
    for (key, value) in context {
        event = event.with_context(key, value);
    }

    if let Some(source) = get_current_file_context() {
        event = event.with_context("file", &source);
    }

    if let Some(logger) = try_get_global_logger() {
        logger.log_event(event);
    }
}

/// Used by `log_error!`
pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<crate::utils::Span>,
    context: Vec<(&str, &str)>,
) {
    let mut event = LogEvent::error(code, message);
    if let Some(s) = span {
        event = event.with_span(s);
    }
    dispatch(event, context);
}

/// Used by `log_success!`
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::success(code, message), context);
}

/// Used by `log_info!`
pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::info(message), context);
}

/// Used by `log_warning!`
pub fn log_warning_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::warning(message), context);
}

/// Used by `log_debug!`; the level check happens in the macro
pub fn log_debug_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::debug(message), context);
}

/// Error logging that falls back to stderr when uninitialized
pub fn safe_log_error(code: Code, message: &str) {
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(LogEvent::error(code, message));
    } else {
        eprintln!("[ERROR] FALLBACK: [{}] {}", code.as_str(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_context_management() {
        clear_file_context();
        assert!(FILE_CONTEXT.with(|ctx| ctx.borrow().is_none()));

        set_file_context("prog.sire");
        assert_eq!(
            FILE_CONTEXT.with(|ctx| ctx.borrow().clone()),
            Some("prog.sire".to_string())
        );

        clear_file_context();
        assert!(FILE_CONTEXT.with(|ctx| ctx.borrow().is_none()));
    }

    #[test]
    fn test_with_file_context() {
        let result = with_file_context("<stdin>", || {
            assert!(FILE_CONTEXT.with(|ctx| ctx.borrow().is_some()));
            42
        });

        assert_eq!(result, 42);
        assert!(FILE_CONTEXT.with(|ctx| ctx.borrow().is_none()));
    }

    #[test]
    fn test_logging_without_initialization_is_silent() {
        log_info_with_context("not initialized", vec![("k", "v")]);
        safe_log_error(codes::system::INTERNAL_ERROR, "Test error");
    }
}
