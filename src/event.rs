//! Event and log callback system.
//!
//! Layout passes report what they did through two process-wide callbacks.
//! Nothing is printed when no callback is installed.

use std::sync::{Mutex, OnceLock, PoisonError};

/// Log level for diagnostic callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Emitted when a pass truncates text or `trim()` installs an ellipsis.
pub const EVENT_TRIMMED: &str = "layout.trimmed";
/// Emitted when an edit could not be patched into the cached lines.
pub const EVENT_RELAYOUT: &str = "layout.relayout";

type EventCallback = Box<dyn Fn(&str, &str) + Send + Sync + 'static>;
type LogCallback = Box<dyn Fn(LogLevel, &str) + Send + Sync + 'static>;

fn event_callback() -> &'static Mutex<Option<EventCallback>> {
    static CALLBACK: OnceLock<Mutex<Option<EventCallback>>> = OnceLock::new();
    CALLBACK.get_or_init(|| Mutex::new(None))
}

fn log_callback() -> &'static Mutex<Option<LogCallback>> {
    static CALLBACK: OnceLock<Mutex<Option<LogCallback>>> = OnceLock::new();
    CALLBACK.get_or_init(|| Mutex::new(None))
}

/// Set the global event callback.
pub fn set_event_callback<F>(callback: F)
where
    F: Fn(&str, &str) + Send + Sync + 'static,
{
    let mut guard = event_callback()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = Some(Box::new(callback));
}

/// Remove the global event callback.
pub fn clear_event_callback() {
    let mut guard = event_callback()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = None;
}

/// Emit an event to the registered callback.
pub fn emit_event(name: &str, data: &str) {
    if let Ok(guard) = event_callback().lock() {
        if let Some(callback) = guard.as_ref() {
            callback(name, data);
        }
    }
}

/// Set the global log callback.
pub fn set_log_callback<F>(callback: F)
where
    F: Fn(LogLevel, &str) + Send + Sync + 'static,
{
    let mut guard = log_callback()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = Some(Box::new(callback));
}

/// Remove the global log callback.
pub fn clear_log_callback() {
    let mut guard = log_callback()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = None;
}

/// Emit a log message.
pub fn emit_log(level: LogLevel, message: &str) {
    if let Ok(guard) = log_callback().lock() {
        if let Some(callback) = guard.as_ref() {
            callback(level, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both callbacks are process-wide; keep every assertion that installs
    // one inside a single test so parallel tests cannot interleave.
    #[test]
    fn test_callbacks_receive_messages() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let events = Arc::new(AtomicUsize::new(0));
        let events_clone = Arc::clone(&events);
        set_event_callback(move |name, _data| {
            if name == "unit.test" {
                events_clone.fetch_add(1, Ordering::SeqCst);
            }
        });
        emit_event("unit.test", "{}");
        emit_event("other", "{}");
        assert_eq!(events.load(Ordering::SeqCst), 1);

        let logs = Arc::new(AtomicUsize::new(0));
        let logs_clone = Arc::clone(&logs);
        set_log_callback(move |level, msg| {
            if level == LogLevel::Info && msg == "unit hello" {
                logs_clone.fetch_add(1, Ordering::SeqCst);
            }
        });
        emit_log(LogLevel::Info, "unit hello");
        assert_eq!(logs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_log_levels_ordered() {
        assert!(LogLevel::Debug < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }
}
