//! Observability subsystem for examdex
//!
//! - Structured logging (JSON lines on stderr)
//! - Counter metrics
//! - Typed lifecycle events
//!
//! Observability is read-only: nothing here changes query results, and a
//! failed log write is ignored.
//!
//! # Usage
//!
//! ```ignore
//! use examdex::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::QueryExecuted, &[("total", "12")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_queries_executed();
//! ```

mod events;
mod logger;
mod metrics;
mod timer;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use timer::Timer;

/// Log a lifecycle event. Failures are written at ERROR and degraded-service
/// events at WARN.
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else if event.is_degraded() {
        Severity::Warn
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Log a lifecycle event at TRACE
pub fn trace_event(event: Event, fields: &[(&str, &str)]) {
    Logger::trace(event.as_str(), fields);
}
