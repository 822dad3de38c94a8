//! Structured logging for the patto bot.
//!
//! Subscriber setup (console plus rolling NDJSON files), secret redaction,
//! and command lifecycle events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{CommandEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
