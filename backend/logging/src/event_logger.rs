//! Command Event Logger
//!
//! Structured command lifecycle events written through `tracing` on the
//! `command_events` target, which the JSON file layer turns into NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandEvent {
    Started {
        command: String,
        args: String,
    },
    Executed {
        command: String,
        duration_ms: u64,
    },
    Rejected {
        command: String,
        reason: String,
    },
    Cancelled {
        command: String,
        plugin: String,
    },
    Failed {
        command: String,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub user_id: u64,
    pub guild_id: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub event: CommandEvent,
}

impl EventLogEntry {
    /// Timestamped entry with free-text fields redacted.
    pub fn new(user_id: u64, guild_id: Option<u64>, mut event: CommandEvent) -> Self {
        match &mut event {
            CommandEvent::Started { args, .. } => *args = redact_sensitive_data(args),
            CommandEvent::Rejected { reason, .. } => *reason = redact_sensitive_data(reason),
            CommandEvent::Failed { error_msg, .. } => *error_msg = redact_sensitive_data(error_msg),
            CommandEvent::Executed { .. } | CommandEvent::Cancelled { .. } => {}
        }
        Self { user_id, guild_id, timestamp: Utc::now(), event }
    }
}

pub struct EventLogger;

impl EventLogger {
    pub fn log_event(user_id: u64, guild_id: Option<u64>, event: CommandEvent) {
        let entry = EventLogEntry::new(user_id, guild_id, event);
        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "command_events", event = %json, "Command event"),
            Err(_) => info!(target: "command_events", event = ?entry, "Command event"),
        }
    }
}
