//! Environment-driven bot configuration.
//!
//! | var | rule |
//! |---|---|
//! | `BOT_TOKEN` | required, non-blank |
//! | `CLIENT_ID` | required, non-blank |
//! | `USE_MESSAGE_CONTENT` | `true` (any case) enables the text surface |
//! | `COMMAND_PREFIX` | default `!`; set to whitespace only is an error |
//! | `INTENTS` | optional integer; anything else warns and falls back to automatic |
//! | `LOG_LEVEL` | default `info` |
//! | `LOG_DIR` | optional; enables the JSON log file |

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::redact::mask_token;
use crate::validation::{ConfigError, ValidationReport};

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    #[serde(skip_serializing)]
    pub token: String,
    pub client_id: String,
    pub use_message_content: bool,
    pub prefix: String,
    /// `None` means automatic intents.
    pub intents: Option<u64>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(&std::env::vars().collect())
    }

    /// Build from an explicit variable map (useful for testing).
    pub fn from_env_map(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut report = ValidationReport::default();

        let token = required(env, "BOT_TOKEN", &mut report);
        let client_id = required(env, "CLIENT_ID", &mut report);
        let use_message_content = env
            .get("USE_MESSAGE_CONTENT")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        let prefix = parse_prefix(env.get("COMMAND_PREFIX"), &mut report);
        let intents = parse_intents(env.get("INTENTS"), &mut report);
        let log_level = env
            .get("LOG_LEVEL")
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string();
        let log_dir = env
            .get("LOG_DIR")
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        for warning in report.into_result()? {
            warn!(var = %warning.var, message = %warning.message, "Config warning");
        }

        Ok(Self {
            token,
            client_id,
            use_message_content,
            prefix,
            intents,
            log_level,
            log_dir,
        })
    }

    /// Multi-line view of the config that is safe to log.
    pub fn summary(&self) -> String {
        let mut out = String::from("Configuration loaded:\n");
        let _ = writeln!(out, "  BOT_TOKEN: {}", mask_token(&self.token));
        let _ = writeln!(out, "  CLIENT_ID: {}", self.client_id);
        let _ = writeln!(out, "  USE_MESSAGE_CONTENT: {}", self.use_message_content);
        let _ = writeln!(out, "  COMMAND_PREFIX: \"{}\"", self.prefix);
        match self.intents {
            Some(bits) => {
                let _ = writeln!(out, "  INTENTS: {bits} (custom)");
            }
            None => out.push_str("  INTENTS: automatic\n"),
        }
        let _ = write!(out, "  LOG_LEVEL: {}", self.log_level);
        out
    }

    /// Whether prefixed text commands should be handled.
    pub fn text_commands_enabled(&self) -> bool {
        self.use_message_content
    }
}

fn required(env: &HashMap<String, String>, var: &str, report: &mut ValidationReport) -> String {
    match env.get(var).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => {
            report.error(var, "required variable is missing or empty");
            String::new()
        }
    }
}

fn parse_prefix(value: Option<&String>, report: &mut ValidationReport) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return DEFAULT_PREFIX.to_string();
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        report.error("COMMAND_PREFIX", "cannot be blank; use a visible prefix such as `!`");
        return DEFAULT_PREFIX.to_string();
    }
    trimmed.to_string()
}

fn parse_intents(value: Option<&String>, report: &mut ValidationReport) -> Option<u64> {
    let value = value.map(|v| v.trim()).filter(|v| !v.is_empty())?;
    match value.parse::<u64>() {
        Ok(bits) => Some(bits),
        Err(_) => {
            report.warn(
                "INTENTS",
                format!("'{value}' is not a valid number; automatic intents will be used"),
            );
            None
        }
    }
}
