//! `patto-config`: startup configuration for the bot.
//!
//! Provides:
//! - Environment-driven `BotConfig` with documented defaults
//! - Validation that collects every problem before failing
//! - Log-safe rendering with the token masked

pub mod env;
pub mod redact;
pub mod validation;

pub use env::{BotConfig, DEFAULT_LOG_LEVEL, DEFAULT_PREFIX};
pub use redact::mask_token;
pub use validation::{ConfigError, ConfigValidationError, ValidationReport};

/// Log the masked configuration summary, one line per entry.
pub fn log_summary(config: &BotConfig) {
    for line in config.summary().lines() {
        tracing::info!("{line}");
    }
}
