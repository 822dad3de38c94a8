//! Config validation: every problem is collected so startup reports them together.

use thiserror::Error;

/// A single problem with one environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{var}: {message}")]
pub struct ConfigValidationError {
    pub var: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn error(&mut self, var: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            var: var.into(),
            message: message.into(),
        });
    }

    pub(crate) fn warn(&mut self, var: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            var: var.into(),
            message: message.into(),
        });
    }

    /// Fail with every collected error, or succeed if there were none.
    pub fn into_result(self) -> Result<Vec<ConfigValidationError>, ConfigError> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(ConfigError::Invalid {
                errors: self.errors.iter().map(ToString::to_string).collect(),
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration:\n  {}", errors.join("\n  "))]
    Invalid { errors: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_alone_are_valid() {
        let mut report = ValidationReport::default();
        report.warn("INTENTS", "not a number");
        let warnings = report.into_result().unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn errors_are_listed_together() {
        let mut report = ValidationReport::default();
        report.error("BOT_TOKEN", "required");
        report.error("CLIENT_ID", "required");
        let err = report.into_result().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("BOT_TOKEN: required"));
        assert!(text.contains("CLIENT_ID: required"));
        let ConfigError::Invalid { errors } = err;
        assert_eq!(errors.len(), 2);
    }
}
