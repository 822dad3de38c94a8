use thiserror::Error;

/// Per-invocation error taxonomy.
///
/// Each variant maps to exactly one user-visible presentation style:
/// `Validation` renders as a usage error, `Reply` is shown verbatim as an
/// operational error, and `Internal` is logged while the user only sees a
/// generic apology.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Missing/invalid argument, unmatched subcommand, bad choice value.
    #[error("{0}")]
    Validation(String),

    /// A deliberate, user-facing failure raised by a handler or plugin.
    #[error("{0}")]
    Reply(String),

    /// Anything unexpected. Never shown to the end user.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CommandError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn reply(message: impl Into<String>) -> Self {
        Self::Reply(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(message.into()))
    }

    pub fn presentation(&self) -> Presentation {
        match self {
            Self::Validation(_) => Presentation::Usage,
            Self::Reply(_) | Self::Internal(_) => Presentation::Operational,
        }
    }
}

/// How an outcome is surfaced to the invoking user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Usage,
    Operational,
    None,
}

pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_has_one_presentation() {
        assert_eq!(CommandError::validation("x").presentation(), Presentation::Usage);
        assert_eq!(CommandError::reply("x").presentation(), Presentation::Operational);
        assert_eq!(CommandError::internal("x").presentation(), Presentation::Operational);
    }

    #[test]
    fn anyhow_converts_to_internal() {
        let err: CommandError = anyhow::anyhow!("db down").into();
        assert!(matches!(err, CommandError::Internal(_)));
        assert_eq!(err.to_string(), "db down");
    }
}
