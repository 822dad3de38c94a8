//! Log Redaction Layer
//!
//! Scrubs bot tokens and bearer credentials from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static BOT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_-]{23,28}\.[A-Za-z0-9_-]{6,7}\.[A-Za-z0-9_-]{27,}").unwrap()
});
static BEARER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Bearer|Bot)\s+[a-zA-Z0-9\-\._~+/]{16,}=*").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "$1 [REDACTED_TOKEN]");
    BOT_TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_bot_tokens() {
        let token = "MTA5ODc2NTQzMjEwOTg3NjU0Mw.GaBcDe.abcdefghijklmnopqrstuvwxyz012345";
        let clean = redact_sensitive_data(&format!("login failed for {token}"));
        assert!(!clean.contains(token));
        assert!(clean.contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn redacts_authorization_headers() {
        let clean = redact_sensitive_data("Authorization: Bot abc.def-ghi.jkl-mno");
        assert_eq!(clean, "Authorization: Bot [REDACTED_TOKEN]");
        let clean = redact_sensitive_data("Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9");
        assert_eq!(clean, "Bearer [REDACTED_TOKEN]");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(redact_sensitive_data("!config set prefix ?"), "!config set prefix ?");
        assert_eq!(redact_sensitive_data("Bot replied to you"), "Bot replied to you");
    }
}
