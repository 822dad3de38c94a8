use std::sync::LazyLock;

use patto_core::ArgValue;
use regex::Regex;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]+)"|'([^']+)'|(\S+)"#).expect("valid token regex")
});
static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid integer regex"));
static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+\.\d+$").expect("valid float regex"));

/// One argument token of a text invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Lexically coerced value. Quoted tokens stay strings.
    pub value: ArgValue,
    /// Token text with surrounding quotes removed.
    pub text: String,
    /// Byte span in the tokenized input, quotes included.
    pub start: usize,
    pub end: usize,
    pub quoted: bool,
}

/// Split `input` into quoted or whitespace-delimited tokens.
///
/// An unterminated quote does not open a span; its text falls back to
/// plain whitespace splitting with the quote character kept.
pub fn tokenize(input: &str) -> Vec<Token> {
    TOKEN_RE
        .captures_iter(input)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (text, quoted) = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(m), _, _) | (_, Some(m), _) => (m.as_str(), true),
                (_, _, Some(m)) => (m.as_str(), false),
                _ => return None,
            };
            let value = if quoted { ArgValue::String(text.to_string()) } else { coerce_lexical(text) };
            Some(Token {
                value,
                text: text.to_string(),
                start: whole.start(),
                end: whole.end(),
                quoted,
            })
        })
        .collect()
}

/// Token values only.
pub fn tokenize_values(input: &str) -> Vec<ArgValue> {
    tokenize(input).into_iter().map(|t| t.value).collect()
}

fn coerce_lexical(text: &str) -> ArgValue {
    if INTEGER_RE.is_match(text) {
        if let Ok(n) = text.parse::<i64>() {
            return ArgValue::Integer(n);
        }
    }
    if FLOAT_RE.is_match(text) {
        if let Ok(n) = text.parse::<f64>() {
            return ArgValue::Float(n);
        }
    }
    ArgValue::String(text.to_string())
}
