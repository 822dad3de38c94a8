//! Primitive coercion and mention parsing used by the argument resolver.
use std::sync::LazyLock;

use patto_core::{ArgValue, Snowflake};
use regex::Regex;

use crate::types::ArgKind;

static AFFIRMATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:yes|s[ií])$").expect("valid affirmative regex"));
static USER_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@!?(\d+)>$").expect("valid user mention regex"));
static ROLE_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@&(\d+)>$").expect("valid role mention regex"));
static CHANNEL_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<#(\d+)>$").expect("valid channel mention regex"));
static BARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid id regex"));

/// Affirmative words or `true`/`t`/`1`; everything else is false.
pub fn coerce_boolean(raw: &ArgValue) -> bool {
    if let ArgValue::Bool(b) = raw {
        return *b;
    }
    let text = raw.to_string();
    let text = text.trim();
    if AFFIRMATIVE_RE.is_match(text) {
        return true;
    }
    matches!(text.to_lowercase().as_str(), "true" | "t" | "1")
}

/// Integer or finite float; `None` when the value is not numeric.
pub fn coerce_number(raw: &ArgValue) -> Option<ArgValue> {
    match raw {
        ArgValue::Integer(_) | ArgValue::Float(_) => Some(raw.clone()),
        ArgValue::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(n) = s.parse::<i64>() {
                return Some(ArgValue::Integer(n));
            }
            s.parse::<f64>().ok().filter(|n| n.is_finite()).map(ArgValue::Float)
        }
        _ => None,
    }
}

/// Comma-separated list, trimmed, empties dropped.
pub fn coerce_array(raw: &ArgValue) -> Option<ArgValue> {
    match raw {
        ArgValue::List(_) => Some(raw.clone()),
        ArgValue::String(s) => Some(ArgValue::List(
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        _ => None,
    }
}

/// Coerce a raw value into a primitive kind.
///
/// Returns `None` when the raw value cannot represent the kind, or the
/// kind is not primitive.
pub fn coerce_primitive(raw: &ArgValue, kind: &ArgKind) -> Option<ArgValue> {
    match kind {
        ArgKind::String => Some(match raw {
            ArgValue::String(_) => raw.clone(),
            other => ArgValue::String(other.to_string()),
        }),
        ArgKind::Number => coerce_number(raw),
        ArgKind::Boolean => Some(ArgValue::Bool(coerce_boolean(raw))),
        ArgKind::Array => coerce_array(raw),
        _ => None,
    }
}

/// Extract the id from a mention of `kind`, or from a bare numeric id.
pub fn parse_mention(raw: &str, kind: &ArgKind) -> Option<Snowflake> {
    let raw = raw.trim();
    let re = match kind {
        ArgKind::User | ArgKind::Member => &USER_MENTION_RE,
        ArgKind::Role => &ROLE_MENTION_RE,
        ArgKind::Channel => &CHANNEL_MENTION_RE,
        _ => return None,
    };
    let digits = match re.captures(raw) {
        Some(caps) => caps.get(1)?.as_str(),
        None if BARE_ID_RE.is_match(raw) => raw,
        None => return None,
    };
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_words_are_true() {
        for word in ["yes", "YES", "si", "sí", "true", "T", "1"] {
            assert!(coerce_boolean(&ArgValue::from(word)), "{word}");
        }
        assert!(coerce_boolean(&ArgValue::Integer(1)));
    }

    #[test]
    fn other_words_are_false() {
        for word in ["no", "false", "0", "yep", ""] {
            assert!(!coerce_boolean(&ArgValue::from(word)), "{word}");
        }
    }

    #[test]
    fn numbers_parse_from_strings() {
        assert_eq!(coerce_number(&ArgValue::from(" 12 ")), Some(ArgValue::Integer(12)));
        assert_eq!(coerce_number(&ArgValue::from("1.25")), Some(ArgValue::Float(1.25)));
        assert_eq!(coerce_number(&ArgValue::from("abc")), None);
        assert_eq!(coerce_number(&ArgValue::from("")), None);
        assert_eq!(coerce_number(&ArgValue::from("inf")), None);
    }

    #[test]
    fn arrays_split_on_commas() {
        let list = coerce_array(&ArgValue::from("a, b,,c ,")).unwrap();
        assert_eq!(list, ArgValue::List(vec!["a".into(), "b".into(), "c".into()]));
    }

    #[test]
    fn strings_render_numbers() {
        let value = coerce_primitive(&ArgValue::Integer(5), &ArgKind::String).unwrap();
        assert_eq!(value, ArgValue::from("5"));
    }

    #[test]
    fn mentions_and_bare_ids() {
        assert_eq!(parse_mention("<@123>", &ArgKind::User), Some(123));
        assert_eq!(parse_mention("<@!123>", &ArgKind::Member), Some(123));
        assert_eq!(parse_mention("<@&77>", &ArgKind::Role), Some(77));
        assert_eq!(parse_mention("<#9>", &ArgKind::Channel), Some(9));
        assert_eq!(parse_mention("555", &ArgKind::Channel), Some(555));
        assert_eq!(parse_mention("<@&77>", &ArgKind::User), None);
        assert_eq!(parse_mention("bob", &ArgKind::User), None);
    }
}
