//! Subcommand routing for base commands that declare subcommands.
use crate::tokenizer::Token;

/// Derive the handler key for a subcommand id.
///
/// `"get"` → `subcommandGet`, `"alpha first"` → `subcommandAlphaFirst`,
/// `"get-all"` → `subcommandGetAll`.
pub fn method_name(id: &str) -> String {
    let mut name = String::from("subcommand");
    for part in id.split([' ', '-']).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(&chars.as_str().to_lowercase());
        }
    }
    name
}

/// Outcome of matching invocation input against declared subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubcommandRoute {
    /// The command declares no subcommands; its run handler applies.
    NotApplicable,
    /// `consumed` leading text tokens named the subcommand.
    Matched { id: String, consumed: usize },
    /// Subcommands are declared but none was given.
    Missing,
    /// The given name matches no declared subcommand.
    Unmatched { given: String },
}

impl SubcommandRoute {
    pub fn subcommand(&self) -> Option<&str> {
        match self {
            SubcommandRoute::Matched { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn consumed(&self) -> usize {
        match self {
            SubcommandRoute::Matched { consumed, .. } => *consumed,
            _ => 0,
        }
    }
}

/// Match leading text tokens; a two-token id wins over a one-token id.
pub fn route_text(declared: &[String], tokens: &[Token]) -> SubcommandRoute {
    if declared.is_empty() {
        return SubcommandRoute::NotApplicable;
    }
    let Some(first) = tokens.first() else {
        return SubcommandRoute::Missing;
    };
    if let Some(second) = tokens.get(1) {
        let pair = format!("{} {}", first.text, second.text);
        if let Some(id) = find_declared(declared, &pair) {
            return SubcommandRoute::Matched { id, consumed: 2 };
        }
    }
    match find_declared(declared, &first.text) {
        Some(id) => SubcommandRoute::Matched { id, consumed: 1 },
        None => SubcommandRoute::Unmatched { given: first.text.clone() },
    }
}

/// Match the group and subcommand names supplied with a structured invocation.
pub fn route_structured(
    declared: &[String],
    group: Option<&str>,
    subcommand: Option<&str>,
) -> SubcommandRoute {
    if declared.is_empty() {
        return SubcommandRoute::NotApplicable;
    }
    let given = match (group, subcommand) {
        (Some(g), Some(s)) => format!("{g} {s}"),
        (None, Some(s)) => s.to_string(),
        (Some(g), None) => g.to_string(),
        (None, None) => return SubcommandRoute::Missing,
    };
    match find_declared(declared, &given) {
        Some(id) => SubcommandRoute::Matched { id, consumed: 0 },
        None => SubcommandRoute::Unmatched { given },
    }
}

fn find_declared(declared: &[String], candidate: &str) -> Option<String> {
    declared.iter().find(|d| d.eq_ignore_ascii_case(candidate)).cloned()
}
