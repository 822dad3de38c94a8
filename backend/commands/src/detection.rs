//! Command detection: find the registered command a message or a
//! structured invocation refers to.
//!
//! Both paths skip entries shadowed by a declared subcommand, so the
//! handler that runs is the one the published schema describes.
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::context::{StructuredInput, TextInput};
use crate::registry::CommandRegistry;
use crate::types::CommandEntry;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("valid word regex"));

/// Detect a prefixed command at the start of a message.
///
/// The longest registered, unshadowed name wins: three words, then two,
/// then one (aliases apply at any length). Returns `None` for normal messages.
pub fn detect_command(
    content: &str,
    prefix: &str,
    registry: &CommandRegistry,
) -> Option<(Arc<CommandEntry>, TextInput)> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    let words: Vec<regex::Match<'_>> = WORD_RE.find_iter(rest).take(3).collect();

    for len in (1..=words.len()).rev() {
        let name = words[..len].iter().map(|m| m.as_str()).collect::<Vec<_>>().join(" ");
        if let Some(entry) = registry.get(&name).filter(|e| !registry.is_shadowed(e)) {
            let body = rest[words[len - 1].end()..].trim().to_string();
            return Some((entry, TextInput { content: content.to_string(), body }));
        }
    }
    None
}

/// Resolve a structured invocation: a nested entry registered under the
/// full path wins, otherwise the base command routes to its subcommands.
///
/// Returns the entry and whether the group/subcommand names were consumed
/// by the lookup itself.
pub fn detect_structured(
    input: &StructuredInput,
    registry: &CommandRegistry,
) -> Option<(Arc<CommandEntry>, bool)> {
    let mut path = vec![input.command.as_str()];
    path.extend(input.group.as_deref());
    path.extend(input.subcommand.as_deref());

    if path.len() > 1 {
        if let Some(entry) = registry.get(&path.join(" ")).filter(|e| !registry.is_shadowed(e)) {
            return Some((entry, true));
        }
    }
    registry.get(&input.command).map(|entry| (entry, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::NoopHandler;
    use crate::types::{CommandDefinition, CommandOptions, SubcommandGroupOptions, SubcommandOptions};

    #[test]
    fn shadowed_entries_fall_back_to_the_declaring_command() {
        let registry = CommandRegistry::load(vec![
            CommandDefinition::new("other/config")
                .command(CommandOptions::new("config", "Config").subcommands(["get"]))
                .on_subcommand("get", NoopHandler),
            CommandDefinition::new("other/config-get")
                .subcommand(SubcommandOptions::new("config", "get", "Shadow"))
                .run(NoopHandler),
        ])
        .unwrap();

        let (entry, input) = detect_command("!config get color", "!", &registry).unwrap();
        assert_eq!(entry.key, "config");
        assert_eq!(input.body, "get color");

        let input = StructuredInput::new("config").subcommand("get");
        let (entry, consumed) = detect_structured(&input, &registry).unwrap();
        assert_eq!(entry.key, "config");
        assert!(!consumed);
    }

    fn registry() -> CommandRegistry {
        CommandRegistry::load(vec![
            CommandDefinition::new("info/ping")
                .command(CommandOptions::new("ping", "Ping").aliases(["pong"]))
                .run(NoopHandler),
            CommandDefinition::new("user/info")
                .subcommand(SubcommandOptions::new("user", "info", "Info"))
                .run(NoopHandler),
            CommandDefinition::new("server/config-set")
                .group(SubcommandGroupOptions::new("server", "config", "set", "Set"))
                .run(NoopHandler),
        ])
        .unwrap()
    }

    #[test]
    fn longest_name_wins() {
        let registry = registry();
        let (entry, input) = detect_command("!server config set color blue", "!", &registry).unwrap();
        assert_eq!(entry.key, "server-config-set");
        assert_eq!(input.body, "color blue");

        let (entry, input) = detect_command("!User Info <@1>", "!", &registry).unwrap();
        assert_eq!(entry.key, "user-info");
        assert_eq!(input.body, "<@1>");
    }

    #[test]
    fn aliases_and_plain_messages() {
        let registry = registry();
        let (entry, input) = detect_command("!pong", "!", &registry).unwrap();
        assert_eq!(entry.key, "ping");
        assert_eq!(input.body, "");
        assert!(detect_command("hello there", "!", &registry).is_none());
        assert!(detect_command("!unknown", "!", &registry).is_none());
        assert!(detect_command("!", "!", &registry).is_none());
    }

    #[test]
    fn structured_prefers_nested_entry() {
        let registry = registry();
        let input = StructuredInput::new("server").group("config").subcommand("set");
        let (entry, consumed) = detect_structured(&input, &registry).unwrap();
        assert_eq!(entry.key, "server-config-set");
        assert!(consumed);

        let (entry, consumed) = detect_structured(&StructuredInput::new("ping"), &registry).unwrap();
        assert_eq!(entry.key, "ping");
        assert!(!consumed);
    }
}
