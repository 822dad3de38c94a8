//! Line-oriented console session.
//!
//! - `/name [group] [sub] [option=value ...]` sends a structured invocation;
//!   quote the whole pair for spaces, as in `"option=two words"`
//! - `:click <custom_id> [value ...]` presses a component
//! - `:as <username>` switches the acting user
//! - `:schema`, `:components`, `:quit`
//! - anything else is a chat message

use anyhow::Result;
use patto_commands::{tokenize, StructuredInput};
use patto_components::{ComponentInteraction, ComponentKind};
use patto_core::{ArgValue, Invoker, UserRef};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::app::App;
use crate::platform::{ConsoleResponder, CONSOLE_CHANNEL, CONSOLE_GUILD};
use crate::router::{IncomingMessage, Interaction, Routed};
use crate::terminal_output::{note_error, note_info, render_table, Column};

#[derive(Debug, Clone, PartialEq)]
pub enum ReplLine {
    Empty,
    Quit,
    Schema,
    Components,
    SwitchUser(String),
    Click { custom_id: String, values: Vec<String> },
    Structured { path: Vec<String>, options: Vec<(String, String)> },
    Message(String),
}

pub fn parse_line(line: &str) -> ReplLine {
    let line = line.trim();
    if line.is_empty() {
        return ReplLine::Empty;
    }

    if let Some(directive) = line.strip_prefix(':') {
        let mut words = directive.split_whitespace();
        return match words.next().unwrap_or_default() {
            "quit" | "q" | "exit" => ReplLine::Quit,
            "schema" => ReplLine::Schema,
            "components" => ReplLine::Components,
            "as" => match words.next() {
                Some(name) => ReplLine::SwitchUser(name.to_string()),
                None => ReplLine::Message(line.to_string()),
            },
            "click" => match words.next() {
                Some(id) => ReplLine::Click {
                    custom_id: id.to_string(),
                    values: words.map(str::to_string).collect(),
                },
                None => ReplLine::Message(line.to_string()),
            },
            _ => ReplLine::Message(line.to_string()),
        };
    }

    if let Some(rest) = line.strip_prefix('/') {
        let mut path = Vec::new();
        let mut options = Vec::new();
        for token in tokenize(rest) {
            match token.text.split_once('=') {
                Some((name, value)) => options.push((name.to_lowercase(), value.to_string())),
                None if !token.quoted && options.is_empty() && path.len() < 3 => {
                    path.push(token.text.to_lowercase())
                }
                None => {}
            }
        }
        if !path.is_empty() {
            return ReplLine::Structured { path, options };
        }
    }

    ReplLine::Message(line.to_string())
}

/// Build the structured input, typing mention values through the platform.
async fn structured_input(app: &App, path: &[String], options: &[(String, String)]) -> StructuredInput {
    let mut input = StructuredInput::new(&path[0]);
    match path.len() {
        2 => input = input.subcommand(&path[1]),
        3 => input = input.group(&path[1]).subcommand(&path[2]),
        _ => {}
    }
    for (name, raw) in options {
        input = input.option(name, option_value(app, raw).await);
    }
    input
}

/// Mentions become platform entities, like a real client would send them;
/// everything else stays text for the resolver to coerce.
async fn option_value(app: &App, raw: &str) -> ArgValue {
    use patto_commands::Platform;

    let platform = app.platform.as_ref();
    let inner = raw.strip_prefix('<').and_then(|r| r.strip_suffix('>'));
    let resolved = match inner {
        Some(role) if role.starts_with("@&") => match role[2..].parse() {
            Ok(id) => platform.fetch_role(CONSOLE_GUILD, id).await.ok().flatten().map(ArgValue::Role),
            Err(_) => None,
        },
        Some(user) if user.starts_with('@') => match user[1..].trim_start_matches('!').parse() {
            Ok(id) => platform.fetch_user(id).await.ok().flatten().map(ArgValue::User),
            Err(_) => None,
        },
        Some(channel) if channel.starts_with('#') => match channel[1..].parse() {
            Ok(id) => platform.fetch_channel(id).await.ok().flatten().map(ArgValue::Channel),
            Err(_) => None,
        },
        _ => None,
    };
    resolved.unwrap_or_else(|| ArgValue::String(raw.to_string()))
}

pub async fn run(app: &App) -> Result<()> {
    let mut current = match app.platform.find_user("owner") {
        Some(user) => user.clone(),
        None => anyhow::bail!("console platform has no `owner` user"),
    };
    note_info(&format!(
        "Acting as `{}`. Type `:quit` to exit, `:as <user>` to switch.",
        current.username
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            ReplLine::Empty => {}
            ReplLine::Quit => break,
            ReplLine::Schema => {
                let published = app.platform.published();
                println!("{}", serde_json::to_string_pretty(&published)?);
            }
            ReplLine::Components => {
                let stats = app.components.stats().await;
                let rows = vec![
                    vec!["buttons".to_string(), stats.buttons.to_string()],
                    vec!["selects".to_string(), stats.selects.to_string()],
                    vec!["modals".to_string(), stats.modals.to_string()],
                    vec!["total".to_string(), stats.total.to_string()],
                ];
                print!("{}", render_table(&[Column::left("Kind"), Column::right("Live")], &rows));
            }
            ReplLine::SwitchUser(name) => match app.platform.find_user(&name) {
                Some(user) => {
                    current = user.clone();
                    note_info(&format!("Now acting as `{}`", current.username));
                }
                None => note_error(&format!("No user named `{name}`")),
            },
            ReplLine::Click { custom_id, values } => {
                let Some(kind) = ComponentKind::from_custom_id(&custom_id) else {
                    note_error(&format!("`{custom_id}` is not a component id"));
                    continue;
                };
                let interaction = ComponentInteraction::new(custom_id, current.clone(), CONSOLE_CHANNEL).values(values);
                let routed = app
                    .router
                    .on_interaction(Interaction::Component { kind, interaction }, ConsoleResponder::shared())
                    .await;
                report(&routed);
            }
            ReplLine::Structured { path, options } => {
                let input = structured_input(app, &path, &options).await;
                let invoker = invoker_for(app, &current);
                let routed = app
                    .router
                    .on_interaction(Interaction::Command { input, invoker }, ConsoleResponder::shared())
                    .await;
                report(&routed);
            }
            ReplLine::Message(content) => {
                let message = IncomingMessage {
                    member: Some(app.platform.member_of(&current)),
                    author: current.clone(),
                    channel_id: CONSOLE_CHANNEL,
                    content,
                };
                let routed = app.router.on_message(message, ConsoleResponder::shared()).await;
                report(&routed);
            }
        }
    }
    Ok(())
}

fn invoker_for(app: &App, user: &UserRef) -> Invoker {
    Invoker::in_guild(app.platform.member_of(user), CONSOLE_CHANNEL)
}

fn report(routed: &Routed) {
    debug!(?routed, "Event routed");
    if *routed == Routed::Ignored {
        note_info("(ignored)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn options_map(options: &[(String, String)]) -> HashMap<&str, &str> {
        options.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn parses_directives() {
        assert_eq!(parse_line("  "), ReplLine::Empty);
        assert_eq!(parse_line(":quit"), ReplLine::Quit);
        assert_eq!(parse_line(":as guest"), ReplLine::SwitchUser("guest".into()));
        assert_eq!(
            parse_line(":click sel_abcdefghij info other"),
            ReplLine::Click { custom_id: "sel_abcdefghij".into(), values: vec!["info".into(), "other".into()] }
        );
        assert_eq!(parse_line(":unknown"), ReplLine::Message(":unknown".into()));
    }

    #[test]
    fn parses_structured_invocations() {
        let ReplLine::Structured { path, options } =
            parse_line(r#"/Server config set clave=welcome "valor=hi there""#)
        else {
            panic!("expected a structured line");
        };
        assert_eq!(path, vec!["server", "config", "set"]);
        let options = options_map(&options);
        assert_eq!(options["clave"], "welcome");
        assert_eq!(options["valor"], "hi there");
    }

    #[test]
    fn quoting_follows_the_command_tokenizer() {
        let ReplLine::Structured { path, options } = parse_line(r#"/say 'loud words' "text=a b" c=d"#) else {
            panic!("expected a structured line");
        };
        assert_eq!(path, vec!["say"]);
        assert_eq!(options, vec![
            ("text".to_string(), "a b".to_string()),
            ("c".to_string(), "d".to_string()),
        ]);
    }

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse_line("!ping"), ReplLine::Message("!ping".into()));
        assert_eq!(parse_line("/"), ReplLine::Message("/".into()));
    }
}
