//! `config get|set|list`: one command with declared subcommands. The
//! metadata and arguments live in a shared blueprint the handlers extend.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use patto_commands::{
    ArgKind, ArgumentDescriptor, ArgumentSet, CommandBlueprint, CommandContext, CommandDefinition,
    CommandHandler, CommandOptions,
};
use patto_core::{CommandCategory, CommandError, CommandResult, Embed, EmbedColor};
use tokio::sync::RwLock;
use tracing::info;

static BLUEPRINT: LazyLock<Arc<CommandBlueprint>> = LazyLock::new(|| {
    Arc::new(
        CommandBlueprint::new()
            .command(
                CommandOptions::new("config", "Manages the bot configuration")
                    .category(CommandCategory::Other)
                    .subcommands(["get", "set", "list"]),
            )
            .arguments(ArgumentSet::new(vec![
                ArgumentDescriptor::new("key", "clave", ArgKind::String)
                    .describe("The configuration key")
                    .required()
                    .only_for(["get", "set"]),
                ArgumentDescriptor::new("value", "valor", ArgKind::String)
                    .describe("The value to store")
                    .required()
                    .only_for(["set"]),
            ])),
    )
});

/// In-memory key/value settings shared by the subcommand handlers.
#[derive(Clone, Default)]
pub struct ConfigStore {
    values: Arc<RwLock<BTreeMap<String, String>>>,
}

impl ConfigStore {
    pub fn seeded() -> Self {
        let values = [("prefix", "!"), ("language", "es"), ("timezone", "UTC")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { values: Arc::new(RwLock::new(values)) }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.values.read().await.get(key).cloned()
    }
}

pub fn definition(store: ConfigStore) -> CommandDefinition {
    CommandDefinition::new("other/config")
        .extends(Arc::clone(&BLUEPRINT))
        .on_subcommand("get", Get(store.clone()))
        .on_subcommand("set", Set(store.clone()))
        .on_subcommand("list", List(store))
}

fn key_arg(ctx: &CommandContext) -> CommandResult<&str> {
    ctx.args
        .get_str("key")
        .ok_or_else(|| CommandError::internal("`key` missing after resolution"))
}

struct Get(ConfigStore);

#[async_trait]
impl CommandHandler for Get {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        let key = key_arg(ctx)?;
        let value = self
            .0
            .get(key)
            .await
            .ok_or_else(|| CommandError::reply(format!("No configuration key `{key}` exists.")))?;

        let embed = Embed::new(EmbedColor::Success)
            .title("Configuration")
            .field("Key", format!("`{key}`"), true)
            .field("Value", format!("`{value}`"), true);
        ctx.reply(embed).await?;
        Ok(())
    }
}

struct Set(ConfigStore);

#[async_trait]
impl CommandHandler for Set {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        let key = key_arg(ctx)?;
        let value = ctx
            .args
            .get_str("value")
            .ok_or_else(|| CommandError::validation("You must specify a value for the setting."))?;

        self.0.values.write().await.insert(key.to_string(), value.to_string());
        info!(key, user = ctx.user().id, "Configuration updated");

        let embed = Embed::new(EmbedColor::Success)
            .title("Configuration updated")
            .description(format!("`{key}` is now `{value}`"));
        ctx.reply(embed).await?;
        Ok(())
    }
}

struct List(ConfigStore);

#[async_trait]
impl CommandHandler for List {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        let values = self.0.values.read().await;
        let embed = if values.is_empty() {
            Embed::new(EmbedColor::Info)
                .title("Configuration")
                .description("*No settings stored*")
        } else {
            let lines = values
                .iter()
                .map(|(k, v)| format!("**{k}**: `{v}`"))
                .collect::<Vec<_>>()
                .join("\n");
            Embed::new(EmbedColor::Info).title("Bot configuration").description(lines)
        };
        drop(values);
        ctx.reply(embed).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Harness;
    use patto_commands::{ExecutionOutcome, ExecutionStage};
    use patto_core::Presentation;

    fn harness(store: &ConfigStore) -> Harness {
        Harness::new(vec![definition(store.clone())])
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = ConfigStore::seeded();
        let harness = harness(&store);

        let (outcome, embed) = harness.say(r#"!config set greeting "hello there""#).await;
        assert_eq!(outcome, ExecutionOutcome::Completed);
        assert_eq!(embed.description.as_deref(), Some("`greeting` is now `hello there`"));
        assert_eq!(store.get("greeting").await.as_deref(), Some("hello there"));

        let (_, embed) = harness.say("!config GET greeting").await;
        assert_eq!(embed.fields[1].value, "`hello there`");
    }

    #[tokio::test]
    async fn list_needs_no_arguments() {
        let harness = harness(&ConfigStore::seeded());
        let (outcome, embed) = harness.say("!config list").await;
        assert_eq!(outcome, ExecutionOutcome::Completed);
        let text = embed.description.unwrap();
        assert!(text.contains("**language**: `es`"));
        assert!(text.contains("**timezone**: `UTC`"));
    }

    #[tokio::test]
    async fn unknown_key_is_an_operational_error() {
        let harness = harness(&ConfigStore::seeded());
        let (outcome, embed) = harness.say("!config get colour").await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Failed {
                stage: ExecutionStage::HandlerExecuted,
                presentation: Presentation::Operational,
            }
        );
        assert_eq!(embed.title.as_deref(), Some("Error"));
        assert_eq!(embed.description.as_deref(), Some("No configuration key `colour` exists."));
    }

    #[tokio::test]
    async fn set_requires_a_value() {
        let harness = harness(&ConfigStore::seeded());
        let (outcome, embed) = harness.say("!config set language").await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failed { presentation: Presentation::Usage, .. }
        ));
        assert_eq!(embed.description.as_deref(), Some("The argument `valor` is required."));
    }

    #[tokio::test]
    async fn bare_command_lists_subcommands() {
        let harness = harness(&ConfigStore::seeded());
        let (_, embed) = harness.say("!config").await;
        assert_eq!(embed.title.as_deref(), Some("Command `config`"));
        assert!(embed.description.unwrap().contains("`!config list`"));
    }
}
