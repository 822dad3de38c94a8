//! Three-level commands under `server`: `server config get|set`, `server user info`.
//! No base `server` command exists, so the schema builder publishes a
//! container for them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use patto_commands::{
    ArgKind, ArgumentDescriptor, ArgumentSet, CommandContext, CommandDefinition, CommandHandler,
    SubcommandGroupOptions,
};
use patto_core::{
    ArgValue, CommandCategory, CommandError, CommandResult, Embed, EmbedColor, Permissions,
    Snowflake,
};
use tokio::sync::RwLock;

use super::user::{target_user, user_info_embed};

const MAX_VALUE_LEN: usize = 100;

type Settings = Arc<RwLock<HashMap<(Snowflake, String), String>>>;

pub fn definitions() -> Vec<CommandDefinition> {
    let settings = Settings::default();
    vec![
        CommandDefinition::new("server/config/get")
            .group(
                SubcommandGroupOptions::new("server", "config", "get", "Reads a server setting")
                    .category(CommandCategory::Other),
            )
            .arguments(ArgumentSet::new(vec![key_argument()]))
            .run(ConfigGet(settings.clone())),
        CommandDefinition::new("server/config/set")
            .group(
                SubcommandGroupOptions::new("server", "config", "set", "Changes a server setting")
                    .category(CommandCategory::Other),
            )
            .permissions(Permissions::MANAGE_GUILD)
            .arguments(ArgumentSet::new(vec![
                key_argument(),
                ArgumentDescriptor::new("value", "valor", ArgKind::String)
                    .describe("The value to store")
                    .required()
                    .raw_text()
                    .validate(|value| match value {
                        ArgValue::String(s) if s.chars().count() > MAX_VALUE_LEN => Err(Some(
                            format!("Values are limited to {MAX_VALUE_LEN} characters."),
                        )),
                        _ => Ok(()),
                    }),
            ]))
            .run(ConfigSet(settings)),
        CommandDefinition::new("server/user/info")
            .group(
                SubcommandGroupOptions::new("server", "user", "info", "Shows a member's information")
                    .category(CommandCategory::Info),
            )
            .arguments(ArgumentSet::new(vec![
                ArgumentDescriptor::new("target", "usuario", ArgKind::User)
                    .describe("The member to show information about"),
            ]))
            .run(UserInfo),
    ]
}

fn key_argument() -> ArgumentDescriptor {
    ArgumentDescriptor::new("key", "clave", ArgKind::String)
        .describe("The setting to use")
        .required()
        .choice("Language", "language")
        .choice("Timezone", "timezone")
        .choice("Welcome message", "welcome")
}

fn guild_of(ctx: &CommandContext) -> CommandResult<Snowflake> {
    ctx.invoker
        .guild_id
        .ok_or_else(|| CommandError::reply("This command can only be used in a server."))
}

fn key_arg(ctx: &CommandContext) -> CommandResult<String> {
    ctx.args
        .get_str("key")
        .map(str::to_string)
        .ok_or_else(|| CommandError::internal("`key` missing after resolution"))
}

struct ConfigGet(Settings);

#[async_trait]
impl CommandHandler for ConfigGet {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        let guild = guild_of(ctx)?;
        let key = key_arg(ctx)?;
        let value = self.0.read().await.get(&(guild, key.clone())).cloned();

        let description = match value {
            Some(value) => format!("The server setting `{key}` is `{value}`"),
            None => format!("The server setting `{key}` is not set"),
        };
        ctx.reply(Embed::new(EmbedColor::Info).title("Server configuration").description(description))
            .await?;
        Ok(())
    }
}

struct ConfigSet(Settings);

#[async_trait]
impl CommandHandler for ConfigSet {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        let guild = guild_of(ctx)?;
        let key = key_arg(ctx)?;
        let value = ctx.args.get_str("value").unwrap_or_default().to_string();

        self.0.write().await.insert((guild, key.clone()), value.clone());
        let embed = Embed::new(EmbedColor::Success)
            .title("Server configuration updated")
            .description(format!("`{key}` is now `{value}`"));
        ctx.reply(embed).await?;
        Ok(())
    }
}

struct UserInfo;

#[async_trait]
impl CommandHandler for UserInfo {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        ctx.reply(user_info_embed(target_user(ctx))).await?;
        Ok(())
    }
}
