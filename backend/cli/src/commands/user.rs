//! Two-word commands about users: `user info`, `user avatar`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patto_commands::{
    ArgKind, ArgumentDescriptor, ArgumentSet, CommandContext, CommandDefinition, CommandHandler,
    CommandOptions,
};
use patto_core::{CommandCategory, CommandResult, Embed, EmbedColor, Snowflake, UserRef};

/// Milliseconds between the Unix epoch and the first snowflake.
const SNOWFLAKE_EPOCH_MS: i64 = 1_420_070_400_000;

pub fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("user/info")
            .command(
                CommandOptions::new("user info", "Shows detailed information about a user")
                    .category(CommandCategory::Info),
            )
            .arguments(target_argument("The user to show information about"))
            .run(UserInfo),
        CommandDefinition::new("user/avatar")
            .command(
                CommandOptions::new("user avatar", "Shows a user's avatar")
                    .category(CommandCategory::Info),
            )
            .arguments(target_argument("The user whose avatar to show"))
            .run(UserAvatar),
    ]
}

fn target_argument(description: &str) -> ArgumentSet {
    ArgumentSet::new(vec![
        ArgumentDescriptor::new("target", "usuario", ArgKind::User).describe(description)
    ])
}

/// The mentioned user, or the invoker when none was given.
pub(crate) fn target_user(ctx: &CommandContext) -> &UserRef {
    ctx.args.get_user("target").unwrap_or_else(|| ctx.user())
}

/// Creation time encoded in a snowflake id.
pub fn created_at(id: Snowflake) -> Option<DateTime<Utc>> {
    let ms = i64::try_from(id >> 22).ok()? + SNOWFLAKE_EPOCH_MS;
    DateTime::from_timestamp_millis(ms)
}

pub(crate) fn user_info_embed(user: &UserRef) -> Embed {
    let created = created_at(user.id)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".into());

    Embed::new(EmbedColor::Info)
        .title(format!("About {}", user.username))
        .field("ID", user.id.to_string(), true)
        .field("Username", &user.username, true)
        .field(
            "Global name",
            user.global_name.as_deref().unwrap_or("*Not set*"),
            true,
        )
        .field("Bot", if user.bot { "Yes" } else { "No" }, true)
        .field("Created", created, true)
}

struct UserInfo;

#[async_trait]
impl CommandHandler for UserInfo {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        ctx.reply(user_info_embed(target_user(ctx))).await?;
        Ok(())
    }
}

struct UserAvatar;

#[async_trait]
impl CommandHandler for UserAvatar {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        let user = target_user(ctx);
        let description = match &user.avatar_url {
            Some(url) => format!("[Download]({url})"),
            None => "*This user has no custom avatar*".to_string(),
        };
        let embed = Embed::new(EmbedColor::Info)
            .title(format!("{}'s avatar", user.username))
            .description(description);
        ctx.reply(embed).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Harness;
    use patto_commands::ExecutionOutcome;

    #[test]
    fn decodes_snowflake_timestamp() {
        let created = created_at(175_928_847_299_117_063).unwrap();
        assert_eq!(created.format("%Y-%m-%d %H:%M:%S").to_string(), "2016-04-30 11:18:25");
    }

    #[tokio::test]
    async fn defaults_to_invoker() {
        let harness = Harness::new(definitions());
        let (outcome, embed) = harness.say("!user info").await;
        assert_eq!(outcome, ExecutionOutcome::Completed);
        assert_eq!(embed.title.as_deref(), Some("About owner"));
        assert_eq!(embed.fields[2].value, "Server Owner");
    }

    #[tokio::test]
    async fn resolves_mentions() {
        let harness = Harness::new(definitions());
        let guest = harness.platform.find_user("guest").unwrap().id;

        let (_, embed) = harness.say(&format!("!user info <@{guest}>")).await;
        assert_eq!(embed.title.as_deref(), Some("About guest"));
        assert_eq!(embed.fields[2].value, "*Not set*");

        let (_, embed) = harness.say(&format!("!user avatar {guest}")).await;
        assert_eq!(embed.description.as_deref(), Some("*This user has no custom avatar*"));
    }

    #[tokio::test]
    async fn unknown_user_is_a_usage_error() {
        let harness = Harness::new(definitions());
        let (outcome, embed) = harness.say("!user avatar <@999>").await;
        assert!(matches!(outcome, ExecutionOutcome::Failed { .. }));
        assert_eq!(embed.description.as_deref(), Some("Could not find the specified user: `<@999>`"));
    }
}
