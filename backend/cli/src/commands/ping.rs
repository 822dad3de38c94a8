use std::time::Instant;

use async_trait::async_trait;
use patto_commands::{CommandContext, CommandDefinition, CommandHandler, CommandOptions};
use patto_core::{CommandCategory, CommandResult, Embed, EmbedColor};

pub fn definition() -> CommandDefinition {
    CommandDefinition::new("info/ping")
        .command(
            CommandOptions::new("ping", "Shows the bot's latency")
                .aliases(["latencia", "pong"])
                .category(CommandCategory::Info),
        )
        .run(Ping)
}

struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        let started = Instant::now();
        ctx.send("Pinging...").await?;
        let latency = started.elapsed().as_millis();

        let embed = Embed::new(EmbedColor::Success)
            .title("🏓 Pong!")
            .description(format!("Latency `{latency}ms`"));
        ctx.reply(embed).await?;
        Ok(())
    }
}
