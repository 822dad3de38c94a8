//! `help [command...]`: a category menu, or detailed help for one command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use patto_commands::{
    ArgKind, ArgumentDescriptor, ArgumentSet, CommandContext, CommandDefinition, CommandHandler,
    CommandOptions, CommandRegistry,
};
use patto_components::{ComponentHandler, ComponentInteraction, ComponentRegistry};
use patto_core::{
    CommandCategory, CommandResult, Embed, EmbedColor, ReplyPayload, Responder,
};

pub const PAGE_SIZE: usize = 10;
const MENU_TIMEOUT: Duration = Duration::from_secs(120);
const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

pub fn definition(components: ComponentRegistry) -> CommandDefinition {
    CommandDefinition::new("info/help")
        .command(
            CommandOptions::new("help", "Shows help for the available commands")
                .aliases(["ayuda"])
                .category(CommandCategory::Info),
        )
        .arguments(ArgumentSet::new(vec![
            ArgumentDescriptor::new("command", "comando", ArgKind::String)
                .describe("The command to explain; may include subcommands")
                .raw_text(),
        ]))
        .run(Help { components })
}

struct Help {
    components: ComponentRegistry,
}

#[async_trait]
impl CommandHandler for Help {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        let shown_prefix = if ctx.is_structured() { "/" } else { ctx.prefix() };

        if let Some(name) = ctx.args.get_str("command") {
            let embed = command_help(ctx.registry(), name, shown_prefix, !ctx.is_structured());
            ctx.reply(embed).await?;
            return Ok(());
        }

        let menu = CategoryMenu {
            registry: Arc::clone(ctx.registry()),
            components: self.components.clone(),
            prefix: shown_prefix.to_string(),
        };
        let custom_id = self.components.register_select(menu, MENU_TIMEOUT).await;

        let options = CommandCategory::all()
            .iter()
            .map(|c| format!("{} **{}** (`{}`): {}", c.icon(), c.label(), c.tag(), c.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let embed = Embed::new(EmbedColor::Info)
            .title("Command help")
            .description(format!("Pick a category from the menu to see its commands.\n\n{options}"));
        ctx.reply(ReplyPayload::embed(embed).with_component(custom_id)).await?;
        Ok(())
    }
}

/// Detailed help for one command, or the nested commands of a container name.
pub fn command_help(registry: &CommandRegistry, name: &str, prefix: &str, text_usage: bool) -> Embed {
    let name = name.trim().to_lowercase();
    let Some(entry) = registry.get(&name) else {
        return container_help(registry, &name, prefix).unwrap_or_else(|| {
            Embed::new(EmbedColor::Error)
                .title("Command not found")
                .description(format!("No command named `{name}` was found."))
        });
    };
    let descriptor = &entry.descriptor;

    let mut usage = format!("{prefix}{}", descriptor.name);
    if text_usage && !descriptor.has_subcommands() {
        for arg in entry.arguments.iter() {
            let (open, close) = if arg.required { ('<', '>') } else { ('[', ']') };
            usage.push_str(&format!(" {open}{}{close}", arg.name));
        }
    }

    let description = if descriptor.description.is_empty() {
        "*No description*".to_string()
    } else {
        descriptor.description.clone()
    };
    let mut embed = Embed::new(EmbedColor::Info)
        .title(format!("Help: {}", descriptor.name))
        .description(description)
        .field("Usage", format!("`{usage}`"), false);

    if descriptor.has_subcommands() {
        let subs = descriptor
            .declared_subcommands
            .iter()
            .map(|sub| format!("`{prefix}{} {sub}`", descriptor.name))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Subcommands", subs, false);
    }

    if !entry.arguments.is_empty() {
        let args = entry
            .arguments
            .iter()
            .map(|arg| format!("**{}**: {}", arg.name, arg.description))
            .collect::<Vec<_>>()
            .join("\n\n");
        embed = embed.field("Arguments", args, false);
    }

    if !descriptor.aliases.is_empty() {
        let aliases = descriptor
            .aliases
            .iter()
            .map(|a| format!("`{a}`"))
            .collect::<Vec<_>>()
            .join(", ");
        embed = embed.field("Aliases", aliases, false);
    }

    if text_usage {
        embed = embed.footer("<> = required, [] = optional");
    }
    embed
}

fn container_help(registry: &CommandRegistry, name: &str, prefix: &str) -> Option<Embed> {
    let mut nested: Vec<String> = registry
        .subcommands_of(name)
        .iter()
        .map(|e| format!("`{prefix}{}`: {}", e.descriptor.name, e.descriptor.description))
        .collect();
    for entries in registry.subcommand_groups(name).values() {
        nested.extend(
            entries
                .iter()
                .map(|e| format!("`{prefix}{}`: {}", e.descriptor.name, e.descriptor.description)),
        );
    }
    if nested.is_empty() {
        return None;
    }
    Some(
        Embed::new(EmbedColor::Info)
            .title(format!("Help: {name}"))
            .description(format!("{name} commands"))
            .field("Subcommands", nested.join("\n"), false),
    )
}

/// `**!name** - description` lines for every command in `category`.
fn category_lines(registry: &CommandRegistry, category: CommandCategory, prefix: &str) -> Vec<String> {
    registry
        .by_category(category)
        .iter()
        .map(|e| format!("**{prefix}{}** - {}", e.descriptor.name, e.descriptor.description))
        .collect()
}

struct CategoryMenu {
    registry: Arc<CommandRegistry>,
    components: ComponentRegistry,
    prefix: String,
}

#[async_trait]
impl ComponentHandler for CategoryMenu {
    async fn handle(&self, interaction: &ComponentInteraction, responder: &dyn Responder) -> anyhow::Result<()> {
        let tag = interaction.values.first().map(String::as_str).unwrap_or_default();
        let category = CommandCategory::from_tag(tag).ok_or_else(|| anyhow!("unknown category `{tag}`"))?;
        let title = format!("{} {}", category.icon(), category.label());
        let lines = category_lines(&self.registry, category, &self.prefix);

        if lines.is_empty() {
            let embed = Embed::new(EmbedColor::Info)
                .title(title)
                .description("*This category has no commands*");
            return responder.reply(embed.into()).await;
        }

        let pager = Arc::new(Pager { title, lines, components: self.components.clone() });
        responder.reply(pager.render(0).await).await
    }
}

/// Pages of command lines with previous/next buttons.
struct Pager {
    title: String,
    lines: Vec<String>,
    components: ComponentRegistry,
}

impl Pager {
    fn pages(&self) -> usize {
        self.lines.len().div_ceil(PAGE_SIZE).max(1)
    }

    async fn render(self: &Arc<Self>, page: usize) -> ReplyPayload {
        let pages = self.pages();
        let page = page.min(pages - 1);
        let body = self
            .lines
            .iter()
            .skip(page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        let mut embed = Embed::new(EmbedColor::Info).title(&self.title).description(body);
        if pages == 1 {
            return embed.into();
        }
        embed = embed.footer(format!("Page {} of {pages}", page + 1));

        let mut payload = ReplyPayload::embed(embed);
        if page > 0 {
            let turn = PageTurn { pager: Arc::clone(self), target: page - 1 };
            payload = payload.with_component(self.components.register_button(turn, PAGE_TIMEOUT).await);
        }
        if page + 1 < pages {
            let turn = PageTurn { pager: Arc::clone(self), target: page + 1 };
            payload = payload.with_component(self.components.register_button(turn, PAGE_TIMEOUT).await);
        }
        payload
    }
}

struct PageTurn {
    pager: Arc<Pager>,
    target: usize,
}

#[async_trait]
impl ComponentHandler for PageTurn {
    async fn handle(&self, _interaction: &ComponentInteraction, responder: &dyn Responder) -> anyhow::Result<()> {
        responder.reply(self.pager.render(self.target).await).await
    }
}
