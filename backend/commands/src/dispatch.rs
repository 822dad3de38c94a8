//! Command dispatcher: runs one invocation through the full lifecycle.
//!
//! START → ARGUMENTS_RESOLVED → PLUGINS_BEFORE → SUBCOMMAND_ROUTED →
//! HANDLER_EXECUTED → PLUGINS_AFTER → DONE. Every failure is converted into
//! exactly one user-visible presentation here; nothing propagates further.
use std::sync::Arc;

use async_trait::async_trait;
use patto_core::{
    CommandError, CommandResult, Embed, EmbedColor, Invoker, Presentation, Responder, UserRef,
};
use tracing::{debug, error, info, warn};

use crate::context::{CommandContext, InvocationInput, StructuredInput};
use crate::detection::{detect_command, detect_structured};
use crate::platform::Platform;
use crate::plugin::{Flow, PluginScopes};
use crate::registry::CommandRegistry;
use crate::resolver::{ArgumentResolver, RawInput, ResolvedArguments};
use crate::subcommand::{SubcommandRoute, method_name, route_structured, route_text};
use crate::tokenizer::tokenize;
use crate::types::CommandEntry;

/// Message shown when a handler fails unexpectedly. Details go to the log.
pub const GENERIC_FAILURE: &str =
    "An unexpected error occurred while processing the command. Please try again later.";

/// Trait that every command handler implements.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    Start,
    ArgumentsResolved,
    PluginsBefore,
    SubcommandRouted,
    HandlerExecuted,
    PluginsAfter,
    Done,
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed,
    /// A before-hook stopped the pipeline. Nothing was sent.
    Cancelled { plugin: String },
    Failed { stage: ExecutionStage, presentation: Presentation },
}

pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
    plugins: Arc<PluginScopes>,
    platform: Arc<dyn Platform>,
    prefix: String,
}

impl CommandDispatcher {
    pub fn new(
        registry: Arc<CommandRegistry>,
        plugins: Arc<PluginScopes>,
        platform: Arc<dyn Platform>,
        prefix: impl Into<String>,
    ) -> Self {
        Self { registry, plugins, platform, prefix: prefix.into() }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn plugins(&self) -> &Arc<PluginScopes> {
        &self.plugins
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Handle a text message. `None` when it does not name a command.
    pub async fn handle_message(
        &self,
        content: &str,
        invoker: Invoker,
        responder: Arc<dyn Responder>,
    ) -> Option<ExecutionOutcome> {
        let (entry, input) = detect_command(content, &self.prefix, &self.registry)?;
        Some(self.execute(entry, InvocationInput::Text(input), invoker, responder).await)
    }

    /// Handle a structured invocation. `None` when the command is unknown.
    pub async fn handle_interaction(
        &self,
        mut input: StructuredInput,
        invoker: Invoker,
        responder: Arc<dyn Responder>,
    ) -> Option<ExecutionOutcome> {
        let Some((entry, consumed)) = detect_structured(&input, &self.registry) else {
            warn!("[Commands] Unknown structured command `{}`", input.command);
            return None;
        };
        if consumed {
            input.group = None;
            input.subcommand = None;
        }
        Some(self.execute(entry, InvocationInput::Structured(input), invoker, responder).await)
    }

    pub async fn execute(
        &self,
        entry: Arc<CommandEntry>,
        input: InvocationInput,
        invoker: Invoker,
        responder: Arc<dyn Responder>,
    ) -> ExecutionOutcome {
        let name = entry.descriptor.name.clone();
        info!(command = %entry.key, user = invoker.user.id, "[Commands] Dispatching `{name}`");

        let tokens = match &input {
            InvocationInput::Text(text) => tokenize(&text.body),
            InvocationInput::Structured(_) => Vec::new(),
        };
        let declared = &entry.descriptor.declared_subcommands;
        let route = match &input {
            InvocationInput::Text(_) => route_text(declared, &tokens),
            InvocationInput::Structured(s) => {
                route_structured(declared, s.group.as_deref(), s.subcommand.as_deref())
            }
        };

        // Arguments are only resolved once the tokens naming the subcommand are known.
        let args = match &route {
            SubcommandRoute::Missing | SubcommandRoute::Unmatched { .. } => ResolvedArguments::default(),
            _ => {
                let applicable = entry.arguments.applicable(route.subcommand());
                let raw = match &input {
                    InvocationInput::Text(text) => RawInput::Text {
                        tokens: tokens.get(route.consumed()..).unwrap_or_default(),
                        body: &text.body,
                    },
                    InvocationInput::Structured(s) => RawInput::Structured(&s.options),
                };
                let resolved = ArgumentResolver::new(self.platform.as_ref(), &invoker)
                    .resolve(&applicable, raw)
                    .await;
                match resolved {
                    Ok(args) => args,
                    Err(e) => {
                        return self
                            .report(ExecutionStage::ArgumentsResolved, &entry, &invoker.user, responder.as_ref(), e)
                            .await;
                    }
                }
            }
        };
        debug!(command = %entry.key, "[Commands] Resolved {} arguments", args.len());

        let ctx = CommandContext::new(
            invoker,
            args,
            route.subcommand().map(str::to_string),
            Arc::clone(&entry),
            Arc::clone(&responder),
            Arc::clone(&self.registry),
            self.prefix.clone(),
            input.is_structured(),
        );

        let plugins = self.plugins.plugins_for(&entry);
        for plugin in &plugins {
            match plugin.before_execute(&ctx).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => {
                    debug!(command = %entry.key, plugin = plugin.name(), "[Commands] Execution stopped by plugin");
                    return ExecutionOutcome::Cancelled { plugin: plugin.name().to_string() };
                }
                Err(e) => {
                    return self
                        .report(ExecutionStage::PluginsBefore, &entry, ctx.user(), responder.as_ref(), e)
                        .await;
                }
            }
        }

        let handler = match &route {
            SubcommandRoute::NotApplicable => entry.handlers.run().cloned().ok_or_else(|| {
                CommandError::internal(format!("command `{name}` has no run handler"))
            }),
            SubcommandRoute::Matched { id, .. } => {
                let method = method_name(id);
                entry.handlers.method(&method).cloned().ok_or_else(|| {
                    CommandError::internal(format!("command `{name}` has no handler `{method}`"))
                })
            }
            SubcommandRoute::Missing => {
                let embed = missing_subcommand_embed(&entry, &self.prefix);
                if let Err(e) = responder.reply(embed.into()).await {
                    warn!("[Commands] Failed to send missing-subcommand message: {e}");
                }
                return ExecutionOutcome::Failed {
                    stage: ExecutionStage::SubcommandRouted,
                    presentation: Presentation::Usage,
                };
            }
            SubcommandRoute::Unmatched { given } => Err(CommandError::validation(format!(
                "Subcommand `{given}` not found. Available subcommands: {}",
                declared.join(", ")
            ))),
        };
        let handler = match handler {
            Ok(handler) => handler,
            Err(e) => {
                return self
                    .report(ExecutionStage::SubcommandRouted, &entry, ctx.user(), responder.as_ref(), e)
                    .await;
            }
        };

        if let Err(e) = handler.handle(&ctx).await {
            return self
                .report(ExecutionStage::HandlerExecuted, &entry, ctx.user(), responder.as_ref(), e)
                .await;
        }

        for plugin in plugins.iter().rev() {
            if let Err(e) = plugin.after_execute(&ctx).await {
                return self
                    .report(ExecutionStage::PluginsAfter, &entry, ctx.user(), responder.as_ref(), e)
                    .await;
            }
        }

        debug!(command = %entry.key, "[Commands] Completed `{name}`");
        ExecutionOutcome::Completed
    }

    async fn report(
        &self,
        stage: ExecutionStage,
        entry: &CommandEntry,
        user: &UserRef,
        responder: &dyn Responder,
        err: CommandError,
    ) -> ExecutionOutcome {
        let presentation = err.presentation();
        let delivered = match err {
            CommandError::Validation(message) => {
                debug!(command = %entry.key, ?stage, "[Commands] Usage error: {message}");
                responder.reply(usage_embed(&message, user).into()).await
            }
            CommandError::Reply(message) => {
                debug!(command = %entry.key, ?stage, "[Commands] Reply error: {message}");
                responder.reply(error_embed(&message, user).into()).await
            }
            CommandError::Internal(e) => {
                error!(command = %entry.key, ?stage, "[Commands] Command failed: {e:#}");
                responder.send(error_embed(GENERIC_FAILURE, user).into()).await
            }
        };
        if let Err(e) = delivered {
            warn!(command = %entry.key, "[Commands] Failed to deliver error message: {e}");
        }
        ExecutionOutcome::Failed { stage, presentation }
    }
}

/// Usage-error presentation.
pub fn usage_embed(message: &str, user: &UserRef) -> Embed {
    Embed::new(EmbedColor::Error)
        .title("Usage error")
        .description(message)
        .footer(user.display_name())
}

/// Operational-error presentation.
pub fn error_embed(message: &str, user: &UserRef) -> Embed {
    Embed::new(EmbedColor::Error)
        .title("Error")
        .description(message)
        .footer(format!("Requested by: {}", user.username))
}

/// Lists the valid subcommands with their full invocation syntax.
pub fn missing_subcommand_embed(entry: &CommandEntry, prefix: &str) -> Embed {
    let name = &entry.descriptor.name;
    let lines = entry
        .descriptor
        .declared_subcommands
        .iter()
        .map(|sub| format!("`{prefix}{name} {sub}`"))
        .collect::<Vec<_>>()
        .join("\n");
    Embed::new(EmbedColor::Notice)
        .title(format!("Command `{name}`"))
        .description(format!("This command requires a subcommand:\n{lines}"))
        .footer(format!("Use {prefix}help {name} for more information"))
}
