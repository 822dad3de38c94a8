//! Platform event routing: messages to the text surface, interactions to
//! structured commands or component callbacks.

use std::sync::Arc;

use patto_commands::{CommandDispatcher, ExecutionOutcome, StructuredInput};
use patto_components::{ComponentError, ComponentInteraction, ComponentKind, ComponentRegistry};
use patto_core::{Invoker, MemberRef, Presentation, ReplyPayload, Responder, Snowflake, UserRef};
use patto_logging::{CommandEvent, EventLogger};
use tracing::{debug, error, warn};

pub const INTERACTION_FAILURE: &str = "An error occurred while processing this action.";

/// A message as delivered by the platform.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub author: UserRef,
    /// Present for guild messages.
    pub member: Option<MemberRef>,
    pub channel_id: Snowflake,
    pub content: String,
}

#[derive(Debug, Clone)]
pub enum Interaction {
    Command { input: StructuredInput, invoker: Invoker },
    Component { kind: ComponentKind, interaction: ComponentInteraction },
}

/// What the router did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Ignored,
    Command(ExecutionOutcome),
    Component,
    /// A callback failed and the fallback reply was sent.
    Failed,
}

pub struct EventRouter {
    dispatcher: Arc<CommandDispatcher>,
    components: ComponentRegistry,
    text_commands: bool,
}

impl EventRouter {
    pub fn new(dispatcher: Arc<CommandDispatcher>, components: ComponentRegistry, text_commands: bool) -> Self {
        Self { dispatcher, components, text_commands }
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    /// Bots, messages outside guilds, and messages without the prefix are ignored.
    pub async fn on_message(&self, message: IncomingMessage, responder: Arc<dyn Responder>) -> Routed {
        if !self.text_commands || message.author.bot {
            return Routed::Ignored;
        }
        let Some(member) = message.member else {
            return Routed::Ignored;
        };
        if !message.content.starts_with(self.dispatcher.prefix()) {
            return Routed::Ignored;
        }

        let invoker = Invoker::in_guild(member, message.channel_id);
        let (user_id, guild_id) = (invoker.user.id, invoker.guild_id);
        match self.dispatcher.handle_message(&message.content, invoker, responder).await {
            Some(outcome) => {
                let rest = &message.content[self.dispatcher.prefix().len()..];
                let command = rest.split_whitespace().next().unwrap_or_default();
                record_outcome(command, user_id, guild_id, &outcome);
                Routed::Command(outcome)
            }
            None => {
                debug!(content = %message.content, "No command matched");
                Routed::Ignored
            }
        }
    }

    pub async fn on_interaction(&self, interaction: Interaction, responder: Arc<dyn Responder>) -> Routed {
        match interaction {
            Interaction::Command { input, invoker } => {
                let command = [Some(input.command.as_str()), input.group.as_deref(), input.subcommand.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                let (user_id, guild_id) = (invoker.user.id, invoker.guild_id);
                match self.dispatcher.handle_interaction(input, invoker, responder).await {
                    Some(outcome) => {
                        record_outcome(&command, user_id, guild_id, &outcome);
                        Routed::Command(outcome)
                    }
                    None => Routed::Ignored,
                }
            }
            Interaction::Component { kind, interaction } => {
                match self.components.dispatch(kind, &interaction, responder.as_ref()).await {
                    Ok(()) => Routed::Component,
                    Err(ComponentError::Unknown(custom_id)) => {
                        warn!(custom_id = %custom_id, "No callback registered for component");
                        Routed::Ignored
                    }
                    Err(e @ ComponentError::KindMismatch { .. }) => {
                        warn!("{e}");
                        Routed::Ignored
                    }
                    Err(e) => {
                        error!(error = %e, "Error handling interaction");
                        let fallback = ReplyPayload::text(INTERACTION_FAILURE).ephemeral();
                        if let Err(send_err) = responder.reply(fallback).await {
                            error!(error = %send_err, "Failed to send interaction error reply");
                        }
                        Routed::Failed
                    }
                }
            }
        }
    }
}

/// Log invocations that did not complete as command events.
fn record_outcome(command: &str, user_id: Snowflake, guild_id: Option<Snowflake>, outcome: &ExecutionOutcome) {
    let command = command.to_string();
    let event = match outcome {
        ExecutionOutcome::Completed => return,
        ExecutionOutcome::Cancelled { plugin } => CommandEvent::Cancelled { command, plugin: plugin.clone() },
        ExecutionOutcome::Failed { stage, presentation: Presentation::Usage } => CommandEvent::Rejected {
            command,
            reason: format!("invalid usage at {stage:?}"),
        },
        ExecutionOutcome::Failed { stage, .. } => CommandEvent::Failed {
            command,
            error_msg: format!("failed at {stage:?}"),
        },
    };
    EventLogger::log_event(user_id, guild_id, event);
}
