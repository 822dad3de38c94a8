use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use patto_core::{ArgValue, Invoker, ReplyPayload, Responder, UserRef};

use crate::registry::CommandRegistry;
use crate::resolver::ResolvedArguments;
use crate::types::CommandEntry;

/// A structured (slash) invocation as delivered by the platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredInput {
    pub command: String,
    pub group: Option<String>,
    pub subcommand: Option<String>,
    /// Option values by option name, already typed by the platform.
    pub options: HashMap<String, ArgValue>,
}

impl StructuredInput {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), ..Default::default() }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into());
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}

/// A prefixed text invocation after command detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub content: String,
    /// Text after the prefix and the command words.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvocationInput {
    Structured(StructuredInput),
    Text(TextInput),
}

impl InvocationInput {
    pub fn is_structured(&self) -> bool {
        matches!(self, InvocationInput::Structured(_))
    }
}

/// Per-invocation state handed to plugins and handlers.
pub struct CommandContext {
    pub invoker: Invoker,
    pub args: ResolvedArguments,
    /// Routed subcommand id, when the command declares subcommands.
    pub subcommand: Option<String>,
    entry: Arc<CommandEntry>,
    responder: Arc<dyn Responder>,
    registry: Arc<CommandRegistry>,
    prefix: String,
    structured: bool,
    started: Instant,
}

impl CommandContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        invoker: Invoker,
        args: ResolvedArguments,
        subcommand: Option<String>,
        entry: Arc<CommandEntry>,
        responder: Arc<dyn Responder>,
        registry: Arc<CommandRegistry>,
        prefix: impl Into<String>,
        structured: bool,
    ) -> Self {
        Self {
            invoker,
            args,
            subcommand,
            entry,
            responder,
            registry,
            prefix: prefix.into(),
            structured,
            started: Instant::now(),
        }
    }

    pub fn user(&self) -> &UserRef {
        &self.invoker.user
    }

    pub fn entry(&self) -> &CommandEntry {
        &self.entry
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether this came from a structured (slash) invocation.
    pub fn is_structured(&self) -> bool {
        self.structured
    }

    /// Time since this invocation's context was built.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub async fn reply(&self, payload: impl Into<ReplyPayload>) -> Result<()> {
        self.responder.reply(payload.into()).await
    }

    pub async fn send(&self, payload: impl Into<ReplyPayload>) -> Result<()> {
        self.responder.send(payload.into()).await
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("command", &self.entry.descriptor.name)
            .field("subcommand", &self.subcommand)
            .field("user", &self.invoker.user.id)
            .field("args", &self.args)
            .finish()
    }
}
