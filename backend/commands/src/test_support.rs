//! Shared test doubles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use patto_core::{
    ChannelRef, CommandError, CommandResult, Invoker, MemberRef, Permissions, RoleRef, Snowflake,
    UserRef,
};

use crate::context::CommandContext;
use crate::dispatch::CommandHandler;
use crate::platform::Platform;
use crate::plugin::{Flow, Plugin, RegisterDecision};
use crate::schema::{CommandSchema, RegisteredCommand};
use crate::types::CommandEntry;

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub const GUILD_ID: Snowflake = 500;

pub fn guild_invoker() -> Invoker {
    let member = MemberRef {
        user: UserRef::new(10, "tester"),
        guild_id: GUILD_ID,
        nickname: None,
        permissions: Permissions::SEND_MESSAGES,
    };
    Invoker::in_guild(member, 900)
}

/// In-memory platform with a fixed set of entities.
#[derive(Default)]
pub struct StaticPlatform {
    users: HashMap<Snowflake, UserRef>,
    roles: HashMap<Snowflake, RoleRef>,
    channels: HashMap<Snowflake, ChannelRef>,
    published: Mutex<Vec<CommandSchema>>,
}

impl StaticPlatform {
    /// User 42 `alice`, role 7 `mods`, channel 9 `general`.
    pub fn seeded() -> Self {
        let mut platform = Self::default();
        platform.users.insert(42, UserRef::new(42, "alice"));
        platform.roles.insert(7, RoleRef { id: 7, name: "mods".into() });
        platform.channels.insert(9, ChannelRef { id: 9, name: "general".into() });
        platform
    }

    pub fn published(&self) -> Vec<CommandSchema> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for StaticPlatform {
    async fn fetch_user(&self, id: Snowflake) -> Result<Option<UserRef>> {
        Ok(self.users.get(&id).cloned())
    }

    async fn fetch_member(&self, guild_id: Snowflake, id: Snowflake) -> Result<Option<MemberRef>> {
        Ok(self.users.get(&id).map(|user| MemberRef {
            user: user.clone(),
            guild_id,
            nickname: None,
            permissions: Permissions::NONE,
        }))
    }

    async fn fetch_role(&self, guild_id: Snowflake, id: Snowflake) -> Result<Option<RoleRef>> {
        Ok(self.roles.get(&id).filter(|_| guild_id == GUILD_ID).cloned())
    }

    async fn fetch_channel(&self, id: Snowflake) -> Result<Option<ChannelRef>> {
        Ok(self.channels.get(&id).cloned())
    }

    async fn replace_commands(&self, schemas: &[CommandSchema]) -> Result<Vec<RegisteredCommand>> {
        *self.published.lock().unwrap() = schemas.to_vec();
        Ok(schemas
            .iter()
            .enumerate()
            .map(|(i, schema)| RegisteredCommand { id: format!("{}", 1000 + i), schema: schema.clone() })
            .collect())
    }
}

pub struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    async fn handle(&self, _ctx: &CommandContext) -> CommandResult<()> {
        Ok(())
    }
}

/// Logs `label:<key or text argument>`.
pub struct RecordingHandler {
    label: String,
    log: EventLog,
}

impl RecordingHandler {
    pub fn new(label: &str, log: EventLog) -> Self {
        Self { label: label.to_string(), log }
    }
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    async fn handle(&self, ctx: &CommandContext) -> CommandResult<()> {
        let arg = ctx.args.get_str("key").or_else(|| ctx.args.get_str("text")).unwrap_or("");
        self.log.lock().unwrap().push(format!("{}:{arg}", self.label));
        Ok(())
    }
}

pub enum FailingHandler {
    Reply(String),
    Internal(String),
}

impl FailingHandler {
    pub fn reply(message: &str) -> Self {
        Self::Reply(message.to_string())
    }

    pub fn internal(message: &str) -> Self {
        Self::Internal(message.to_string())
    }
}

#[async_trait]
impl CommandHandler for FailingHandler {
    async fn handle(&self, _ctx: &CommandContext) -> CommandResult<()> {
        match self {
            FailingHandler::Reply(m) => Err(CommandError::reply(m.clone())),
            FailingHandler::Internal(m) => Err(CommandError::internal(m.clone())),
        }
    }
}

/// Logs `name:hook:command` for every hook.
pub struct RecordingPlugin {
    name: String,
    log: EventLog,
}

impl RecordingPlugin {
    pub fn shared(name: &str, log: EventLog) -> Arc<dyn Plugin> {
        Arc::new(Self { name: name.to_string(), log })
    }

    fn record(&self, hook: &str, command: &str) {
        self.log.lock().unwrap().push(format!("{}:{hook}:{command}", self.name));
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn before_register(&self, entry: &CommandEntry, _draft: &CommandSchema) -> Result<RegisterDecision> {
        self.record("before_register", &entry.descriptor.name);
        Ok(RegisterDecision::Keep)
    }

    async fn after_register(&self, entry: &CommandEntry, _registered: &RegisteredCommand) -> Result<()> {
        self.record("after_register", &entry.descriptor.name);
        Ok(())
    }

    async fn before_execute(&self, ctx: &CommandContext) -> CommandResult<Flow> {
        self.record("before_execute", &ctx.entry().descriptor.name);
        Ok(Flow::Continue)
    }

    async fn after_execute(&self, ctx: &CommandContext) -> CommandResult<()> {
        self.record("after_execute", &ctx.entry().descriptor.name);
        Ok(())
    }
}

pub struct StopPlugin;

#[async_trait]
impl Plugin for StopPlugin {
    fn name(&self) -> &str {
        "stop"
    }

    async fn before_execute(&self, _ctx: &CommandContext) -> CommandResult<Flow> {
        Ok(Flow::Stop)
    }
}
