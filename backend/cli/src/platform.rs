//! In-process platform adapter backing the console runner.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use patto_commands::{CommandSchema, Platform, RegisteredCommand};
use patto_core::{
    ChannelRef, Delivery, MemberRef, Permissions, ReplyPayload, Responder, RoleRef, Snowflake,
    UserRef,
};
use tracing::info;

use crate::terminal_output::{render_payload, supports_color};

pub const CONSOLE_GUILD: Snowflake = 1_100_000_000_000_000_000;
pub const CONSOLE_CHANNEL: Snowflake = 1_100_000_000_000_000_001;

/// A fixed guild with a handful of users, roles, and channels.
pub struct ConsolePlatform {
    users: HashMap<Snowflake, UserRef>,
    permissions: HashMap<Snowflake, Permissions>,
    roles: HashMap<Snowflake, RoleRef>,
    channels: HashMap<Snowflake, ChannelRef>,
    published: Mutex<Vec<RegisteredCommand>>,
    next_id: AtomicU64,
}

impl ConsolePlatform {
    pub fn seeded() -> Self {
        let mut users = HashMap::new();
        let mut permissions = HashMap::new();

        let mut owner = UserRef::new(1_200_000_000_000_000_001, "owner");
        owner.global_name = Some("Server Owner".into());
        owner.avatar_url = Some("https://cdn.example.com/avatars/owner.png".into());
        permissions.insert(owner.id, Permissions::ADMINISTRATOR);
        users.insert(owner.id, owner);

        let guest = UserRef::new(1_200_000_000_000_000_002, "guest");
        permissions.insert(guest.id, Permissions::SEND_MESSAGES);
        users.insert(guest.id, guest);

        let mut helper = UserRef::new(1_200_000_000_000_000_003, "helper");
        helper.bot = true;
        permissions.insert(helper.id, Permissions::SEND_MESSAGES);
        users.insert(helper.id, helper);

        let roles = [RoleRef { id: 1_300_000_000_000_000_001, name: "moderators".into() }]
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let channels = [
            ChannelRef { id: CONSOLE_CHANNEL, name: "general".into() },
            ChannelRef { id: CONSOLE_CHANNEL + 1, name: "announcements".into() },
        ]
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

        Self {
            users,
            permissions,
            roles,
            channels,
            published: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn find_user(&self, name: &str) -> Option<&UserRef> {
        self.users.values().find(|u| u.username.eq_ignore_ascii_case(name))
    }

    pub fn member_of(&self, user: &UserRef) -> MemberRef {
        MemberRef {
            user: user.clone(),
            guild_id: CONSOLE_GUILD,
            nickname: None,
            permissions: self.permissions.get(&user.id).copied().unwrap_or_default(),
        }
    }

    pub fn published(&self) -> Vec<RegisteredCommand> {
        self.published.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Platform for ConsolePlatform {
    async fn fetch_user(&self, id: Snowflake) -> Result<Option<UserRef>> {
        Ok(self.users.get(&id).cloned())
    }

    async fn fetch_member(&self, guild_id: Snowflake, id: Snowflake) -> Result<Option<MemberRef>> {
        if guild_id != CONSOLE_GUILD {
            return Ok(None);
        }
        Ok(self.users.get(&id).map(|u| self.member_of(u)))
    }

    async fn fetch_role(&self, guild_id: Snowflake, id: Snowflake) -> Result<Option<RoleRef>> {
        if guild_id != CONSOLE_GUILD {
            return Ok(None);
        }
        Ok(self.roles.get(&id).cloned())
    }

    async fn fetch_channel(&self, id: Snowflake) -> Result<Option<ChannelRef>> {
        Ok(self.channels.get(&id).cloned())
    }

    async fn replace_commands(&self, schemas: &[CommandSchema]) -> Result<Vec<RegisteredCommand>> {
        let registered: Vec<RegisteredCommand> = schemas
            .iter()
            .map(|schema| RegisteredCommand {
                id: self.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
                schema: schema.clone(),
            })
            .collect();
        *self
            .published
            .lock()
            .map_err(|_| anyhow!("published command list poisoned"))? = registered.clone();
        info!(count = registered.len(), "[Console] Published application commands");
        Ok(registered)
    }
}

/// Prints every payload to stdout as it arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleResponder;

impl ConsoleResponder {
    pub fn shared() -> Arc<dyn Responder> {
        Arc::new(Self)
    }

    fn print(delivery: Delivery, payload: &ReplyPayload) {
        println!("{}\n", render_payload(delivery, payload, supports_color()));
    }
}

#[async_trait]
impl Responder for ConsoleResponder {
    async fn reply(&self, payload: ReplyPayload) -> Result<()> {
        Self::print(Delivery::Reply, &payload);
        Ok(())
    }

    async fn send(&self, payload: ReplyPayload) -> Result<()> {
        Self::print(Delivery::Send, &payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn members_only_resolve_in_console_guild() {
        let platform = ConsolePlatform::seeded();
        let owner = platform.find_user("OWNER").unwrap().clone();
        let member = platform.fetch_member(CONSOLE_GUILD, owner.id).await.unwrap().unwrap();
        assert!(member.permissions.contains(Permissions::MANAGE_GUILD));
        assert!(platform.fetch_member(7, owner.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn publishing_assigns_ids_and_replaces() {
        let platform = ConsolePlatform::seeded();
        let schema = CommandSchema {
            name: "ping".into(),
            description: "Ping".into(),
            options: Vec::new(),
            default_member_permissions: None,
        };
        let first = platform.replace_commands(&[schema.clone()]).await.unwrap();
        let second = platform.replace_commands(&[schema]).await.unwrap();
        assert_ne!(first[0].id, second[0].id);
        assert_eq!(platform.published().len(), 1);
    }
}
