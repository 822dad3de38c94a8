use anyhow::Result;
use async_trait::async_trait;
use patto_core::{ChannelRef, MemberRef, RoleRef, Snowflake, UserRef};

use crate::schema::{CommandSchema, RegisteredCommand};

/// Platform gateway used by the pipeline for entity lookups and for
/// publishing the structured command schema.
///
/// Lookups return `Ok(None)` when the entity does not exist.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn fetch_user(&self, id: Snowflake) -> Result<Option<UserRef>>;

    async fn fetch_member(&self, guild_id: Snowflake, id: Snowflake) -> Result<Option<MemberRef>>;

    async fn fetch_role(&self, guild_id: Snowflake, id: Snowflake) -> Result<Option<RoleRef>>;

    async fn fetch_channel(&self, id: Snowflake) -> Result<Option<ChannelRef>>;

    /// Replace the whole published command set in one call.
    async fn replace_commands(&self, schemas: &[CommandSchema]) -> Result<Vec<RegisteredCommand>>;
}
