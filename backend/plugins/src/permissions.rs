//! Permissions Enforcer
//!
//! Publishes each command's required permission bits with its schema and
//! re-checks them for every invocation, since text commands bypass the
//! platform's own visibility filter.

use anyhow::Result;
use async_trait::async_trait;
use patto_commands::{CommandContext, CommandEntry, CommandSchema, Flow, Plugin, RegisterDecision};
use patto_core::{CommandResult, Embed, EmbedColor, Permissions};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct PermissionsPlugin;

impl PermissionsPlugin {
    pub fn new() -> Self {
        Self
    }
}

/// Embed sent when the invoker lacks `missing`.
pub fn insufficient_permissions_embed(missing: Permissions) -> Embed {
    let names = missing
        .names()
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(", ");
    Embed::new(EmbedColor::Error)
        .title("Insufficient permissions")
        .description(format!("You need the following permissions to use this command: {names}"))
}

#[async_trait]
impl Plugin for PermissionsPlugin {
    fn name(&self) -> &str {
        "permissions"
    }

    async fn before_register(&self, entry: &CommandEntry, draft: &CommandSchema) -> Result<RegisterDecision> {
        let required = entry.descriptor.permissions;
        if required.is_empty() {
            return Ok(RegisterDecision::Keep);
        }
        let mut schema = draft.clone();
        schema.default_member_permissions = Some(required.0.to_string());
        debug!(command = %entry.key, bits = required.0, "[Permissions] Restricting command visibility");
        Ok(RegisterDecision::Replace(schema))
    }

    async fn before_execute(&self, ctx: &CommandContext) -> CommandResult<Flow> {
        let required = ctx.entry().descriptor.permissions;
        if required.is_empty() {
            return Ok(Flow::Continue);
        }
        let missing = required.missing_from(ctx.invoker.permissions());
        if missing.is_empty() {
            return Ok(Flow::Continue);
        }

        debug!(
            command = %ctx.entry().key,
            user = ctx.user().id,
            missing = missing.0,
            "[Permissions] Denied"
        );
        if let Err(e) = ctx.reply(insufficient_permissions_embed(missing)).await {
            warn!("[Permissions] Failed to send denial: {e}");
        }
        Ok(Flow::Stop)
    }
}
