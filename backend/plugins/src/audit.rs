//! Audit plugin: records command lifecycle events through the event logger.
//!
//! Durations come from the invocation's own context, so the plugin keeps no state
//! between hooks and an execution that never reaches `after_execute` leaves nothing behind.

use async_trait::async_trait;
use patto_commands::{CommandContext, Flow, Plugin};
use patto_core::CommandResult;
use patto_logging::{CommandEvent, EventLogger};

#[derive(Debug, Default, Clone, Copy)]
pub struct AuditPlugin;

impl AuditPlugin {
    pub fn new() -> Self {
        Self
    }
}

fn duration_ms(ctx: &CommandContext) -> u64 {
    ctx.elapsed().as_millis() as u64
}

fn describe_args(ctx: &CommandContext) -> String {
    let mut args: Vec<String> = ctx.args.iter().map(|(k, v)| format!("{k}={v}")).collect();
    args.sort();
    args.join(" ")
}

#[async_trait]
impl Plugin for AuditPlugin {
    fn name(&self) -> &str {
        "audit"
    }

    async fn before_execute(&self, ctx: &CommandContext) -> CommandResult<Flow> {
        let command = ctx.entry().descriptor.name.clone();
        EventLogger::log_event(
            ctx.user().id,
            ctx.invoker.guild_id,
            CommandEvent::Started { command, args: describe_args(ctx) },
        );
        Ok(Flow::Continue)
    }

    async fn after_execute(&self, ctx: &CommandContext) -> CommandResult<()> {
        let command = ctx.entry().descriptor.name.clone();
        EventLogger::log_event(
            ctx.user().id,
            ctx.invoker.guild_id,
            CommandEvent::Executed { command, duration_ms: duration_ms(ctx) },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context_for, guarded_registry, member_invoker};
    use patto_core::{BufferedResponder, Permissions};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn stopped_invocation_leaves_nothing_pending() {
        let registry = Arc::new(guarded_registry(Permissions::NONE));
        let ctx = context_for(
            &registry,
            member_invoker(Permissions::NONE),
            Arc::new(BufferedResponder::new()),
        );
        let plugin = AuditPlugin::new();

        // A later plugin stops the chain, so after_execute never runs.
        assert_eq!(plugin.before_execute(&ctx).await.unwrap(), Flow::Continue);
        assert_eq!(std::mem::size_of::<AuditPlugin>(), 0);
    }

    #[tokio::test]
    async fn overlapping_invocations_time_themselves() {
        let registry = Arc::new(guarded_registry(Permissions::NONE));
        let invoker = member_invoker(Permissions::NONE);
        let first = context_for(&registry, invoker.clone(), Arc::new(BufferedResponder::new()));
        let plugin = AuditPlugin::new();

        plugin.before_execute(&first).await.unwrap();
        std::thread::sleep(Duration::from_millis(30));
        let second = context_for(&registry, invoker, Arc::new(BufferedResponder::new()));
        plugin.before_execute(&second).await.unwrap();

        plugin.after_execute(&second).await.unwrap();
        plugin.after_execute(&first).await.unwrap();
        assert!(duration_ms(&first) >= 30);
        assert!(duration_ms(&second) < duration_ms(&first));
    }
}
