use std::sync::Arc;

use async_trait::async_trait;
use patto_commands::{
    CommandContext, CommandDefinition, CommandHandler, CommandOptions, CommandRegistry,
    ResolvedArguments,
};
use patto_core::{CommandResult, Invoker, MemberRef, Permissions, Responder, UserRef};

struct Noop;

#[async_trait]
impl CommandHandler for Noop {
    async fn handle(&self, _ctx: &CommandContext) -> CommandResult<()> {
        Ok(())
    }
}

/// Registry with one `guarded` command requiring `permissions`.
pub fn guarded_registry(permissions: Permissions) -> CommandRegistry {
    CommandRegistry::load(vec![
        CommandDefinition::new("admin/guarded")
            .command(CommandOptions::new("guarded", "Guarded command"))
            .permissions(permissions)
            .run(Noop),
    ])
    .unwrap()
}

pub fn member_invoker(permissions: Permissions) -> Invoker {
    let member = MemberRef {
        user: UserRef::new(10, "tester"),
        guild_id: 1,
        nickname: None,
        permissions,
    };
    Invoker::in_guild(member, 2)
}

pub fn context_for(
    registry: &Arc<CommandRegistry>,
    invoker: Invoker,
    responder: Arc<dyn Responder>,
) -> CommandContext {
    let entry = registry.get("guarded").unwrap();
    CommandContext::new(
        invoker,
        ResolvedArguments::default(),
        None,
        entry,
        responder,
        Arc::clone(registry),
        "!",
        false,
    )
}
