//! Example command set shipped with the console runner.

pub mod config;
pub mod help;
pub mod ping;
pub mod server;
pub mod user;

use patto_commands::CommandDefinition;
use patto_components::ComponentRegistry;

/// Every command definition, in load order. Paths mirror a `commands/` tree.
pub fn definitions(components: &ComponentRegistry) -> Vec<CommandDefinition> {
    let mut defs = vec![
        ping::definition(),
        help::definition(components.clone()),
        config::definition(config::ConfigStore::seeded()),
    ];
    defs.extend(server::definitions());
    defs.extend(user::definitions());
    defs
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use patto_commands::{CommandDispatcher, CommandRegistry, ExecutionOutcome, PluginScopes};
    use patto_core::{BufferedResponder, Embed, Invoker};

    use crate::platform::{ConsolePlatform, CONSOLE_CHANNEL};

    pub struct Harness {
        pub dispatcher: CommandDispatcher,
        pub platform: Arc<ConsolePlatform>,
    }

    impl Harness {
        pub fn new(definitions: Vec<patto_commands::CommandDefinition>) -> Self {
            let registry = Arc::new(CommandRegistry::load(definitions).unwrap());
            let platform = Arc::new(ConsolePlatform::seeded());
            let dispatcher = CommandDispatcher::new(
                registry,
                Arc::new(PluginScopes::new()),
                platform.clone(),
                "!",
            );
            Self { dispatcher, platform }
        }

        pub fn invoker(&self, username: &str) -> Invoker {
            let user = self.platform.find_user(username).unwrap();
            Invoker::in_guild(self.platform.member_of(user), CONSOLE_CHANNEL)
        }

        /// Run a text message as `owner` and return the outcome and the first embed.
        pub async fn say(&self, content: &str) -> (ExecutionOutcome, Embed) {
            let responder = Arc::new(BufferedResponder::new());
            let outcome = self
                .dispatcher
                .handle_message(content, self.invoker("owner"), responder.clone())
                .await
                .unwrap();
            let embed = responder
                .payloads()
                .into_iter()
                .flat_map(|(_, p)| p.embeds)
                .last()
                .unwrap_or_default();
            (outcome, embed)
        }
    }
}
