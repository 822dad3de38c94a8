//! Plugin contract and scoped plugin registry.
//!
//! Plugins intercept two lifecycles: schema registration and command
//! execution. Hooks not overridden are no-ops.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use patto_core::CommandResult;

use crate::context::CommandContext;
use crate::registry::normalize_key;
use crate::schema::{CommandSchema, RegisteredCommand};
use crate::types::CommandEntry;

/// Result of a before-execute hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Cancel silently; the plugin answers the user itself if it wants to.
    Stop,
}

/// Result of a before-register hook.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterDecision {
    Keep,
    Replace(CommandSchema),
    /// Leave the command out of the published set.
    Skip,
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    async fn before_register(
        &self,
        _entry: &CommandEntry,
        _draft: &CommandSchema,
    ) -> Result<RegisterDecision> {
        Ok(RegisterDecision::Keep)
    }

    async fn after_register(&self, _entry: &CommandEntry, _registered: &RegisteredCommand) -> Result<()> {
        Ok(())
    }

    async fn before_execute(&self, _ctx: &CommandContext) -> CommandResult<Flow> {
        Ok(Flow::Continue)
    }

    async fn after_execute(&self, _ctx: &CommandContext) -> CommandResult<()> {
        Ok(())
    }
}

/// Which commands a scoped plugin applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginScope {
    /// Commands whose source sits directly in this folder.
    Folder(String),
    /// Commands anywhere under this folder.
    DeepFolder(String),
    /// Named commands (key, or space-separated name).
    Specified(Vec<String>),
}

impl PluginScope {
    pub fn applies_to(&self, entry: &CommandEntry) -> bool {
        match self {
            PluginScope::Folder(folder) => parent_folder(&entry.source_path) == trim_folder(folder),
            PluginScope::DeepFolder(folder) => {
                let folder = trim_folder(folder);
                let parent = parent_folder(&entry.source_path);
                folder.is_empty()
                    || parent == folder
                    || parent.strip_prefix(folder).is_some_and(|rest| rest.starts_with('/'))
            }
            PluginScope::Specified(names) => names.iter().any(|n| normalize_key(n) == entry.key),
        }
    }
}

fn trim_folder(folder: &str) -> &str {
    folder.trim_matches('/')
}

fn parent_folder(path: &str) -> &str {
    path.trim_matches('/').rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Plugins attached by scope at startup.
#[derive(Clone, Default)]
pub struct PluginScopes {
    scoped: Vec<(PluginScope, Arc<dyn Plugin>)>,
}

impl PluginScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scope: PluginScope, plugin: Arc<dyn Plugin>) {
        tracing::debug!("[Plugins] Scoped plugin `{}` registered for {:?}", plugin.name(), scope);
        self.scoped.push((scope, plugin));
    }

    pub fn with(mut self, scope: PluginScope, plugin: Arc<dyn Plugin>) -> Self {
        self.register(scope, plugin);
        self
    }

    pub fn clear(&mut self) {
        self.scoped.clear();
    }

    pub fn len(&self) -> usize {
        self.scoped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scoped.is_empty()
    }

    /// Directly attached plugins first, then scoped ones in registration order.
    pub fn plugins_for(&self, entry: &CommandEntry) -> Vec<Arc<dyn Plugin>> {
        let mut plugins = entry.plugins.clone();
        plugins.extend(
            self.scoped
                .iter()
                .filter(|(scope, _)| scope.applies_to(entry))
                .map(|(_, plugin)| Arc::clone(plugin)),
        );
        plugins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommandRegistry;
    use crate::test_support::{NoopHandler, RecordingPlugin};
    use crate::types::{CommandDefinition, CommandOptions, SubcommandGroupOptions};

    fn registry() -> CommandRegistry {
        CommandRegistry::load(vec![
            CommandDefinition::new("info/ping")
                .command(CommandOptions::new("ping", "Ping"))
                .plugin(RecordingPlugin::shared("direct", Default::default()))
                .run(NoopHandler),
            CommandDefinition::new("admin/server/config-set")
                .group(SubcommandGroupOptions::new("server", "config", "set", "Set"))
                .run(NoopHandler),
        ])
        .unwrap()
    }

    fn names(plugins: &[Arc<dyn Plugin>]) -> Vec<String> {
        plugins.iter().map(|p| p.name().to_string()).collect()
    }

    #[test]
    fn folder_scopes() {
        let registry = registry();
        let ping = registry.get("ping").unwrap();
        let set = registry.get("server config set").unwrap();

        assert!(PluginScope::Folder("info".into()).applies_to(&ping));
        assert!(!PluginScope::Folder("admin".into()).applies_to(&set));
        assert!(PluginScope::DeepFolder("admin".into()).applies_to(&set));
        assert!(PluginScope::DeepFolder("/admin/".into()).applies_to(&set));
        assert!(!PluginScope::DeepFolder("adm".into()).applies_to(&set));
        assert!(PluginScope::Specified(vec!["Server Config Set".into()]).applies_to(&set));
    }

    #[test]
    fn direct_plugins_come_first() {
        let registry = registry();
        let ping = registry.get("ping").unwrap();
        let mut scopes = PluginScopes::new()
            .with(PluginScope::DeepFolder("".into()), RecordingPlugin::shared("all", Default::default()))
            .with(PluginScope::Folder("info".into()), RecordingPlugin::shared("info", Default::default()));

        assert_eq!(names(&scopes.plugins_for(&ping)), vec!["direct", "all", "info"]);

        scopes.clear();
        assert_eq!(names(&scopes.plugins_for(&ping)), vec!["direct"]);
    }
}
