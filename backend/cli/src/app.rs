//! Wires registry, plugins, platform, and dispatcher together.

use std::sync::Arc;

use anyhow::{Context, Result};
use patto_commands::{
    CommandDispatcher, CommandRegistry, PluginScope, PluginScopes, RegistrationReport,
    SchemaRegistrar,
};
use patto_components::ComponentRegistry;
use patto_plugins::{AuditPlugin, CooldownPlugin, CooldownPolicy, PermissionsPlugin};
use tracing::info;

use crate::commands;
use crate::platform::ConsolePlatform;
use crate::router::EventRouter;

/// Plugins applied by scope, in execution order.
pub fn plugin_scopes() -> PluginScopes {
    PluginScopes::new()
        .with(PluginScope::DeepFolder(String::new()), Arc::new(AuditPlugin::new()))
        .with(PluginScope::DeepFolder(String::new()), Arc::new(PermissionsPlugin::new()))
        .with(
            PluginScope::DeepFolder("info".into()),
            Arc::new(CooldownPlugin::new(CooldownPolicy::default())),
        )
}

pub struct App {
    pub router: EventRouter,
    pub platform: Arc<ConsolePlatform>,
    pub components: ComponentRegistry,
}

impl App {
    pub fn build(prefix: &str, text_commands: bool) -> Result<Self> {
        let components = ComponentRegistry::new();
        let registry = CommandRegistry::load(commands::definitions(&components))
            .context("Failed to load commands")?;
        let platform = Arc::new(ConsolePlatform::seeded());

        let dispatcher = CommandDispatcher::new(
            Arc::new(registry),
            Arc::new(plugin_scopes()),
            platform.clone(),
            prefix,
        );
        let router = EventRouter::new(Arc::new(dispatcher), components.clone(), text_commands);
        Ok(Self { router, platform, components })
    }

    /// Publish the structured command schemas through the platform.
    pub async fn register_commands(&self) -> Result<RegistrationReport> {
        let dispatcher = self.router.dispatcher();
        let registrar = SchemaRegistrar::new(Arc::clone(dispatcher.plugins()), self.platform.clone());
        let report = registrar.register(dispatcher.registry()).await?;
        info!(
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            ghosts = ?report.ghosts,
            "Application commands registered"
        );
        Ok(report)
    }

    pub async fn shutdown(&self) {
        self.components.clear().await;
        info!("Bot stopped");
    }
}
