//! Structured command schema.
//!
//! Builds the nested command → group → subcommand tree the platform
//! expects, and runs the registration lifecycle around publishing it.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use patto_core::ArgValue;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::platform::Platform;
use crate::plugin::{PluginScopes, RegisterDecision};
use crate::registry::CommandRegistry;
use crate::types::{ArgKind, ArgumentDescriptor, CommandEntry};

/// Platform option type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OptionKind {
    Subcommand = 1,
    SubcommandGroup = 2,
    String = 3,
    Integer = 4,
    Boolean = 5,
    User = 6,
    Channel = 7,
    Role = 8,
    Mentionable = 9,
    Number = 10,
    Attachment = 11,
}

impl From<OptionKind> for u8 {
    fn from(kind: OptionKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for OptionKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => OptionKind::Subcommand,
            2 => OptionKind::SubcommandGroup,
            3 => OptionKind::String,
            4 => OptionKind::Integer,
            5 => OptionKind::Boolean,
            6 => OptionKind::User,
            7 => OptionKind::Channel,
            8 => OptionKind::Role,
            9 => OptionKind::Mentionable,
            10 => OptionKind::Number,
            11 => OptionKind::Attachment,
            other => return Err(format!("unknown option type {other}")),
        })
    }
}

impl From<&ArgKind> for OptionKind {
    fn from(kind: &ArgKind) -> Self {
        match kind {
            ArgKind::Number => OptionKind::Number,
            ArgKind::Boolean => OptionKind::Boolean,
            ArgKind::User | ArgKind::Member => OptionKind::User,
            ArgKind::Channel => OptionKind::Channel,
            ArgKind::Role => OptionKind::Role,
            ArgKind::String | ArgKind::Array | ArgKind::Custom(_) => OptionKind::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaChoice {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaOption {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<SchemaChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SchemaOption>,
}

impl SchemaOption {
    fn container(kind: OptionKind, name: &str, description: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            choices: Vec::new(),
            options: Vec::new(),
        }
    }
}

/// One top-level command as published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SchemaOption>,
    /// Decimal permission bit set required to see the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,
}

/// The platform's confirmation for one published command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredCommand {
    pub id: String,
    #[serde(flatten)]
    pub schema: CommandSchema,
}

/// A top-level schema and the entry backing it. Ghost nodes have none.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub schema: CommandSchema,
    pub entry: Option<Arc<CommandEntry>>,
}

impl SchemaNode {
    pub fn is_ghost(&self) -> bool {
        self.entry.is_none()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Bucket {
    base: Option<Arc<CommandEntry>>,
    direct: Vec<Arc<CommandEntry>>,
    grouped: Vec<Arc<CommandEntry>>,
}

pub struct SchemaBuilder<'a> {
    registry: &'a CommandRegistry,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(registry: &'a CommandRegistry) -> Self {
        Self { registry }
    }

    /// One node per top-level word, in first-seen load order.
    pub fn build(&self) -> Vec<SchemaNode> {
        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Bucket> = HashMap::new();

        for entry in self.registry.entries() {
            if self.registry.is_shadowed(entry) {
                continue;
            }
            let words = &entry.descriptor.words;
            let top = words[0].clone();
            let bucket = buckets.entry(top.clone()).or_insert_with(|| {
                order.push(top.clone());
                Bucket::default()
            });
            match words.len() {
                1 => bucket.base = Some(Arc::clone(entry)),
                2 => bucket.direct.push(Arc::clone(entry)),
                _ => bucket.grouped.push(Arc::clone(entry)),
            }
        }

        order
            .into_iter()
            .filter_map(|top| {
                let bucket = buckets.remove(&top)?;
                Some(build_node(&top, bucket))
            })
            .collect()
    }
}

fn build_node(top: &str, bucket: Bucket) -> SchemaNode {
    let mut tree = SubcommandTree::default();

    if let Some(base) = &bucket.base {
        for id in &base.descriptor.declared_subcommands {
            let args = base.arguments.applicable(Some(id));
            tree.insert(id, &base.descriptor.description, &args);
        }
    }

    for entry in bucket.direct.iter().chain(bucket.grouped.iter()) {
        let id = entry.descriptor.words[1..].join(" ");
        let args = entry.arguments.applicable(None);
        tree.insert(&id, &entry.descriptor.description, &args);
    }

    let Some(base) = bucket.base else {
        return SchemaNode {
            schema: CommandSchema {
                name: top.to_string(),
                description: format!("{top} commands"),
                options: tree.into_options(),
                default_member_permissions: None,
            },
            entry: None,
        };
    };

    let options = if tree.is_empty() {
        build_arguments(&base.arguments.applicable(None))
    } else {
        if !base.descriptor.has_subcommands() && !base.arguments.is_empty() {
            warn!("[Schema] `{top}` has subcommands; its own arguments are not published");
        }
        tree.into_options()
    };

    SchemaNode {
        schema: CommandSchema {
            name: top.to_string(),
            description: base.descriptor.description.clone(),
            options,
            default_member_permissions: None,
        },
        entry: Some(base),
    }
}

/// Subcommand and group options under one top-level command, in insertion order.
#[derive(Default)]
struct SubcommandTree {
    options: Vec<SchemaOption>,
}

impl SubcommandTree {
    fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    fn insert(&mut self, id: &str, description: &str, args: &[&ArgumentDescriptor]) {
        let words: Vec<&str> = id.split(' ').collect();
        let mut sub = SchemaOption::container(OptionKind::Subcommand, words[words.len() - 1], description);
        sub.options = build_arguments(args);

        if words.len() == 1 {
            self.options.push(sub);
        } else {
            let group = match self
                .options
                .iter_mut()
                .position(|o| o.kind == OptionKind::SubcommandGroup && o.name == words[0])
            {
                Some(idx) => &mut self.options[idx],
                None => {
                    self.options.push(SchemaOption::container(
                        OptionKind::SubcommandGroup,
                        words[0],
                        &format!("{} commands", words[0]),
                    ));
                    let last = self.options.len() - 1;
                    &mut self.options[last]
                }
            };
            group.options.push(sub);
        }
    }

    fn into_options(self) -> Vec<SchemaOption> {
        self.options
    }
}

/// Required options first; the platform rejects optional-before-required.
fn build_arguments(args: &[&ArgumentDescriptor]) -> Vec<SchemaOption> {
    let mut options: Vec<SchemaOption> = args
        .iter()
        .map(|arg| SchemaOption {
            kind: OptionKind::from(&arg.kind),
            name: arg.name.to_lowercase(),
            description: if arg.description.is_empty() {
                arg.name.clone()
            } else {
                arg.description.clone()
            },
            required: arg.required,
            choices: arg
                .choices
                .iter()
                .map(|c| SchemaChoice { name: c.label.clone(), value: choice_value(&c.value) })
                .collect(),
            options: Vec::new(),
        })
        .collect();
    options.sort_by_key(|o| !o.required);
    options
}

fn choice_value(value: &ArgValue) -> serde_json::Value {
    match value {
        ArgValue::Integer(n) => serde_json::Value::from(*n),
        ArgValue::Float(n) => serde_json::Value::from(*n),
        ArgValue::Bool(b) => serde_json::Value::from(*b),
        other => serde_json::Value::from(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: Vec<String>,
    pub skipped: Vec<String>,
    pub ghosts: Vec<String>,
}

/// Runs before-register hooks, publishes the schema, then after-register hooks.
pub struct SchemaRegistrar {
    plugins: Arc<PluginScopes>,
    platform: Arc<dyn Platform>,
}

impl SchemaRegistrar {
    pub fn new(plugins: Arc<PluginScopes>, platform: Arc<dyn Platform>) -> Self {
        Self { plugins, platform }
    }

    pub async fn register(&self, registry: &CommandRegistry) -> Result<RegistrationReport> {
        let mut report = RegistrationReport::default();
        let mut accepted: Vec<(Option<Arc<CommandEntry>>, CommandSchema)> = Vec::new();

        'nodes: for node in SchemaBuilder::new(registry).build() {
            let Some(entry) = node.entry else {
                report.ghosts.push(node.schema.name.clone());
                accepted.push((None, node.schema));
                continue;
            };

            let mut draft = node.schema;
            for plugin in self.plugins.plugins_for(&entry) {
                match plugin.before_register(&entry, &draft).await {
                    Ok(RegisterDecision::Keep) => {}
                    Ok(RegisterDecision::Replace(schema)) => draft = schema,
                    Ok(RegisterDecision::Skip) => {
                        info!("[Schema] `{}` skipped by plugin `{}`", draft.name, plugin.name());
                        report.skipped.push(draft.name.clone());
                        continue 'nodes;
                    }
                    Err(e) => {
                        warn!("[Schema] Plugin `{}` failed before registering `{}`: {e}", plugin.name(), draft.name);
                    }
                }
            }
            accepted.push((Some(entry), draft));
        }

        let schemas: Vec<CommandSchema> = accepted.iter().map(|(_, s)| s.clone()).collect();
        let confirmed = self.platform.replace_commands(&schemas).await?;
        info!("[Schema] Published {} commands", confirmed.len());

        for registered in &confirmed {
            report.registered.push(registered.schema.name.clone());
            let backing = accepted
                .iter()
                .find(|(_, s)| s.name == registered.schema.name)
                .and_then(|(entry, _)| entry.as_ref());
            let Some(entry) = backing else { continue };
            for plugin in self.plugins.plugins_for(entry) {
                if let Err(e) = plugin.after_register(entry, registered).await {
                    warn!("[Schema] Plugin `{}` failed after registering `{}`: {e}", plugin.name(), registered.schema.name);
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{Plugin, PluginScope};
    use crate::test_support::{NoopHandler, RecordingPlugin, StaticPlatform};
    use crate::types::{
        ArgumentSet, CommandDefinition, CommandOptions, SubcommandGroupOptions, SubcommandOptions,
    };
    use async_trait::async_trait;

    fn config_command() -> CommandDefinition {
        CommandDefinition::new("other/config")
            .command(CommandOptions::new("config", "Bot configuration").subcommands(["get", "set", "list"]))
            .arguments(ArgumentSet::new(vec![
                ArgumentDescriptor::new("key", "clave", ArgKind::String)
                    .required()
                    .only_for(["get", "set"]),
                ArgumentDescriptor::new("value", "valor", ArgKind::String)
                    .required()
                    .only_for(["set"]),
            ]))
            .on_subcommand("get", NoopHandler)
            .on_subcommand("set", NoopHandler)
            .on_subcommand("list", NoopHandler)
    }

    fn option_names(options: &[SchemaOption]) -> Vec<&str> {
        options.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn declared_subcommands_get_filtered_arguments() {
        let registry = CommandRegistry::load(vec![config_command()]).unwrap();
        let nodes = SchemaBuilder::new(&registry).build();
        let schema = &nodes[0].schema;
        assert_eq!(option_names(&schema.options), vec!["get", "set", "list"]);
        assert_eq!(option_names(&schema.options[0].options), vec!["clave"]);
        assert_eq!(option_names(&schema.options[1].options), vec!["clave", "valor"]);
        assert!(schema.options[2].options.is_empty());
        assert!(schema.options.iter().all(|o| o.kind == OptionKind::Subcommand));
    }

    #[test]
    fn ghost_parent_for_orphan_groups() {
        let registry = CommandRegistry::load(vec![
            CommandDefinition::new("server/config-get")
                .group(SubcommandGroupOptions::new("server", "config", "get", "Get a value"))
                .run(NoopHandler),
            CommandDefinition::new("server/config-set")
                .group(SubcommandGroupOptions::new("server", "config", "set", "Set a value"))
                .run(NoopHandler),
            CommandDefinition::new("server/user-info")
                .group(SubcommandGroupOptions::new("server", "user", "info", "Member info"))
                .run(NoopHandler),
        ])
        .unwrap();
        let nodes = SchemaBuilder::new(&registry).build();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_ghost());
        let schema = &nodes[0].schema;
        assert_eq!(schema.description, "server commands");
        assert_eq!(option_names(&schema.options), vec!["config", "user"]);
        assert_eq!(schema.options[0].kind, OptionKind::SubcommandGroup);
        assert_eq!(option_names(&schema.options[0].options), vec!["get", "set"]);
    }

    #[test]
    fn declared_subcommand_wins_over_sibling() {
        let registry = CommandRegistry::load(vec![
            config_command(),
            CommandDefinition::new("other/config-get")
                .subcommand(SubcommandOptions::new("config", "get", "Shadow"))
                .run(NoopHandler),
            CommandDefinition::new("other/config-reset")
                .subcommand(SubcommandOptions::new("config", "reset", "Reset"))
                .run(NoopHandler),
        ])
        .unwrap();
        let nodes = SchemaBuilder::new(&registry).build();
        assert!(!nodes[0].is_ghost());
        let names = option_names(&nodes[0].schema.options);
        assert_eq!(names, vec!["get", "set", "list", "reset"]);
        assert_eq!(nodes[0].schema.options[0].description, "Bot configuration");
    }

    #[test]
    fn plain_command_lists_arguments_required_first() {
        let registry = CommandRegistry::load(vec![
            CommandDefinition::new("user/avatar")
                .command(CommandOptions::new("avatar", "Avatar"))
                .arguments(ArgumentSet::new(vec![
                    ArgumentDescriptor::new("size", "size", ArgKind::Number)
                        .choice("Small", 128i64)
                        .choice("Large", 1024i64),
                    ArgumentDescriptor::new("target", "usuario", ArgKind::Member).required(),
                ]))
                .run(NoopHandler),
        ])
        .unwrap();
        let schema = &SchemaBuilder::new(&registry).build()[0].schema;
        assert_eq!(option_names(&schema.options), vec!["usuario", "size"]);
        assert_eq!(schema.options[0].kind, OptionKind::User);
        assert!(schema.default_member_permissions.is_none());

        let json = serde_json::to_value(schema).unwrap();
        assert_eq!(json["options"][0]["type"], 6);
        assert_eq!(json["options"][0]["required"], true);
        assert!(json["options"][1].get("required").is_none());
        assert_eq!(json["options"][1]["choices"][1]["value"], 1024);
    }

    struct SkipPlugin;

    #[async_trait]
    impl Plugin for SkipPlugin {
        fn name(&self) -> &str {
            "skip"
        }

        async fn before_register(&self, _: &CommandEntry, _: &CommandSchema) -> Result<RegisterDecision> {
            Ok(RegisterDecision::Skip)
        }
    }

    #[tokio::test]
    async fn registrar_runs_hooks_and_skips_ghost_hooks() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = CommandRegistry::load(vec![
            config_command(),
            CommandDefinition::new("info/ping")
                .command(CommandOptions::new("ping", "Ping"))
                .run(NoopHandler),
            CommandDefinition::new("server/config-get")
                .group(SubcommandGroupOptions::new("server", "config", "get", "Get"))
                .plugin(RecordingPlugin::shared("ghost", log.clone()))
                .run(NoopHandler),
        ])
        .unwrap();
        let scopes = PluginScopes::new()
            .with(PluginScope::Folder("other".into()), RecordingPlugin::shared("rec", log.clone()))
            .with(PluginScope::Specified(vec!["ping".into()]), Arc::new(SkipPlugin));
        let platform = Arc::new(StaticPlatform::seeded());

        let report = SchemaRegistrar::new(Arc::new(scopes), platform.clone())
            .register(&registry)
            .await
            .unwrap();

        assert_eq!(report.registered, vec!["config", "server"]);
        assert_eq!(report.skipped, vec!["ping"]);
        assert_eq!(report.ghosts, vec!["server"]);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["rec:before_register:config", "rec:after_register:config"]
        );
        assert_eq!(platform.published().len(), 2);
    }
}
