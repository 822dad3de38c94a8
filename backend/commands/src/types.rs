//! Command and argument descriptors.
//!
//! Definitions are plain data handed to the registry by explicit enumeration.
//! A `CommandBlueprint` carries metadata and arguments and can be shared by
//! several concrete definitions; a `CommandDefinition` adds handlers,
//! plugins and the source path used for plugin scoping.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use patto_core::{ArgValue, CommandCategory, Permissions};
use serde::{Deserialize, Serialize};

use crate::dispatch::CommandHandler;
use crate::plugin::Plugin;
use crate::subcommand::method_name;

// ---------------------------------------------------------------------------
// Argument kinds
// ---------------------------------------------------------------------------

/// Declared type of an argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    String,
    Number,
    Boolean,
    Array,
    User,
    Member,
    Channel,
    Role,
    /// Domain type; requires a parser.
    Custom(String),
}

impl ArgKind {
    /// Platform-native reference kinds, resolved by id lookup.
    pub fn is_reference(&self) -> bool {
        matches!(self, ArgKind::User | ArgKind::Member | ArgKind::Channel | ArgKind::Role)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ArgKind::String | ArgKind::Number | ArgKind::Boolean | ArgKind::Array)
    }

    pub fn name(&self) -> &str {
        match self {
            ArgKind::String => "string",
            ArgKind::Number => "number",
            ArgKind::Boolean => "boolean",
            ArgKind::Array => "array",
            ArgKind::User => "user",
            ArgKind::Member => "member",
            ArgKind::Channel => "channel",
            ArgKind::Role => "role",
            ArgKind::Custom(name) => name,
        }
    }

    /// Whether a produced value has this kind.
    pub fn matches(&self, value: &ArgValue) -> bool {
        match (self, value) {
            (ArgKind::String, ArgValue::String(_)) => true,
            (ArgKind::Number, v) => v.is_numeric(),
            (ArgKind::Boolean, ArgValue::Bool(_)) => true,
            (ArgKind::Array, ArgValue::List(_)) => true,
            (ArgKind::User, ArgValue::User(_)) => true,
            (ArgKind::Member, ArgValue::Member(_)) => true,
            (ArgKind::Channel, ArgValue::Channel(_)) => true,
            (ArgKind::Role, ArgValue::Role(_)) => true,
            (ArgKind::Custom(name), ArgValue::Custom(c)) => c.type_name() == name,
            _ => false,
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Argument descriptor
// ---------------------------------------------------------------------------

/// A labelled enumerated value.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgChoice {
    pub label: String,
    pub value: ArgValue,
}

impl ArgChoice {
    pub fn new(label: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        Self { label: label.into(), value: value.into() }
    }
}

/// `Err(None)` fails with a generic message, `Err(Some(reason))` with `reason`.
pub type Validator = Arc<dyn Fn(&ArgValue) -> Result<(), Option<String>> + Send + Sync>;

/// Custom raw → typed conversion.
pub type Parser = Arc<dyn Fn(&ArgValue) -> anyhow::Result<ArgValue> + Send + Sync>;

#[derive(Clone)]
pub struct ArgumentDescriptor {
    /// External name (option name, help text).
    pub name: String,
    /// Lowercase, accent-folded, alphanumeric-only form of `name`.
    pub normalized_name: String,
    /// Key the resolved value is stored under.
    pub property: String,
    pub description: String,
    index: usize,
    pub required: bool,
    /// Captures all remaining text of a text invocation.
    pub raw_text: bool,
    pub choices: Vec<ArgChoice>,
    pub validator: Option<Validator>,
    pub parser: Option<Parser>,
    pub kind: ArgKind,
    /// Subcommands this argument applies to; empty means all.
    pub subcommands: Vec<String>,
}

impl ArgumentDescriptor {
    pub fn new(property: impl Into<String>, name: impl Into<String>, kind: ArgKind) -> Self {
        let name = name.into();
        Self {
            normalized_name: normalize_argument_name(&name),
            name,
            property: property.into(),
            description: String::new(),
            index: 0,
            required: false,
            raw_text: false,
            choices: Vec::new(),
            validator: None,
            parser: None,
            kind,
            subcommands: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn raw_text(mut self) -> Self {
        self.raw_text = true;
        self
    }

    pub fn choice(mut self, label: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.choices.push(ArgChoice::new(label, value));
        self
    }

    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&ArgValue) -> Result<(), Option<String>> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn parse_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&ArgValue) -> anyhow::Result<ArgValue> + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(f));
        self
    }

    pub fn only_for<I, S>(mut self, subcommands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subcommands = subcommands.into_iter().map(|s| s.into().to_lowercase()).collect();
        self
    }

    /// Declaration position; assigned by `ArgumentSet`.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this argument takes part in an invocation of `subcommand`.
    pub fn applies_to(&self, subcommand: Option<&str>) -> bool {
        if self.subcommands.is_empty() {
            return true;
        }
        match subcommand {
            Some(sub) => self.subcommands.iter().any(|s| s.eq_ignore_ascii_case(sub)),
            None => false,
        }
    }
}

impl fmt::Debug for ArgumentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentDescriptor")
            .field("name", &self.name)
            .field("property", &self.property)
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("raw_text", &self.raw_text)
            .field("subcommands", &self.subcommands)
            .finish_non_exhaustive()
    }
}

/// Lowercase, fold common accents, keep `[a-z0-9]` only.
pub fn normalize_argument_name(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Ordered, frozen argument list. Indices follow declaration order.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSet {
    args: Arc<Vec<ArgumentDescriptor>>,
}

impl ArgumentSet {
    pub fn new(args: Vec<ArgumentDescriptor>) -> Self {
        let args = args
            .into_iter()
            .enumerate()
            .map(|(index, mut arg)| {
                arg.index = index;
                arg
            })
            .collect();
        Self { args: Arc::new(args) }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArgumentDescriptor> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Arguments taking part in an invocation of `subcommand`, by index.
    pub fn applicable(&self, subcommand: Option<&str>) -> Vec<&ArgumentDescriptor> {
        self.args.iter().filter(|a| a.applies_to(subcommand)).collect()
    }
}

impl FromIterator<ArgumentDescriptor> for ArgumentSet {
    fn from_iter<T: IntoIterator<Item = ArgumentDescriptor>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Command metadata
// ---------------------------------------------------------------------------

/// Base-command metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    pub name: String,
    pub description: String,
    pub category: Option<CommandCategory>,
    pub aliases: Vec<String>,
    /// Declared subcommand identifiers, `"sub"` or `"group sub"`.
    pub subcommands: Vec<String>,
}

impl CommandOptions {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), ..Default::default() }
    }

    pub fn category(mut self, category: CommandCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn subcommands<I, S>(mut self, subcommands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subcommands = subcommands.into_iter().map(Into::into).collect();
        self
    }
}

/// Two-level metadata: `parent name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcommandOptions {
    pub parent: String,
    pub name: String,
    pub description: String,
    pub category: Option<CommandCategory>,
}

impl SubcommandOptions {
    pub fn new(
        parent: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            parent: parent.into(),
            name: name.into(),
            description: description.into(),
            category: None,
        }
    }

    pub fn category(mut self, category: CommandCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Three-level metadata: `parent group subcommand`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcommandGroupOptions {
    pub parent: String,
    pub group: String,
    pub subcommand: String,
    pub description: String,
    pub category: Option<CommandCategory>,
}

impl SubcommandGroupOptions {
    pub fn new(
        parent: impl Into<String>,
        group: impl Into<String>,
        subcommand: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            parent: parent.into(),
            group: group.into(),
            subcommand: subcommand.into(),
            description: description.into(),
            category: None,
        }
    }

    pub fn category(mut self, category: CommandCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// The metadata level a definition was registered at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandMetadata {
    Command(CommandOptions),
    Subcommand(SubcommandOptions),
    SubcommandGroup(SubcommandGroupOptions),
}

impl CommandMetadata {
    /// Lowercased name words, command → group → subcommand.
    pub fn words(&self) -> Vec<String> {
        let parts: Vec<&str> = match self {
            CommandMetadata::Command(m) => vec![m.name.as_str()],
            CommandMetadata::Subcommand(m) => vec![m.parent.as_str(), m.name.as_str()],
            CommandMetadata::SubcommandGroup(m) => {
                vec![m.parent.as_str(), m.group.as_str(), m.subcommand.as_str()]
            }
        };
        parts
            .iter()
            .flat_map(|p| p.split_whitespace())
            .map(str::to_lowercase)
            .collect()
    }

    pub fn description(&self) -> &str {
        match self {
            CommandMetadata::Command(m) => &m.description,
            CommandMetadata::Subcommand(m) => &m.description,
            CommandMetadata::SubcommandGroup(m) => &m.description,
        }
    }

    pub fn category(&self) -> Option<CommandCategory> {
        match self {
            CommandMetadata::Command(m) => m.category,
            CommandMetadata::Subcommand(m) => m.category,
            CommandMetadata::SubcommandGroup(m) => m.category,
        }
    }
}

/// Metadata plus arguments, shareable between command definitions.
#[derive(Debug, Clone, Default)]
pub struct CommandBlueprint {
    pub command: Option<CommandOptions>,
    pub subcommand: Option<SubcommandOptions>,
    pub group: Option<SubcommandGroupOptions>,
    pub arguments: ArgumentSet,
    pub permissions: Permissions,
}

impl CommandBlueprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, options: CommandOptions) -> Self {
        self.command = Some(options);
        self
    }

    pub fn subcommand(mut self, options: SubcommandOptions) -> Self {
        self.subcommand = Some(options);
        self
    }

    pub fn group(mut self, options: SubcommandGroupOptions) -> Self {
        self.group = Some(options);
        self
    }

    pub fn arguments(mut self, arguments: ArgumentSet) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Most specific level wins: group, then subcommand, then command.
    pub fn metadata(&self) -> Option<CommandMetadata> {
        if let Some(group) = &self.group {
            return Some(CommandMetadata::SubcommandGroup(group.clone()));
        }
        if let Some(sub) = &self.subcommand {
            return Some(CommandMetadata::Subcommand(sub.clone()));
        }
        self.command.clone().map(CommandMetadata::Command)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Explicit dispatch table: the single entry point plus one handler per
/// subcommand, keyed by derived method name (`subcommandAlphaFirst`).
#[derive(Clone, Default)]
pub struct HandlerTable {
    run: Option<Arc<dyn CommandHandler>>,
    methods: HashMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerTable {
    pub fn run(&self) -> Option<&Arc<dyn CommandHandler>> {
        self.run.as_ref()
    }

    pub fn method(&self, method: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.methods.get(method)
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("HandlerTable")
            .field("run", &self.run.is_some())
            .field("methods", &methods)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// One command source handed to the registry.
#[derive(Clone)]
pub struct CommandDefinition {
    /// Location relative to the command root, e.g. `info/ping`.
    pub path: String,
    pub blueprint: CommandBlueprint,
    /// Shared definition consulted when this one declares no metadata.
    pub base: Option<Arc<CommandBlueprint>>,
    pub plugins: Vec<Arc<dyn Plugin>>,
    pub handlers: HandlerTable,
}

impl CommandDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            blueprint: CommandBlueprint::default(),
            base: None,
            plugins: Vec::new(),
            handlers: HandlerTable::default(),
        }
    }

    pub fn command(mut self, options: CommandOptions) -> Self {
        self.blueprint.command = Some(options);
        self
    }

    pub fn subcommand(mut self, options: SubcommandOptions) -> Self {
        self.blueprint.subcommand = Some(options);
        self
    }

    pub fn group(mut self, options: SubcommandGroupOptions) -> Self {
        self.blueprint.group = Some(options);
        self
    }

    pub fn arguments(mut self, arguments: ArgumentSet) -> Self {
        self.blueprint.arguments = arguments;
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.blueprint.permissions = permissions;
        self
    }

    pub fn extends(mut self, base: Arc<CommandBlueprint>) -> Self {
        self.base = Some(base);
        self
    }

    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn run(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.handlers.run = Some(Arc::new(handler));
        self
    }

    /// Bind the handler for subcommand `id` (`"get"`, `"alpha first"`).
    pub fn on_subcommand(mut self, id: &str, handler: impl CommandHandler + 'static) -> Self {
        self.handlers.methods.insert(method_name(id), Arc::new(handler));
        self
    }

    /// Own metadata first, then the base's.
    pub fn metadata(&self) -> Option<CommandMetadata> {
        self.blueprint
            .metadata()
            .or_else(|| self.base.as_ref().and_then(|b| b.metadata()))
    }

    pub fn effective_arguments(&self) -> ArgumentSet {
        match &self.base {
            Some(base) if self.blueprint.arguments.is_empty() => base.arguments.clone(),
            _ => self.blueprint.arguments.clone(),
        }
    }

    pub fn effective_permissions(&self) -> Permissions {
        match &self.base {
            Some(base) if self.blueprint.permissions.is_empty() => base.permissions,
            _ => self.blueprint.permissions,
        }
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("path", &self.path)
            .field("metadata", &self.metadata())
            .field("handlers", &self.handlers)
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Loaded records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandLevel {
    Command,
    Subcommand,
    SubcommandGroup,
}

/// Immutable, validated command description owned by the registry.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    /// Space-joined words, e.g. `server config set`.
    pub name: String,
    pub words: Vec<String>,
    pub description: String,
    pub aliases: Vec<String>,
    pub category: CommandCategory,
    pub declared_subcommands: Vec<String>,
    pub level: CommandLevel,
    pub permissions: Permissions,
}

impl CommandDescriptor {
    pub fn has_subcommands(&self) -> bool {
        !self.declared_subcommands.is_empty()
    }
}

/// A loaded record joining a descriptor to its handlers and lookup key.
pub struct CommandEntry {
    pub descriptor: CommandDescriptor,
    pub arguments: ArgumentSet,
    pub handlers: HandlerTable,
    pub plugins: Vec<Arc<dyn Plugin>>,
    pub source_path: String,
    /// Kebab-joined words; unique across the registry.
    pub key: String,
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("key", &self.key)
            .field("descriptor", &self.descriptor)
            .field("arguments", &self.arguments)
            .field("handlers", &self.handlers)
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("source_path", &self.source_path)
            .finish()
    }
}
