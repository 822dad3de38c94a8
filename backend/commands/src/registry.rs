//! Command registry: validates definitions at startup and answers lookups.
//!
//! Loading is all-or-nothing for structural errors. A definition without
//! metadata is skipped and counted as failed; anything malformed aborts
//! startup with every problem found for that command.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use patto_core::CommandCategory;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::subcommand::method_name;
use crate::types::{
    CommandDefinition, CommandDescriptor, CommandEntry, CommandLevel, CommandMetadata,
};

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid command word regex"));

/// Maximum words in a command path: command, group, subcommand.
pub const MAX_COMMAND_WORDS: usize = 3;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid command `{command}` ({path}):\n  - {}", issues.join("\n  - "))]
    InvalidCommand { command: String, path: String, issues: Vec<String> },

    #[error("Duplicate command `{key}` in {path} (already defined in {existing})")]
    DuplicateKey { key: String, path: String, existing: String },

    #[error("Alias `{alias}` of `{command}` conflicts with `{existing}`")]
    DuplicateAlias { alias: String, command: String, existing: String },

    #[error(
        "`{parent} {name}` is both a subcommand (in {subcommand}) and a subcommand group (in {group})"
    )]
    NodeConflict { parent: String, name: String, subcommand: String, group: String },

    #[error("No commands were loaded out of {attempted} definitions")]
    NothingLoaded { attempted: usize },
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: Vec<Arc<CommandEntry>>,
    by_key: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    /// Keys of nested entries whose path a base command declares as its own subcommand.
    shadowed: HashSet<String>,
}

impl CommandRegistry {
    pub fn load(definitions: Vec<CommandDefinition>) -> Result<Self, LoadError> {
        let attempted = definitions.len();
        let mut registry = Self::default();
        let mut failed = 0usize;

        for def in definitions {
            let Some(metadata) = def.metadata() else {
                warn!("[Commands] {} declares no command metadata, skipping", def.path);
                failed += 1;
                continue;
            };
            let entry = build_entry(def, metadata)?;
            registry.insert(entry)?;
        }

        info!(
            "[Commands] Loaded {} commands ({} aliases, {} failed)",
            registry.entries.len(),
            registry.aliases.len(),
            failed
        );

        if registry.entries.is_empty() && attempted > 0 {
            return Err(LoadError::NothingLoaded { attempted });
        }
        registry.check_node_names()?;
        registry.mark_shadowed();
        Ok(registry)
    }

    fn insert(&mut self, entry: CommandEntry) -> Result<(), LoadError> {
        if let Some(&idx) = self.by_key.get(&entry.key) {
            return Err(LoadError::DuplicateKey {
                key: entry.key.clone(),
                path: entry.source_path.clone(),
                existing: self.entries[idx].source_path.clone(),
            });
        }
        if let Some(owner) = self.aliases.get(&entry.key) {
            return Err(LoadError::DuplicateAlias {
                alias: entry.key.clone(),
                command: entry.source_path.clone(),
                existing: owner.clone(),
            });
        }

        for alias in &entry.descriptor.aliases {
            let existing = self
                .by_key
                .contains_key(alias)
                .then(|| alias.clone())
                .or_else(|| self.aliases.get(alias).cloned());
            if let Some(existing) = existing {
                return Err(LoadError::DuplicateAlias {
                    alias: alias.clone(),
                    command: entry.key.clone(),
                    existing,
                });
            }
            self.aliases.insert(alias.clone(), entry.key.clone());
        }

        debug!("[Commands] Registered `{}` from {}", entry.descriptor.name, entry.source_path);
        self.by_key.insert(entry.key.clone(), self.entries.len());
        self.entries.push(Arc::new(entry));
        Ok(())
    }

    /// Under one top-level word a name is either a subcommand or a group,
    /// never both.
    fn check_node_names(&self) -> Result<(), LoadError> {
        let mut subcommands: BTreeMap<(String, String), String> = BTreeMap::new();
        let mut groups: BTreeMap<(String, String), String> = BTreeMap::new();

        for entry in &self.entries {
            let words = &entry.descriptor.words;
            let top = words[0].clone();
            match words.len() {
                1 => {
                    for id in &entry.descriptor.declared_subcommands {
                        let sub: Vec<&str> = id.split(' ').collect();
                        let target = if sub.len() == 1 { &mut subcommands } else { &mut groups };
                        target
                            .entry((top.clone(), sub[0].to_string()))
                            .or_insert_with(|| entry.source_path.clone());
                    }
                }
                2 => {
                    subcommands
                        .entry((top, words[1].clone()))
                        .or_insert_with(|| entry.source_path.clone());
                }
                _ => {
                    groups
                        .entry((top, words[1].clone()))
                        .or_insert_with(|| entry.source_path.clone());
                }
            }
        }

        for ((parent, name), subcommand) in subcommands {
            if let Some(group) = groups.get(&(parent.clone(), name.clone())) {
                return Err(LoadError::NodeConflict { parent, name, subcommand, group: group.clone() });
            }
        }
        Ok(())
    }

    fn mark_shadowed(&mut self) {
        for entry in &self.entries {
            let words = &entry.descriptor.words;
            if words.len() < 2 {
                continue;
            }
            let Some(&idx) = self.by_key.get(&words[0]) else {
                continue;
            };
            let id = words[1..].join(" ");
            let base = &self.entries[idx];
            if base.descriptor.declared_subcommands.contains(&id) {
                warn!(
                    "[Commands] `{}` ({}) is shadowed by subcommand `{id}` declared on `{}`",
                    entry.descriptor.name, entry.source_path, base.descriptor.name
                );
                self.shadowed.insert(entry.key.clone());
            }
        }
    }

    /// Whether a base command declares this entry's path as its own
    /// subcommand. Shadowed entries are never detected nor published.
    pub fn is_shadowed(&self, entry: &CommandEntry) -> bool {
        self.shadowed.contains(&entry.key)
    }

    /// Look up by key, space-separated name, or alias. Case-insensitive.
    pub fn get(&self, name: &str) -> Option<Arc<CommandEntry>> {
        let key = normalize_key(name);
        let key = match self.by_key.contains_key(&key) {
            true => key,
            false => self.aliases.get(&key)?.clone(),
        };
        self.by_key.get(&key).map(|&idx| Arc::clone(&self.entries[idx]))
    }

    /// Every entry, in load order.
    pub fn entries(&self) -> &[Arc<CommandEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_category(&self, category: CommandCategory) -> Vec<Arc<CommandEntry>> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .cloned()
            .collect()
    }

    /// Single-word commands.
    pub fn base_commands(&self) -> Vec<Arc<CommandEntry>> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.words.len() == 1)
            .cloned()
            .collect()
    }

    /// Two-word entries under `parent`.
    pub fn subcommands_of(&self, parent: &str) -> Vec<Arc<CommandEntry>> {
        let parent = parent.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.descriptor.words.len() == 2 && e.descriptor.words[0] == parent)
            .cloned()
            .collect()
    }

    /// Three-word entries under `parent`, keyed by group name.
    pub fn subcommand_groups(&self, parent: &str) -> BTreeMap<String, Vec<Arc<CommandEntry>>> {
        let parent = parent.trim().to_lowercase();
        let mut groups: BTreeMap<String, Vec<Arc<CommandEntry>>> = BTreeMap::new();
        for entry in &self.entries {
            let words = &entry.descriptor.words;
            if words.len() == 3 && words[0] == parent {
                groups.entry(words[1].clone()).or_default().push(Arc::clone(entry));
            }
        }
        groups
    }

    pub fn source_path(&self, name: &str) -> Option<String> {
        self.get(name).map(|e| e.source_path.clone())
    }
}

/// `"Server  Config set"` → `server-config-set`.
pub fn normalize_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn build_entry(def: CommandDefinition, metadata: CommandMetadata) -> Result<CommandEntry, LoadError> {
    let words = metadata.words();
    let name = words.join(" ");
    let arguments = def.effective_arguments();
    let mut issues = Vec::new();

    if words.is_empty() {
        issues.push("name is empty".to_string());
    }
    if words.len() > MAX_COMMAND_WORDS {
        issues.push(format!(
            "name has {} words; at most {MAX_COMMAND_WORDS} are allowed",
            words.len()
        ));
    }
    for word in &words {
        if !WORD_RE.is_match(word) {
            issues.push(format!("word `{word}` contains characters outside [a-z0-9-]"));
        }
    }

    let (level, aliases, declared): (CommandLevel, Vec<String>, Vec<String>) = match &metadata {
        CommandMetadata::Command(options) => (
            CommandLevel::Command,
            options.aliases.iter().map(|a| a.trim().to_lowercase()).collect(),
            options
                .subcommands
                .iter()
                .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
                .collect(),
        ),
        CommandMetadata::Subcommand(_) => (CommandLevel::Subcommand, Vec::new(), Vec::new()),
        CommandMetadata::SubcommandGroup(_) => {
            (CommandLevel::SubcommandGroup, Vec::new(), Vec::new())
        }
    };

    if !declared.is_empty() && words.len() > 1 {
        issues.push(format!(
            "only single-word commands can declare subcommands; `{name}` has {} words",
            words.len()
        ));
    }
    for id in &declared {
        let sub_words: Vec<&str> = id.split(' ').collect();
        if sub_words.len() > 2 {
            issues.push(format!("subcommand `{id}` has more than two words"));
        }
        for word in &sub_words {
            if !WORD_RE.is_match(word) {
                issues.push(format!("subcommand word `{word}` contains characters outside [a-z0-9-]"));
            }
        }
        let method = method_name(id);
        if !def.handlers.has_method(&method) {
            issues.push(format!("subcommand `{id}` has no handler (expected `{method}`)"));
        }
    }
    if declared.is_empty() && def.handlers.run().is_none() {
        issues.push("no run handler".to_string());
    }
    for alias in &aliases {
        if !WORD_RE.is_match(alias) {
            issues.push(format!("alias `{alias}` contains characters outside [a-z0-9-]"));
        }
    }

    let raw_text: Vec<_> = arguments.iter().filter(|a| a.raw_text).collect();
    if raw_text.len() > 1 {
        issues.push(format!("{} rawText arguments; at most one is allowed", raw_text.len()));
    }
    if let Some(raw) = raw_text.first() {
        if raw.index() + 1 != arguments.len() {
            issues.push(format!("rawText argument `{}` must be declared last", raw.name));
        }
    }

    let mut seen = HashMap::new();
    for arg in arguments.iter() {
        if let Some(previous) = seen.insert(arg.normalized_name.clone(), arg.name.clone()) {
            issues.push(format!("arguments `{previous}` and `{}` share a name", arg.name));
        }
        if !arg.kind.is_primitive() && !arg.kind.is_reference() && arg.parser.is_none() {
            issues.push(format!(
                "argument `{}` has custom type `{}` and needs a parser",
                arg.name, arg.kind
            ));
        }
        for sub in &arg.subcommands {
            if !declared.iter().any(|d| d == sub) {
                issues.push(format!("argument `{}` targets undeclared subcommand `{sub}`", arg.name));
            }
        }
    }

    if !issues.is_empty() {
        return Err(LoadError::InvalidCommand { command: name, path: def.path, issues });
    }

    let descriptor = CommandDescriptor {
        name,
        description: metadata.description().to_string(),
        aliases,
        category: metadata.category().unwrap_or_default(),
        declared_subcommands: declared,
        level,
        permissions: def.effective_permissions(),
        words: words.clone(),
    };

    Ok(CommandEntry {
        key: words.join("-"),
        descriptor,
        arguments,
        handlers: def.handlers,
        plugins: def.plugins,
        source_path: def.path,
    })
}
