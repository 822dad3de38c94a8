//! Argument resolution.
//!
//! Turns raw invocation input into a typed, validated value set. Resolution
//! walks the applicable descriptors in index order and fails fast on the
//! first invalid argument.

use std::collections::HashMap;

use patto_core::{
    ArgValue, ChannelRef, CommandError, CommandResult, CustomValue, Invoker, MemberRef, RoleRef,
    Snowflake, UserRef,
};
use tracing::debug;

use crate::coerce::{coerce_primitive, parse_mention};
use crate::platform::Platform;
use crate::tokenizer::Token;
use crate::types::{ArgKind, ArgumentDescriptor};

/// Raw values for one invocation.
#[derive(Debug, Clone, Copy)]
pub enum RawInput<'a> {
    /// Named options supplied by the platform.
    Structured(&'a HashMap<String, ArgValue>),
    /// Tokens left after subcommand routing. Spans index into `body`.
    Text { tokens: &'a [Token], body: &'a str },
}

/// Resolved values keyed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedArguments {
    values: HashMap<String, ArgValue>,
}

impl ResolvedArguments {
    pub fn insert(&mut self, property: impl Into<String>, value: ArgValue) {
        self.values.insert(property.into(), value);
    }

    pub fn get(&self, property: &str) -> Option<&ArgValue> {
        self.values.get(property)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.values.contains_key(property)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArgValue)> {
        self.values.iter()
    }

    pub fn get_str(&self, property: &str) -> Option<&str> {
        self.get(property).and_then(ArgValue::as_str)
    }

    pub fn get_f64(&self, property: &str) -> Option<f64> {
        self.get(property).and_then(ArgValue::as_f64)
    }

    pub fn get_i64(&self, property: &str) -> Option<i64> {
        self.get(property).and_then(ArgValue::as_i64)
    }

    pub fn get_bool(&self, property: &str) -> Option<bool> {
        self.get(property).and_then(ArgValue::as_bool)
    }

    pub fn get_list(&self, property: &str) -> Option<&[String]> {
        match self.get(property) {
            Some(ArgValue::List(items)) => Some(items),
            _ => None,
        }
    }

    pub fn get_user(&self, property: &str) -> Option<&UserRef> {
        match self.get(property) {
            Some(ArgValue::User(u)) => Some(u),
            Some(ArgValue::Member(m)) => Some(&m.user),
            _ => None,
        }
    }

    pub fn get_member(&self, property: &str) -> Option<&MemberRef> {
        match self.get(property) {
            Some(ArgValue::Member(m)) => Some(m),
            _ => None,
        }
    }

    pub fn get_channel(&self, property: &str) -> Option<&ChannelRef> {
        match self.get(property) {
            Some(ArgValue::Channel(c)) => Some(c),
            _ => None,
        }
    }

    pub fn get_role(&self, property: &str) -> Option<&RoleRef> {
        match self.get(property) {
            Some(ArgValue::Role(r)) => Some(r),
            _ => None,
        }
    }

    pub fn get_custom<T: std::any::Any>(&self, property: &str) -> Option<&T> {
        match self.get(property) {
            Some(ArgValue::Custom(c)) => c.downcast_ref::<T>(),
            _ => None,
        }
    }
}

pub struct ArgumentResolver<'a> {
    platform: &'a dyn Platform,
    invoker: &'a Invoker,
}

impl<'a> ArgumentResolver<'a> {
    pub fn new(platform: &'a dyn Platform, invoker: &'a Invoker) -> Self {
        Self { platform, invoker }
    }

    /// Resolve `args`, already filtered to the routed subcommand and ordered
    /// by index. A text argument's position is its place in this list.
    pub async fn resolve(
        &self,
        args: &[&ArgumentDescriptor],
        input: RawInput<'_>,
    ) -> CommandResult<ResolvedArguments> {
        let mut resolved = ResolvedArguments::default();

        for (position, arg) in args.iter().enumerate() {
            let Some(raw) = extract_raw(arg, position, resolved.len(), input) else {
                if arg.required {
                    return Err(CommandError::validation(format!(
                        "The argument `{}` is required.",
                        arg.name
                    )));
                }
                continue;
            };

            let value = match self.produce(arg, raw, input).await? {
                Some(value) => value,
                None if arg.required => {
                    return Err(CommandError::validation(format!(
                        "Could not find the specified {}.",
                        arg.kind
                    )));
                }
                None => continue,
            };

            check_choices(arg, &value)?;
            run_validator(arg, &value)?;

            resolved.insert(arg.property.clone(), value);
        }

        Ok(resolved)
    }

    async fn produce(
        &self,
        arg: &ArgumentDescriptor,
        raw: ArgValue,
        input: RawInput<'_>,
    ) -> CommandResult<Option<ArgValue>> {
        if let Some(parser) = &arg.parser {
            let value = parser(&raw).map_err(|e| {
                CommandError::validation(format!("Could not parse `{}`: {e}", arg.name))
            })?;
            if !arg.kind.matches(&value) {
                return Err(CommandError::validation(format!(
                    "The parser for `{}` must return a `{}` value.",
                    arg.name, arg.kind
                )));
            }
            return Ok(Some(value));
        }

        if arg.kind.is_reference() {
            return match input {
                // Already resolved by the platform; a mismatched kind counts as absent.
                RawInput::Structured(_) => Ok(Some(raw).filter(|v| arg.kind.matches(v))),
                RawInput::Text { .. } => {
                    let text = raw.to_string();
                    match self.lookup(&arg.kind, &text).await {
                        Some(value) => Ok(Some(value)),
                        None => Err(CommandError::validation(format!(
                            "Could not find the specified {}: `{text}`",
                            arg.kind
                        ))),
                    }
                }
            };
        }

        if !arg.kind.is_primitive() {
            return Err(CommandError::internal(format!(
                "argument `{}` has custom type `{}` and needs a parser",
                arg.name, arg.kind
            )));
        }

        match coerce_primitive(&raw, &arg.kind) {
            Some(value) => Ok(Some(value)),
            None => Err(CommandError::validation(format!(
                "The value of `{}` is invalid. Expected type: `{}`",
                arg.name, arg.kind
            ))),
        }
    }

    /// Mention or bare id → platform entity. Lookup failures count as a miss.
    async fn lookup(&self, kind: &ArgKind, text: &str) -> Option<ArgValue> {
        let id = parse_mention(text, kind)?;
        let result = match kind {
            ArgKind::User => self.platform.fetch_user(id).await.map(|u| u.map(ArgValue::User)),
            ArgKind::Channel => {
                self.platform.fetch_channel(id).await.map(|c| c.map(ArgValue::Channel))
            }
            ArgKind::Member => {
                let guild = self.guild()?;
                self.platform.fetch_member(guild, id).await.map(|m| m.map(ArgValue::Member))
            }
            ArgKind::Role => {
                let guild = self.guild()?;
                self.platform.fetch_role(guild, id).await.map(|r| r.map(ArgValue::Role))
            }
            _ => return None,
        };
        match result {
            Ok(value) => value,
            Err(e) => {
                debug!("[Resolver] {kind} lookup for {id} failed: {e}");
                None
            }
        }
    }

    fn guild(&self) -> Option<Snowflake> {
        self.invoker.guild_id
    }
}

fn extract_raw(
    arg: &ArgumentDescriptor,
    position: usize,
    resolved_before: usize,
    input: RawInput<'_>,
) -> Option<ArgValue> {
    match input {
        RawInput::Structured(options) => options
            .get(&arg.name)
            .or_else(|| options.get(&arg.normalized_name))
            .cloned(),
        RawInput::Text { tokens, body } if arg.raw_text => {
            // Skip one token per earlier argument that produced a value.
            let first = tokens.get(resolved_before)?;
            let rest = body.get(first.start..)?.trim_end();
            (!rest.is_empty()).then(|| ArgValue::String(rest.to_string()))
        }
        RawInput::Text { tokens, .. } => {
            let token = tokens.get(position)?;
            if arg.kind == ArgKind::String {
                Some(ArgValue::String(token.text.clone()))
            } else {
                Some(token.value.clone())
            }
        }
    }
}

fn check_choices(arg: &ArgumentDescriptor, value: &ArgValue) -> CommandResult<()> {
    if arg.choices.is_empty() || arg.choices.iter().any(|c| &c.value == value) {
        return Ok(());
    }
    let valid = arg
        .choices
        .iter()
        .map(|c| format!("`{}` ({})", c.label, c.value))
        .collect::<Vec<_>>()
        .join(", ");
    Err(CommandError::validation(format!(
        "The value of `{}` must be one of: {valid}",
        arg.name
    )))
}

fn run_validator(arg: &ArgumentDescriptor, value: &ArgValue) -> CommandResult<()> {
    let Some(validator) = &arg.validator else {
        return Ok(());
    };
    match validator(value) {
        Ok(()) => Ok(()),
        Err(Some(reason)) => Err(CommandError::validation(reason)),
        Err(None) => Err(CommandError::validation(format!("Value `{value}` is not valid"))),
    }
}

/// Wrap a parsed domain value.
pub fn custom<T: std::any::Any + Send + Sync>(type_name: &str, value: T) -> ArgValue {
    ArgValue::Custom(CustomValue::new(type_name, value))
}
