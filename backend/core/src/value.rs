//! Argument values.
//!
//! The same enum carries raw input (lexically coerced tokens, or options the
//! platform already typed) and resolved output handed to handlers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::{ChannelRef, MemberRef, RoleRef, UserRef};

/// A value produced by a custom argument parser.
#[derive(Clone)]
pub struct CustomValue {
    type_name: String,
    inner: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
        Self { type_name: type_name.into(), inner: Arc::new(value) }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomValue({})", self.type_name)
    }
}

#[derive(Debug, Clone)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
    User(UserRef),
    Member(MemberRef),
    Channel(ChannelRef),
    Role(RoleRef),
    Custom(CustomValue),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Integer(n) => Some(*n as f64),
            ArgValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Integer(n) => Some(*n),
            ArgValue::Float(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ArgValue::Integer(_) | ArgValue::Float(_))
    }

    pub fn kind_name(&self) -> &str {
        match self {
            ArgValue::String(_) => "string",
            ArgValue::Integer(_) | ArgValue::Float(_) => "number",
            ArgValue::Bool(_) => "boolean",
            ArgValue::List(_) => "array",
            ArgValue::User(_) => "user",
            ArgValue::Member(_) => "member",
            ArgValue::Channel(_) => "channel",
            ArgValue::Role(_) => "role",
            ArgValue::Custom(c) => c.type_name(),
        }
    }
}

/// Numbers compare by value regardless of integer/float representation;
/// custom values compare by identity.
impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        use ArgValue::*;
        match (self, other) {
            (String(a), String(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (List(a), List(b)) => a == b,
            (User(a), User(b)) => a == b,
            (Member(a), Member(b)) => a == b,
            (Channel(a), Channel(b)) => a == b,
            (Role(a), Role(b)) => a == b,
            (Custom(a), Custom(b)) => Arc::ptr_eq(&a.inner, &b.inner),
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64() == b.as_f64(),
            _ => false,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::String(s) => write!(f, "{s}"),
            ArgValue::Integer(n) => write!(f, "{n}"),
            ArgValue::Float(n) => write!(f, "{n}"),
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::List(items) => write!(f, "{}", items.join(", ")),
            ArgValue::User(u) => write!(f, "{}", u.mention()),
            ArgValue::Member(m) => write!(f, "{}", m.user.mention()),
            ArgValue::Channel(c) => write!(f, "<#{}>", c.id),
            ArgValue::Role(r) => write!(f, "<@&{}>", r.id),
            ArgValue::Custom(c) => write!(f, "<{}>", c.type_name()),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::String(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::String(s)
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        ArgValue::Integer(n)
    }
}

impl From<f64> for ArgValue {
    fn from(n: f64) -> Self {
        ArgValue::Float(n)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}
