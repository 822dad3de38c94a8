use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform-assigned numeric identifier.
pub type Snowflake = u64;

/// A platform user as seen by command handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Snowflake,
    pub username: String,
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
    pub avatar_url: Option<String>,
}

impl UserRef {
    pub fn new(id: Snowflake, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            global_name: None,
            bot: false,
            avatar_url: None,
        }
    }

    /// Global display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A user in the context of one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    pub user: UserRef,
    pub guild_id: Snowflake,
    pub nickname: Option<String>,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: Snowflake,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: Snowflake,
    pub name: String,
}

/// Permission bit set, using the platform's bit positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const NONE: Self = Self(0);
    pub const KICK_MEMBERS: Self = Self(1 << 1);
    pub const BAN_MEMBERS: Self = Self(1 << 2);
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const MANAGE_CHANNELS: Self = Self(1 << 4);
    pub const MANAGE_GUILD: Self = Self(1 << 5);
    pub const SEND_MESSAGES: Self = Self(1 << 11);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const MANAGE_ROLES: Self = Self(1 << 28);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is present. Administrator implies all.
    pub fn contains(self, other: Self) -> bool {
        if self.0 & Self::ADMINISTRATOR.0 != 0 {
            return true;
        }
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Bits of `self` that `granted` does not cover.
    pub fn missing_from(self, granted: Self) -> Self {
        if granted.contains(Self::ADMINISTRATOR) {
            return Self::NONE;
        }
        Self(self.0 & !granted.0)
    }

    /// Human-readable names of the known bits that are set.
    pub fn names(self) -> Vec<&'static str> {
        const NAMED: &[(Permissions, &str)] = &[
            (Permissions::KICK_MEMBERS, "Kick Members"),
            (Permissions::BAN_MEMBERS, "Ban Members"),
            (Permissions::ADMINISTRATOR, "Administrator"),
            (Permissions::MANAGE_CHANNELS, "Manage Channels"),
            (Permissions::MANAGE_GUILD, "Manage Server"),
            (Permissions::SEND_MESSAGES, "Send Messages"),
            (Permissions::MANAGE_MESSAGES, "Manage Messages"),
            (Permissions::MANAGE_ROLES, "Manage Roles"),
        ];
        NAMED
            .iter()
            .filter(|(bit, _)| self.0 & bit.0 != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who triggered an invocation, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoker {
    pub user: UserRef,
    pub member: Option<MemberRef>,
    pub guild_id: Option<Snowflake>,
    pub channel_id: Snowflake,
}

impl Invoker {
    pub fn in_guild(member: MemberRef, channel_id: Snowflake) -> Self {
        Self {
            user: member.user.clone(),
            guild_id: Some(member.guild_id),
            member: Some(member),
            channel_id,
        }
    }

    pub fn direct(user: UserRef, channel_id: Snowflake) -> Self {
        Self { user, member: None, guild_id: None, channel_id }
    }

    pub fn permissions(&self) -> Permissions {
        self.member.as_ref().map(|m| m.permissions).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Grouping tag used by the help surface. Defaults to the catch-all `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCategory {
    Info,
    #[default]
    Other,
}

impl CommandCategory {
    pub fn all() -> &'static [CommandCategory] {
        &[CommandCategory::Info, CommandCategory::Other]
    }

    pub fn tag(&self) -> &'static str {
        match self {
            CommandCategory::Info => "info",
            CommandCategory::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CommandCategory::Info => "Information",
            CommandCategory::Other => "Other",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CommandCategory::Info => "Commands about the bot and the server.",
            CommandCategory::Other => "Commands that do not fit any other category.",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CommandCategory::Info => "ℹ️",
            CommandCategory::Other => "❓",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.tag().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_implies_everything() {
        let perms = Permissions::ADMINISTRATOR;
        assert!(perms.contains(Permissions::BAN_MEMBERS | Permissions::MANAGE_ROLES));
    }

    #[test]
    fn contains_requires_all_bits() {
        let perms = Permissions::KICK_MEMBERS | Permissions::SEND_MESSAGES;
        assert!(perms.contains(Permissions::KICK_MEMBERS));
        assert!(!perms.contains(Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS));
    }

    #[test]
    fn missing_bits_are_named() {
        let required = Permissions::MANAGE_GUILD | Permissions::BAN_MEMBERS;
        let missing = required.missing_from(Permissions::BAN_MEMBERS);
        assert_eq!(missing, Permissions::MANAGE_GUILD);
        assert_eq!(missing.names(), vec!["Manage Server"]);
        assert!(required.missing_from(Permissions::ADMINISTRATOR).is_empty());
    }

    #[test]
    fn category_defaults_to_other() {
        assert_eq!(CommandCategory::default(), CommandCategory::Other);
        assert_eq!(CommandCategory::from_tag("INFO"), Some(CommandCategory::Info));
        assert_eq!(CommandCategory::from_tag("music"), None);
    }

    #[test]
    fn invoker_without_member_has_no_permissions() {
        let inv = Invoker::direct(UserRef::new(1, "duck"), 10);
        assert!(inv.permissions().is_empty());
    }
}
