use serde::{Deserialize, Serialize};

/// Accent colors used by the built-in reply styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedColor {
    Error,
    Success,
    Warning,
    #[default]
    Info,
    Notice,
}

impl EmbedColor {
    pub fn hex(&self) -> &'static str {
        match self {
            EmbedColor::Error => "#ca5c5c",
            EmbedColor::Success => "#6ec06c",
            EmbedColor::Warning => "#d49954",
            EmbedColor::Info => "#5180d6",
            EmbedColor::Notice => "#ffa500",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Structured content block. Rendering is up to the platform adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: EmbedColor,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl Embed {
    pub fn new(color: EmbedColor) -> Self {
        Self { color, ..Default::default() }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField { name: name.into(), value: value.into(), inline });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Reply bundle: text, embeds, and opaque ids of attached interactive components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub content: Option<String>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub components: Vec<String>,
    /// Only visible to the invoker, where the platform supports it.
    #[serde(default)]
    pub ephemeral: bool,
}

impl ReplyPayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Default::default() }
    }

    pub fn embed(embed: Embed) -> Self {
        Self { embeds: vec![embed], ..Default::default() }
    }

    pub fn with_component(mut self, custom_id: impl Into<String>) -> Self {
        self.components.push(custom_id.into());
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

impl From<&str> for ReplyPayload {
    fn from(s: &str) -> Self {
        ReplyPayload::text(s)
    }
}

impl From<String> for ReplyPayload {
    fn from(s: String) -> Self {
        ReplyPayload::text(s)
    }
}

impl From<Embed> for ReplyPayload {
    fn from(e: Embed) -> Self {
        ReplyPayload::embed(e)
    }
}
