//! slash-api: wire-schema types for command registration
//!
//! These are the declarative objects handed to the platform's registration
//! API. Field names and numeric option types follow the platform's JSON shape.

use serde::{Deserialize, Serialize};

/// Application command type for chat-input (slash) commands
pub const CHAT_INPUT: u8 = 1;

/// Option type as understood by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OptionType {
    Subcommand,
    SubcommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl From<OptionType> for u8 {
    fn from(kind: OptionType) -> Self {
        match kind {
            OptionType::Subcommand => 1,
            OptionType::SubcommandGroup => 2,
            OptionType::String => 3,
            OptionType::Integer => 4,
            OptionType::Boolean => 5,
            OptionType::User => 6,
            OptionType::Channel => 7,
            OptionType::Role => 8,
            OptionType::Mentionable => 9,
            OptionType::Number => 10,
            OptionType::Attachment => 11,
        }
    }
}

impl TryFrom<u8> for OptionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => OptionType::Subcommand,
            2 => OptionType::SubcommandGroup,
            3 => OptionType::String,
            4 => OptionType::Integer,
            5 => OptionType::Boolean,
            6 => OptionType::User,
            7 => OptionType::Channel,
            8 => OptionType::Role,
            9 => OptionType::Mentionable,
            10 => OptionType::Number,
            11 => OptionType::Attachment,
            other => return Err(format!("unknown option type {}", other)),
        })
    }
}

/// Value of a predefined choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Integer(i64),
    Number(f64),
    String(String),
}

/// A predefined choice offered to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: ChoiceValue,
}

impl OptionChoice {
    pub fn new(name: impl Into<String>, value: ChoiceValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Kind-specific constraints carried alongside an argument option
///
/// The framework never interprets these; they are merged into the option
/// object as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionExtras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<OptionChoice>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_types: Option<Vec<u8>>,
}

impl OptionExtras {
    /// Check if no extra constraint is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Option descriptor: a subcommand, a subcommand group, or an argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSchema {
    #[serde(rename = "type")]
    pub kind: OptionType,

    pub name: String,

    pub description: String,

    /// Only meaningful for argument options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(flatten)]
    pub extras: OptionExtras,

    /// Nested options (children of subcommands and groups)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSchema>,
}

impl OptionSchema {
    /// Create an argument option
    pub fn argument(
        kind: OptionType,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: Some(required),
            extras: OptionExtras::default(),
            options: Vec::new(),
        }
    }

    /// Create a subcommand or subcommand group option
    pub fn command(
        kind: OptionType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: None,
            extras: OptionExtras::default(),
            options: Vec::new(),
        }
    }

    /// Merge kind-specific extras
    pub fn extras(mut self, extras: OptionExtras) -> Self {
        self.extras = extras;
        self
    }

    /// Add a nested option
    pub fn option(mut self, option: OptionSchema) -> Self {
        self.options.push(option);
        self
    }
}

/// Top-level command descriptor sent to the registration API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSchema {
    #[serde(rename = "type")]
    pub kind: u8,

    pub name: String,

    pub description: String,

    #[serde(default)]
    pub options: Vec<OptionSchema>,

    /// Stringified permission bitfield, absent when no permission is required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,
}

impl CommandSchema {
    /// Create a new chat-input command
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: CHAT_INPUT,
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            default_member_permissions: None,
        }
    }

    /// Add an option
    pub fn option(mut self, option: OptionSchema) -> Self {
        self.options.push(option);
        self
    }

    /// Set the default member permissions from a raw bitfield
    pub fn default_member_permissions(mut self, bits: u64) -> Self {
        self.default_member_permissions = (bits != 0).then(|| bits.to_string());
        self
    }
}
