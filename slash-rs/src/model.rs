//! Platform objects resolved from an interaction.
//!
//! These are plain data carriers filled in by the gateway adapter; the
//! framework only reads them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::permission::Permissions;

/// Platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snowflake(pub u64);

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A platform user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn new(id: impl Into<Snowflake>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bot: false,
        }
    }
}

/// A user in the context of a guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: User,
    pub nick: Option<String>,
    pub roles: Vec<Snowflake>,
    pub permissions: Permissions,
}

impl Member {
    pub fn new(user: User, permissions: Permissions) -> Self {
        Self {
            user,
            nick: None,
            roles: Vec::new(),
            permissions,
        }
    }

    /// Nickname if set, otherwise the user name
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.name)
    }
}

/// A guild channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    pub name: String,
    /// Platform channel type code
    #[serde(rename = "type")]
    pub kind: u8,
}

/// A guild role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub position: i32,
}

/// An uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Snowflake,
    pub filename: String,
    pub url: String,
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Anything a mentionable option may resolve to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mentionable {
    User(User),
    Role(Role),
    Channel(Channel),
}

impl Mentionable {
    pub fn id(&self) -> Snowflake {
        match self {
            Mentionable::User(user) => user.id,
            Mentionable::Role(role) => role.id,
            Mentionable::Channel(channel) => channel.id,
        }
    }
}
