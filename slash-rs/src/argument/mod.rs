//! Argument descriptors and the argument pipeline.
//!
//! An [`Argument`] describes one typed input of a command: how to extract it
//! from an [`Interaction`], how to default, map and filter it, and how it is
//! exported to the platform's wire schema.

mod descriptor;
mod value;

pub use descriptor::{
    Argument, ArgumentBuilder, ArgumentDefault, ArgumentError, ArgumentOutcome, DefaultProvider,
    Filter, Mapper, ValidationFailure,
};
pub use value::{ArgumentValue, Arguments, MappedValue};

use std::fmt;

use slash_api::OptionType;

use crate::interaction::{Interaction, OptionError};

/// Kind of value an argument accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
    /// Resolved as a guild member, exported to the platform as `User`
    Member,
}

impl ArgumentKind {
    /// Option type used in the wire schema
    pub fn option_type(self) -> OptionType {
        match self {
            ArgumentKind::String => OptionType::String,
            ArgumentKind::Integer => OptionType::Integer,
            ArgumentKind::Boolean => OptionType::Boolean,
            ArgumentKind::User | ArgumentKind::Member => OptionType::User,
            ArgumentKind::Channel => OptionType::Channel,
            ArgumentKind::Role => OptionType::Role,
            ArgumentKind::Mentionable => OptionType::Mentionable,
            ArgumentKind::Number => OptionType::Number,
            ArgumentKind::Attachment => OptionType::Attachment,
        }
    }

    /// Name of the [`Interaction`] accessor serving this kind
    pub fn accessor(self) -> &'static str {
        match self {
            ArgumentKind::String => "get_string",
            ArgumentKind::Integer => "get_integer",
            ArgumentKind::Boolean => "get_boolean",
            ArgumentKind::User => "get_user",
            ArgumentKind::Channel => "get_channel",
            ArgumentKind::Role => "get_role",
            ArgumentKind::Mentionable => "get_mentionable",
            ArgumentKind::Number => "get_number",
            ArgumentKind::Attachment => "get_attachment",
            ArgumentKind::Member => "get_member",
        }
    }
}

impl ArgumentKind {
    /// Whether the accessor for this kind would return `value`.
    ///
    /// Mapper outputs are accepted for every kind.
    pub fn accepts(self, value: &ArgumentValue) -> bool {
        match (self, value) {
            (_, ArgumentValue::Mapped(_)) => true,
            (ArgumentKind::String, ArgumentValue::String(_))
            | (ArgumentKind::Integer, ArgumentValue::Integer(_))
            | (ArgumentKind::Boolean, ArgumentValue::Boolean(_))
            | (ArgumentKind::Number, ArgumentValue::Number(_) | ArgumentValue::Integer(_))
            | (ArgumentKind::User, ArgumentValue::User(_) | ArgumentValue::Member(_))
            | (ArgumentKind::Channel, ArgumentValue::Channel(_))
            | (ArgumentKind::Role, ArgumentValue::Role(_))
            | (ArgumentKind::Attachment, ArgumentValue::Attachment(_))
            | (ArgumentKind::Member, ArgumentValue::Member(_)) => true,
            (
                ArgumentKind::Mentionable,
                ArgumentValue::Mentionable(_)
                | ArgumentValue::User(_)
                | ArgumentValue::Member(_)
                | ArgumentValue::Role(_)
                | ArgumentValue::Channel(_),
            ) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgumentKind::String => "string",
            ArgumentKind::Integer => "integer",
            ArgumentKind::Boolean => "boolean",
            ArgumentKind::User => "user",
            ArgumentKind::Channel => "channel",
            ArgumentKind::Role => "role",
            ArgumentKind::Mentionable => "mentionable",
            ArgumentKind::Number => "number",
            ArgumentKind::Attachment => "attachment",
            ArgumentKind::Member => "member",
        };
        f.write_str(name)
    }
}

/// Fetch the raw value of `name` through the accessor bound to `kind`
pub fn extract<R: Interaction + ?Sized>(
    kind: ArgumentKind,
    source: &R,
    name: &str,
    required: bool,
) -> Result<Option<ArgumentValue>, OptionError> {
    let value = match kind {
        ArgumentKind::String => source.get_string(name, required)?.map(ArgumentValue::String),
        ArgumentKind::Integer => source
            .get_integer(name, required)?
            .map(ArgumentValue::Integer),
        ArgumentKind::Boolean => source
            .get_boolean(name, required)?
            .map(ArgumentValue::Boolean),
        ArgumentKind::User => source.get_user(name, required)?.map(ArgumentValue::User),
        ArgumentKind::Channel => source
            .get_channel(name, required)?
            .map(ArgumentValue::Channel),
        ArgumentKind::Role => source.get_role(name, required)?.map(ArgumentValue::Role),
        ArgumentKind::Mentionable => source
            .get_mentionable(name, required)?
            .map(ArgumentValue::Mentionable),
        ArgumentKind::Number => source.get_number(name, required)?.map(ArgumentValue::Number),
        ArgumentKind::Attachment => source
            .get_attachment(name, required)?
            .map(ArgumentValue::Attachment),
        ArgumentKind::Member => source.get_member(name, required)?.map(ArgumentValue::Member),
    };

    Ok(value)
}
