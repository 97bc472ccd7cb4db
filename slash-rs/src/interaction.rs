//! Inbound request contract.
//!
//! The gateway client is an external collaborator. It hands the framework an
//! object implementing [`Interaction`], which exposes the invoked command path,
//! one typed accessor per argument kind and the invoking member's permissions.

use std::collections::HashMap;

use thiserror::Error;

use crate::argument::{ArgumentKind, ArgumentValue};
use crate::model::{Attachment, Channel, Member, Mentionable, Role, User};
use crate::permission::Permissions;

/// Rejection raised by a typed accessor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("Missing required option \"{name}\"")]
    Missing { name: String },

    #[error("Option \"{name}\" is not of type {expected}")]
    TypeMismatch { name: String, expected: ArgumentKind },
}

/// An incoming command invocation
///
/// Accessors take the option name and whether it is required. An absent
/// optional value is `Ok(None)`; an absent required value or a value of the
/// wrong type is an [`OptionError`].
pub trait Interaction: Send + Sync + 'static {
    /// Root command name
    fn command_name(&self) -> &str;

    /// Subcommand group name, if the invocation is nested two levels deep
    fn subcommand_group(&self) -> Option<&str>;

    /// Subcommand name, if any
    fn subcommand(&self) -> Option<&str>;

    /// Whether this is a chat-input command invocation
    fn is_chat_input(&self) -> bool {
        true
    }

    /// Permission bits held by the invoking member
    fn member_permissions(&self) -> Permissions;

    fn get_string(&self, name: &str, required: bool) -> Result<Option<String>, OptionError>;
    fn get_integer(&self, name: &str, required: bool) -> Result<Option<i64>, OptionError>;
    fn get_boolean(&self, name: &str, required: bool) -> Result<Option<bool>, OptionError>;
    fn get_user(&self, name: &str, required: bool) -> Result<Option<User>, OptionError>;
    fn get_channel(&self, name: &str, required: bool) -> Result<Option<Channel>, OptionError>;
    fn get_role(&self, name: &str, required: bool) -> Result<Option<Role>, OptionError>;
    fn get_mentionable(&self, name: &str, required: bool)
        -> Result<Option<Mentionable>, OptionError>;
    fn get_number(&self, name: &str, required: bool) -> Result<Option<f64>, OptionError>;
    fn get_attachment(&self, name: &str, required: bool)
        -> Result<Option<Attachment>, OptionError>;
    fn get_member(&self, name: &str, required: bool) -> Result<Option<Member>, OptionError>;
}

/// Owned, already-resolved interaction
///
/// Gateway adapters can translate their payload into this type; it is also
/// what the test-suites use.
#[derive(Debug, Clone)]
pub struct InteractionData {
    pub command_name: String,
    pub subcommand_group: Option<String>,
    pub subcommand: Option<String>,
    pub user: User,
    pub permissions: Permissions,
    pub chat_input: bool,
    pub options: HashMap<String, ArgumentValue>,
}

impl InteractionData {
    pub fn new(command_name: impl Into<String>, user: User) -> Self {
        Self {
            command_name: command_name.into(),
            subcommand_group: None,
            subcommand: None,
            user,
            permissions: Permissions::empty(),
            chat_input: true,
            options: HashMap::new(),
        }
    }

    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.subcommand_group = Some(name.into());
        self
    }

    pub fn subcommand(mut self, name: impl Into<String>) -> Self {
        self.subcommand = Some(name.into());
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: ArgumentValue) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    fn lookup<T>(
        &self,
        name: &str,
        required: bool,
        expected: ArgumentKind,
        convert: impl FnOnce(&ArgumentValue) -> Option<T>,
    ) -> Result<Option<T>, OptionError> {
        match self.options.get(name) {
            Some(value) => convert(value).map(Some).ok_or_else(|| OptionError::TypeMismatch {
                name: name.to_string(),
                expected,
            }),
            None if required => Err(OptionError::Missing {
                name: name.to_string(),
            }),
            None => Ok(None),
        }
    }
}

impl Interaction for InteractionData {
    fn command_name(&self) -> &str {
        &self.command_name
    }

    fn subcommand_group(&self) -> Option<&str> {
        self.subcommand_group.as_deref()
    }

    fn subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    fn is_chat_input(&self) -> bool {
        self.chat_input
    }

    fn member_permissions(&self) -> Permissions {
        self.permissions
    }

    fn get_string(&self, name: &str, required: bool) -> Result<Option<String>, OptionError> {
        self.lookup(name, required, ArgumentKind::String, |v| {
            v.as_str().map(str::to_string)
        })
    }

    fn get_integer(&self, name: &str, required: bool) -> Result<Option<i64>, OptionError> {
        self.lookup(name, required, ArgumentKind::Integer, ArgumentValue::as_i64)
    }

    fn get_boolean(&self, name: &str, required: bool) -> Result<Option<bool>, OptionError> {
        self.lookup(name, required, ArgumentKind::Boolean, ArgumentValue::as_bool)
    }

    fn get_user(&self, name: &str, required: bool) -> Result<Option<User>, OptionError> {
        self.lookup(name, required, ArgumentKind::User, |v| v.as_user().cloned())
    }

    fn get_channel(&self, name: &str, required: bool) -> Result<Option<Channel>, OptionError> {
        self.lookup(name, required, ArgumentKind::Channel, |v| {
            v.as_channel().cloned()
        })
    }

    fn get_role(&self, name: &str, required: bool) -> Result<Option<Role>, OptionError> {
        self.lookup(name, required, ArgumentKind::Role, |v| v.as_role().cloned())
    }

    fn get_mentionable(
        &self,
        name: &str,
        required: bool,
    ) -> Result<Option<Mentionable>, OptionError> {
        self.lookup(name, required, ArgumentKind::Mentionable, |v| match v {
            ArgumentValue::Mentionable(m) => Some(m.clone()),
            ArgumentValue::User(user) => Some(Mentionable::User(user.clone())),
            ArgumentValue::Member(member) => Some(Mentionable::User(member.user.clone())),
            ArgumentValue::Role(role) => Some(Mentionable::Role(role.clone())),
            ArgumentValue::Channel(channel) => Some(Mentionable::Channel(channel.clone())),
            _ => None,
        })
    }

    fn get_number(&self, name: &str, required: bool) -> Result<Option<f64>, OptionError> {
        self.lookup(name, required, ArgumentKind::Number, ArgumentValue::as_f64)
    }

    fn get_attachment(
        &self,
        name: &str,
        required: bool,
    ) -> Result<Option<Attachment>, OptionError> {
        self.lookup(name, required, ArgumentKind::Attachment, |v| {
            v.as_attachment().cloned()
        })
    }

    fn get_member(&self, name: &str, required: bool) -> Result<Option<Member>, OptionError> {
        self.lookup(name, required, ArgumentKind::Member, |v| {
            v.as_member().cloned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction() -> InteractionData {
        InteractionData::new("ban", User::new(1, "mod"))
            .option("count", ArgumentValue::Integer(3))
            .option(
                "target",
                ArgumentValue::Member(Member::new(User::new(2, "bob"), Permissions::empty())),
            )
    }

    #[test]
    fn test_absent_optional_is_none() {
        assert_eq!(interaction().get_string("reason", false), Ok(None));
    }

    #[test]
    fn test_absent_required_is_missing() {
        let err = interaction().get_string("reason", true).unwrap_err();
        assert!(matches!(err, OptionError::Missing { .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let err = interaction().get_string("count", true).unwrap_err();
        assert_eq!(
            err,
            OptionError::TypeMismatch {
                name: "count".into(),
                expected: ArgumentKind::String
            }
        );
    }

    #[test]
    fn test_member_option_reads_as_user() {
        let user = interaction().get_user("target", true).unwrap().unwrap();
        assert_eq!(user.name, "bob");
        let member = interaction().get_member("target", true).unwrap().unwrap();
        assert_eq!(member.display_name(), "bob");
    }

    #[test]
    fn test_integer_reads_as_number() {
        assert_eq!(interaction().get_number("count", true), Ok(Some(3.0)));
    }
}
