//! Configuration errors raised while declaring and registering commands.

use thiserror::Error;

use crate::argument::ArgumentKind;

/// Invalid command or argument declaration
///
/// These are programming errors: the registry records the first one and
/// refuses to initialize.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Command \"{path}\" is already registered")]
    DuplicateCommand { path: String },

    #[error("Argument \"{argument}\" is declared twice on \"{command}\"")]
    DuplicateArgument { argument: String, command: String },

    #[error("Required argument \"{argument}\" follows an optional one on \"{command}\"")]
    RequiredAfterOptional { argument: String, command: String },

    #[error("Argument \"{argument}\" has a filter but no error message")]
    FilterWithoutError { argument: String },

    #[error("Argument \"{argument}\" is required and cannot have a default")]
    DefaultOnRequired { argument: String },

    #[error("Default of argument \"{argument}\" is not a {expected} value")]
    DefaultKindMismatch {
        argument: String,
        expected: ArgumentKind,
    },

    #[error("Argument \"{argument}\" is required and cannot use ignore_if_defined")]
    IgnoreIfDefinedOnRequired { argument: String },

    #[error("Command \"{command}\" nests deeper than command, group and subcommand")]
    TooDeep { command: String },

    #[error("Parent command {parent} does not exist")]
    UnknownParent { parent: usize },
}
