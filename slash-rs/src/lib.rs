//! # slash: declarative slash commands
//!
//! Resolve, validate and execute chat-platform slash commands declared as a
//! tree of [`Command`]s with typed, self-validating [`Argument`]s.
//!
//! ## Core Principles
//!
//! - **Declare, don't parse**: arguments carry their own extraction, default,
//!   mapping and filtering rules
//! - **Explicit results**: handlers return [`CommandResult`], user-facing
//!   failures are values rather than thrown strings
//! - **Frozen registry**: commands are registered once, then shared read-only
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use slash::{Argument, ArgumentKind, Command, Lifecycle, Permissions, RegistryBuilder};
//!
//! let mut builder = RegistryBuilder::new();
//! builder.register(
//!     Command::new("ping", "Check the bot is alive")
//!         .run(|_source, _args| Box::pin(async { Ok("pong".into()) })),
//! )?;
//! let registry = builder.initialize().await?;
//!
//! let outcome = Lifecycle::default().dispatch(&registry, &interaction).await;
//! if let Some(message) = outcome.into_response() {
//!     transport.reply(&interaction, message).await?;
//! }
//! ```

pub mod argument;
pub mod command;
pub mod error;
pub mod events;
pub mod interaction;
pub mod lifecycle;
pub mod message;
pub mod model;
pub mod permission;
pub mod registry;
pub mod tracing_support;

pub use argument::{
    Argument, ArgumentBuilder, ArgumentError, ArgumentKind, ArgumentOutcome, ArgumentValue,
    Arguments, ValidationFailure,
};
pub use command::{Command, CommandHandler, CommandNode, NodeId};
pub use error::ConfigError;
pub use events::{
    EventBinding, EventBindings, EventBus, EventName, EventRouter, GatewayEvent, Handler,
    Listener, ListenerOptions,
};
pub use interaction::{Interaction, InteractionData, OptionError};
pub use lifecycle::{CheckOutcome, Lifecycle, Outcome};
pub use message::{Embed, Formatting, Message, Messages};
pub use model::{Attachment, Channel, Member, Mentionable, Role, Snowflake, User};
pub use permission::{MissingPermissions, Permissions};
pub use registry::{CommandRegistry, RegistryBuilder};

pub use tracing_support::{LogConfig, LogFormat};
#[cfg(feature = "subscriber")]
pub use tracing_support::{init_logging, LogInitError};

pub use slash_api;

/// Handler result type.
///
/// Handlers return `CommandResult`; `Ok` carries what to send back.
pub type CommandResult = Result<Reply, CommandError>;

// ============================================================================
// Error Types
// ============================================================================

/// Failure raised by a command handler.
///
/// Distinguishes between messages meant for the requester and internal
/// failures that go through the command's fallback.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Shown verbatim to the requester in an error embed.
    #[error("{0}")]
    User(String),

    /// Internal failure, handed to the command's `catch` fallback.
    #[error(transparent)]
    System(#[from] anyhow::Error),
}

impl CommandError {
    /// Convenience constructor for user errors.
    pub fn user(message: impl Into<String>) -> Self {
        CommandError::User(message.into())
    }

    /// Convenience constructor for system errors.
    pub fn system(error: impl Into<anyhow::Error>) -> Self {
        CommandError::System(error.into())
    }

    pub fn is_user(&self) -> bool {
        matches!(self, CommandError::User(_))
    }
}

// ============================================================================
// Reply Types
// ============================================================================

/// What a handler sends back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Reply {
    /// No response.
    #[default]
    None,

    /// Text shown as the description of an embed.
    Text(String),

    /// A fully built message.
    Message(Message),
}

impl Reply {
    /// Check if the reply sends nothing. Empty text counts as nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Reply::None => true,
            Reply::Text(text) => text.is_empty(),
            Reply::Message(_) => false,
        }
    }

    /// Normalize into a deliverable message, `None` when empty.
    pub fn into_message(self) -> Option<Message> {
        match self {
            Reply::None => None,
            Reply::Text(text) if text.is_empty() => None,
            Reply::Text(text) => Some(Message::embed(Embed::new().description(text))),
            Reply::Message(message) => Some(message),
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<Message> for Reply {
    fn from(message: Message) -> Self {
        Reply::Message(message)
    }
}

impl From<Embed> for Reply {
    fn from(embed: Embed) -> Self {
        Reply::Message(Message::embed(embed))
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::None
    }
}

// ============================================================================
// Tests
// ============================================================================
