//! Outbound collaborators: response delivery and command publishing.

use async_trait::async_trait;
use slash::{Interaction, Message, Snowflake};
use slash_api::CommandSchema;

/// Sends a response back to whoever issued the interaction
#[async_trait]
pub trait Responder<R: Interaction>: Send + Sync {
    async fn reply(&self, source: &R, message: Message) -> anyhow::Result<()>;
}

/// Registration API that receives the command schema
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Replace the published commands, for one guild or globally
    async fn set_commands(
        &self,
        commands: Vec<CommandSchema>,
        guild: Option<Snowflake>,
    ) -> anyhow::Result<()>;
}
