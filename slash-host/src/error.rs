use slash::ConfigError;
use thiserror::Error;

/// Client runtime errors
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Invalid command configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to deliver response: {0:#}")]
    Delivery(#[source] anyhow::Error),

    #[error("Failed to publish commands: {0:#}")]
    Publish(#[source] anyhow::Error),

    #[error("Client not initialized before use, call Client::init first")]
    NotInitialized,
}
