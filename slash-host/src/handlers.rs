//! Built-in handlers bound by [`Client::init`](crate::Client::init).

use std::sync::Arc;

use slash::{EventBinding, EventBindings, EventName, GatewayEvent, Handler, Interaction, Outcome};

use crate::client::Client;
use crate::error::HostError;

/// Routes `interactionCreate` events through the command lifecycle
pub struct CommandDispatcher<R: Interaction> {
    client: Client<R>,
}

impl<R: Interaction> CommandDispatcher<R> {
    pub fn new(client: Client<R>) -> Self {
        Self { client }
    }
}

impl<R: Interaction> Handler<GatewayEvent<R>> for CommandDispatcher<R> {
    fn events(self: Arc<Self>) -> Vec<EventBinding<GatewayEvent<R>>> {
        EventBindings::new(self)
            .on(EventName::InteractionCreate, |dispatcher, event| async move {
                let GatewayEvent::InteractionCreate(interaction) = event else {
                    return Ok(());
                };

                let outcome = dispatcher.client.handle_interaction(&interaction).await?;
                if outcome == Outcome::Unresolved {
                    tracing::trace!(command = interaction.command_name(), "Interaction ignored");
                }
                Ok(())
            })
            .into_bindings()
    }
}

/// Publishes commands on `ready` when configured to
pub struct ReadyHandler<R: Interaction> {
    client: Client<R>,
}

impl<R: Interaction> ReadyHandler<R> {
    pub fn new(client: Client<R>) -> Self {
        Self { client }
    }
}

impl<R: Interaction> Handler<GatewayEvent<R>> for ReadyHandler<R> {
    fn events(self: Arc<Self>) -> Vec<EventBinding<GatewayEvent<R>>> {
        EventBindings::new(self)
            .on(EventName::Ready, |ready, _event| async move {
                let client = &ready.client;
                if !client.is_initialized() {
                    return Err(HostError::NotInitialized.into());
                }

                if client.config().publish_commands_on_ready {
                    client.publish_commands(client.config().guild_id).await?;
                }
                Ok(())
            })
            .into_bindings()
    }
}
