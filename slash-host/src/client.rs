//! The client: owns the frozen registry and wires it onto an event bus.
//!
//! # Example
//!
//! ```ignore
//! let client = ClientBuilder::new(ClientConfig::from_path("slash.json")?)
//!     .command(ping())
//!     .command(moderation())
//!     .handler(Arc::new(Greeter::default()))
//!     .build(responder, publisher)
//!     .await?;
//!
//! let bus = LocalEventBus::new();
//! client.init(&bus);
//!
//! // Feed gateway events into the bus
//! bus.emit(EventName::Ready, GatewayEvent::Ready).await;
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use slash::{
    Command, CommandRegistry, EventBus, EventRouter, GatewayEvent, Handler, Interaction,
    Lifecycle, Outcome, RegistryBuilder, Snowflake,
};

use crate::config::ClientConfig;
use crate::error::HostError;
use crate::handlers::{CommandDispatcher, ReadyHandler};
use crate::transport::{CommandPublisher, Responder};

/// Shared handler type accepted by the client
pub type SharedHandler<R> = Arc<dyn Handler<GatewayEvent<R>>>;

/// Collects commands and handlers before the registry is frozen
pub struct ClientBuilder<R: Interaction> {
    config: ClientConfig,
    registry: RegistryBuilder<R>,
    handlers: Vec<SharedHandler<R>>,
}

impl<R: Interaction> ClientBuilder<R> {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            registry: RegistryBuilder::new(),
            handlers: Vec::new(),
        }
    }

    /// Register a root command.
    ///
    /// A declaration error is kept and returned by [`build`](Self::build).
    pub fn command(mut self, command: Command<R>) -> Self {
        let _ = self.registry.register(command);
        self
    }

    /// Add a free-standing event handler
    pub fn handler(mut self, handler: SharedHandler<R>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Freeze the registry and create the client
    pub async fn build(
        self,
        responder: Arc<dyn Responder<R>>,
        publisher: Arc<dyn CommandPublisher>,
    ) -> Result<Client<R>, HostError> {
        let registry = self.registry.initialize().await?;
        let lifecycle = Lifecycle::new(self.config.messages.clone());

        Ok(Client {
            inner: Arc::new(ClientInner {
                config: self.config,
                registry: Arc::new(registry),
                lifecycle,
                handlers: self.handlers,
                responder,
                publisher,
                initialized: AtomicBool::new(false),
                published: AtomicBool::new(false),
            }),
        })
    }
}

struct ClientInner<R: Interaction> {
    config: ClientConfig,
    registry: Arc<CommandRegistry<R>>,
    lifecycle: Lifecycle,
    handlers: Vec<SharedHandler<R>>,
    responder: Arc<dyn Responder<R>>,
    publisher: Arc<dyn CommandPublisher>,
    initialized: AtomicBool,
    published: AtomicBool,
}

/// Cheaply cloneable handle to the running client
pub struct Client<R: Interaction> {
    inner: Arc<ClientInner<R>>,
}

impl<R: Interaction> Clone for Client<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Interaction> fmt::Debug for Client<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("commands", &self.inner.registry.len())
            .field("handlers", &self.inner.handlers.len())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl<R: Interaction> Client<R> {
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<CommandRegistry<R>> {
        &self.inner.registry
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.inner.lifecycle
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    pub fn commands_published(&self) -> bool {
        self.inner.published.load(Ordering::SeqCst)
    }

    /// Bind built-in handlers, user handlers and command hooks onto `bus`.
    ///
    /// Runs once; later calls bind nothing. Returns the number of listeners
    /// bound.
    pub fn init<B>(&self, bus: &B) -> usize
    where
        B: EventBus<GatewayEvent<R>> + ?Sized,
    {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("Client already initialized");
            return 0;
        }

        let mut bound = 0;

        if self.inner.config.register_command_handler {
            bound += bind_handler(bus, Arc::new(CommandDispatcher::new(self.clone())));
        }
        bound += bind_handler(bus, Arc::new(ReadyHandler::new(self.clone())));

        for handler in &self.inner.handlers {
            bound += bind_handler(bus, handler.clone());
        }

        for (_, node) in self.inner.registry.iter() {
            bound += EventRouter::bind(bus, node.hooks().to_vec());
        }

        tracing::info!(listeners = bound, "Client initialized");
        bound
    }

    /// Publish the schema of every enabled root command.
    ///
    /// Publishing happens at most once per client: returns `Ok(false)` when
    /// commands were already published. A failed attempt can be retried.
    pub async fn publish_commands(&self, guild: Option<Snowflake>) -> Result<bool, HostError> {
        if !self.is_initialized() {
            return Err(HostError::NotInitialized);
        }

        if self.inner.published.swap(true, Ordering::SeqCst) {
            tracing::debug!("Commands already published");
            return Ok(false);
        }

        let schemas = self.inner.registry.command_schemas();
        let count = schemas.len();

        match self.inner.publisher.set_commands(schemas, guild).await {
            Ok(()) => {
                tracing::info!(commands = count, guild = ?guild, "Commands published");
                Ok(true)
            }
            Err(err) => {
                self.inner.published.store(false, Ordering::SeqCst);
                Err(HostError::Publish(err))
            }
        }
    }

    /// Run an interaction through the lifecycle and deliver the response.
    ///
    /// Interactions that are not chat-input commands are ignored.
    pub async fn handle_interaction(&self, source: &R) -> Result<Outcome, HostError> {
        if !source.is_chat_input() {
            return Ok(Outcome::Unresolved);
        }

        let outcome = self
            .inner
            .lifecycle
            .dispatch(&self.inner.registry, source)
            .await;

        if let Some(mut message) = outcome.clone().into_response() {
            message.apply_formatting(&self.inner.config.formatting);
            self.inner
                .responder
                .reply(source, message)
                .await
                .map_err(HostError::Delivery)?;
        }

        Ok(outcome)
    }
}

fn bind_handler<R, B>(bus: &B, handler: SharedHandler<R>) -> usize
where
    R: Interaction,
    B: EventBus<GatewayEvent<R>> + ?Sized,
{
    handler.init();
    EventRouter::bind(bus, handler.events())
}
