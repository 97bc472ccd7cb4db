//! Event registration.
//!
//! Handlers and commands declare which gateway events they listen to as a
//! list of [`EventBinding`]s. The [`EventRouter`] hands those bindings to an
//! [`EventBus`] implementation, which owns delivery.
//!
//! # Example
//!
//! ```ignore
//! struct Greeter { greeted: AtomicUsize }
//!
//! impl<R: Interaction> Handler<GatewayEvent<R>> for Greeter {
//!     fn events(self: Arc<Self>) -> Vec<EventBinding<GatewayEvent<R>>> {
//!         EventBindings::new(self)
//!             .once(EventName::Ready, |greeter, _event| async move {
//!                 greeter.greeted.fetch_add(1, Ordering::SeqCst);
//!                 Ok(())
//!             })
//!             .into_bindings()
//!     }
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;

macro_rules! event_names {
    ($($variant:ident => $wire:literal,)*) => {
        /// Gateway events a listener can bind to
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventName {
            $($variant,)*
        }

        impl EventName {
            /// Every known event, in declaration order
            pub const ALL: &'static [EventName] = &[$(EventName::$variant,)*];

            /// Wire name of the event
            pub fn as_str(self) -> &'static str {
                match self {
                    $(EventName::$variant => $wire,)*
                }
            }
        }

        impl FromStr for EventName {
            type Err = UnknownEvent;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                match name {
                    $($wire => Ok(EventName::$variant),)*
                    other => Err(UnknownEvent(other.to_string())),
                }
            }
        }
    };
}

event_names! {
    ApplicationCommandPermissionsUpdate => "applicationCommandPermissionsUpdate",
    CacheSweep => "cacheSweep",
    ChannelCreate => "channelCreate",
    ChannelDelete => "channelDelete",
    ChannelPinsUpdate => "channelPinsUpdate",
    ChannelUpdate => "channelUpdate",
    Debug => "debug",
    Warn => "warn",
    EmojiCreate => "emojiCreate",
    EmojiDelete => "emojiDelete",
    EmojiUpdate => "emojiUpdate",
    Error => "error",
    GuildBanAdd => "guildBanAdd",
    GuildBanRemove => "guildBanRemove",
    GuildCreate => "guildCreate",
    GuildDelete => "guildDelete",
    GuildUnavailable => "guildUnavailable",
    GuildIntegrationsUpdate => "guildIntegrationsUpdate",
    GuildMemberAdd => "guildMemberAdd",
    GuildMemberAvailable => "guildMemberAvailable",
    GuildMemberRemove => "guildMemberRemove",
    GuildMembersChunk => "guildMembersChunk",
    GuildMemberUpdate => "guildMemberUpdate",
    GuildUpdate => "guildUpdate",
    InviteCreate => "inviteCreate",
    InviteDelete => "inviteDelete",
    MessageCreate => "messageCreate",
    MessageDelete => "messageDelete",
    MessageReactionRemoveAll => "messageReactionRemoveAll",
    MessageReactionRemoveEmoji => "messageReactionRemoveEmoji",
    MessageDeleteBulk => "messageDeleteBulk",
    MessageReactionAdd => "messageReactionAdd",
    MessageReactionRemove => "messageReactionRemove",
    MessageUpdate => "messageUpdate",
    PresenceUpdate => "presenceUpdate",
    Ready => "ready",
    Invalidated => "invalidated",
    RoleCreate => "roleCreate",
    RoleDelete => "roleDelete",
    RoleUpdate => "roleUpdate",
    ThreadCreate => "threadCreate",
    ThreadDelete => "threadDelete",
    ThreadListSync => "threadListSync",
    ThreadMemberUpdate => "threadMemberUpdate",
    ThreadMembersUpdate => "threadMembersUpdate",
    ThreadUpdate => "threadUpdate",
    TypingStart => "typingStart",
    UserUpdate => "userUpdate",
    VoiceStateUpdate => "voiceStateUpdate",
    WebhookUpdate => "webhookUpdate",
    InteractionCreate => "interactionCreate",
    ShardDisconnect => "shardDisconnect",
    ShardError => "shardError",
    ShardReady => "shardReady",
    ShardReconnecting => "shardReconnecting",
    ShardResume => "shardResume",
    StageInstanceCreate => "stageInstanceCreate",
    StageInstanceUpdate => "stageInstanceUpdate",
    StageInstanceDelete => "stageInstanceDelete",
    StickerCreate => "stickerCreate",
    StickerDelete => "stickerDelete",
    StickerUpdate => "stickerUpdate",
    GuildScheduledEventCreate => "guildScheduledEventCreate",
    GuildScheduledEventUpdate => "guildScheduledEventUpdate",
    GuildScheduledEventDelete => "guildScheduledEventDelete",
    GuildScheduledEventUserAdd => "guildScheduledEventUserAdd",
    GuildScheduledEventUserRemove => "guildScheduledEventUserRemove",
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event name that is not part of the gateway vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown event \"{0}\"")]
pub struct UnknownEvent(pub String);

/// Async callback invoked with the event payload
pub type Listener<P> = Arc<dyn Fn(P) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Options passed to the bus alongside a listener
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Deliver at most one event, then unregister
    pub once: bool,
}

/// A listener bound to one event
pub struct EventBinding<P> {
    pub event: EventName,
    pub once: bool,
    pub listener: Listener<P>,
}

impl<P> Clone for EventBinding<P> {
    fn clone(&self) -> Self {
        Self {
            event: self.event,
            once: self.once,
            listener: self.listener.clone(),
        }
    }
}

impl<P> fmt::Debug for EventBinding<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("event", &self.event)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

impl<P: Send + 'static> EventBinding<P> {
    /// Bind a free-standing async function
    pub fn from_fn<F, Fut>(event: EventName, once: bool, listener: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            event,
            once,
            listener: Arc::new(move |payload| listener(payload).boxed()),
        }
    }
}

impl<P> EventBinding<P> {
    pub fn options(&self) -> ListenerOptions {
        ListenerOptions { once: self.once }
    }
}

/// Builds bindings whose listeners run against a shared receiver
pub struct EventBindings<T, P> {
    target: Arc<T>,
    bindings: Vec<EventBinding<P>>,
}

impl<T, P> EventBindings<T, P>
where
    T: Send + Sync + 'static,
    P: Send + 'static,
{
    pub fn new(target: Arc<T>) -> Self {
        Self {
            target,
            bindings: Vec::new(),
        }
    }

    /// Listen to every occurrence of `event`
    pub fn on<F, Fut>(self, event: EventName, listener: F) -> Self
    where
        F: Fn(Arc<T>, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.bind(event, false, listener)
    }

    /// Listen to the next occurrence of `event` only
    pub fn once<F, Fut>(self, event: EventName, listener: F) -> Self
    where
        F: Fn(Arc<T>, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.bind(event, true, listener)
    }

    fn bind<F, Fut>(mut self, event: EventName, once: bool, listener: F) -> Self
    where
        F: Fn(Arc<T>, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let target = self.target.clone();
        self.bindings.push(EventBinding {
            event,
            once,
            listener: Arc::new(move |payload| listener(target.clone(), payload).boxed()),
        });
        self
    }

    pub fn into_bindings(self) -> Vec<EventBinding<P>> {
        self.bindings
    }
}

/// A free-standing capability handler
pub trait Handler<P>: Send + Sync + 'static {
    /// Event bindings exposed by this handler
    fn events(self: Arc<Self>) -> Vec<EventBinding<P>>;

    /// Called once when the client is initialized
    fn init(&self) {}
}

/// Sink that accepts listener registrations
pub trait EventBus<P>: Send + Sync {
    fn register(&self, event: EventName, listener: Listener<P>, options: ListenerOptions);
}

/// Wires bindings onto a bus
pub struct EventRouter;

impl EventRouter {
    /// Register each binding on `bus` and return how many were registered
    pub fn bind<P, B>(bus: &B, bindings: Vec<EventBinding<P>>) -> usize
    where
        B: EventBus<P> + ?Sized,
    {
        let count = bindings.len();

        for binding in bindings {
            tracing::debug!(event = %binding.event, once = binding.once, "Binding listener");
            let options = binding.options();
            bus.register(binding.event, binding.listener, options);
        }

        count
    }
}

/// Payload carried on the bus
pub enum GatewayEvent<R> {
    /// The gateway session is ready
    Ready,
    /// A command invocation arrived
    InteractionCreate(Arc<R>),
    /// Any other event, with its raw data
    Dispatch {
        event: EventName,
        data: serde_json::Value,
    },
}

impl<R> GatewayEvent<R> {
    pub fn name(&self) -> EventName {
        match self {
            GatewayEvent::Ready => EventName::Ready,
            GatewayEvent::InteractionCreate(_) => EventName::InteractionCreate,
            GatewayEvent::Dispatch { event, .. } => *event,
        }
    }
}

impl<R> Clone for GatewayEvent<R> {
    fn clone(&self) -> Self {
        match self {
            GatewayEvent::Ready => GatewayEvent::Ready,
            GatewayEvent::InteractionCreate(interaction) => {
                GatewayEvent::InteractionCreate(interaction.clone())
            }
            GatewayEvent::Dispatch { event, data } => GatewayEvent::Dispatch {
                event: *event,
                data: data.clone(),
            },
        }
    }
}

impl<R> fmt::Debug for GatewayEvent<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayEvent::Dispatch { event, data } => f
                .debug_struct("Dispatch")
                .field("event", event)
                .field("data", data)
                .finish(),
            other => f.write_str(other.name().as_str()),
        }
    }
}
