//! slash-host: client runtime for the slash command framework
//!
//! This crate loads the client configuration, freezes the command registry,
//! binds handlers onto an event bus and delivers responses through the
//! [`Responder`] and [`CommandPublisher`] collaborators.

pub mod bus;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod transport;

pub use bus::LocalEventBus;
pub use client::{Client, ClientBuilder, SharedHandler};
pub use config::{ClientConfig, ConfigLoadError};
pub use error::HostError;
pub use handlers::{CommandDispatcher, ReadyHandler};
pub use transport::{CommandPublisher, Responder};
