//! Command declarations and registered command nodes.
//!
//! A [`Command`] is what the application declares: name, description,
//! permissions, arguments, a handler and child commands. Registration turns
//! each declaration into a [`CommandNode`] stored in the registry's table.
//!
//! # Example
//!
//! ```ignore
//! let ban = Command::new("ban", "Bans a user from the server")
//!     .permissions(Permissions::BAN_MEMBERS)
//!     .argument(
//!         Argument::builder(ArgumentKind::User, "user", "The user to ban")
//!             .filter(|user, source: &InteractionData| {
//!                 user.as_user().map(|u| u.id) != Some(source.user.id)
//!             })
//!             .error("You cannot ban yourself")
//!             .build()?,
//!     )
//!     .run(|_source, args| {
//!         Box::pin(async move {
//!             let user = args.user(0).ok_or_else(|| CommandError::user("no user"))?;
//!             Ok(format!("**{}** has been banned.", user.name).into())
//!         })
//!     });
//!
//! let moderation = Command::group("mod", "Moderation tools").subcommand(ban);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::argument::{Argument, Arguments};
use crate::events::{EventBinding, GatewayEvent};
use crate::interaction::Interaction;
use crate::permission::Permissions;
use crate::{CommandError, CommandResult};

/// Executable body of a command
#[async_trait]
pub trait CommandHandler<R: Interaction>: Send + Sync + 'static {
    /// Run with the checked arguments
    async fn run(&self, source: &R, args: &Arguments) -> CommandResult;

    /// Fallback invoked when `run` fails with a system error.
    ///
    /// The default rethrows, which leaves the request without a response.
    async fn catch(&self, error: &anyhow::Error, _source: &R, _args: &Arguments) -> CommandResult {
        Err(rethrow(error))
    }

    /// Called once when the registry is initialized
    async fn init(&self) {}
}

fn rethrow(error: &anyhow::Error) -> CommandError {
    CommandError::System(anyhow::anyhow!("{:#}", error))
}

/// Closure form of [`CommandHandler::run`]
pub type RunFn<R> =
    Arc<dyn for<'a> Fn(&'a R, &'a Arguments) -> BoxFuture<'a, CommandResult> + Send + Sync>;

/// Closure form of [`CommandHandler::catch`]
pub type CatchFn<R> = Arc<
    dyn for<'a> Fn(&'a anyhow::Error, &'a R, &'a Arguments) -> BoxFuture<'a, CommandResult>
        + Send
        + Sync,
>;

struct FnHandler<R> {
    run: RunFn<R>,
    catch: Option<CatchFn<R>>,
}

#[async_trait]
impl<R: Interaction> CommandHandler<R> for FnHandler<R> {
    async fn run(&self, source: &R, args: &Arguments) -> CommandResult {
        (self.run)(source, args).await
    }

    async fn catch(&self, error: &anyhow::Error, source: &R, args: &Arguments) -> CommandResult {
        match &self.catch {
            Some(catch) => catch(error, source, args).await,
            None => Err(rethrow(error)),
        }
    }
}

/// Declaration of a command and its subtree
pub struct Command<R: Interaction> {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) enabled: bool,
    pub(crate) permissions: Permissions,
    pub(crate) arguments: Vec<Argument<R>>,
    pub(crate) handler: Option<Arc<dyn CommandHandler<R>>>,
    run: Option<RunFn<R>>,
    catch: Option<CatchFn<R>>,
    pub(crate) children: Vec<Command<R>>,
    pub(crate) hooks: Vec<EventBinding<GatewayEvent<R>>>,
}

impl<R: Interaction> Command<R> {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled: true,
            permissions: Permissions::empty(),
            arguments: Vec::new(),
            handler: None,
            run: None,
            catch: None,
            children: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Container command: only groups its children, never runs
    pub fn group(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Disabled commands are left out of the published schema
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Append an argument; handler slots follow declaration order
    pub fn argument(mut self, argument: Argument<R>) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn handler(mut self, handler: Arc<dyn CommandHandler<R>>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Closure handler. Ignored when [`handler`](Self::handler) is also set.
    pub fn run<F>(mut self, run: F) -> Self
    where
        F: for<'a> Fn(&'a R, &'a Arguments) -> BoxFuture<'a, CommandResult>
            + Send
            + Sync
            + 'static,
    {
        self.run = Some(Arc::new(run));
        self
    }

    /// Closure fallback for a [`run`](Self::run) closure
    pub fn catch<F>(mut self, catch: F) -> Self
    where
        F: for<'a> Fn(&'a anyhow::Error, &'a R, &'a Arguments) -> BoxFuture<'a, CommandResult>
            + Send
            + Sync
            + 'static,
    {
        self.catch = Some(Arc::new(catch));
        self
    }

    pub fn subcommand(mut self, command: Command<R>) -> Self {
        self.children.push(command);
        self
    }

    /// Event listener bound when the client initializes
    pub fn hook(mut self, binding: EventBinding<GatewayEvent<R>>) -> Self {
        self.hooks.push(binding);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler registered for this command, if any
    pub(crate) fn take_handler(&mut self) -> Option<Arc<dyn CommandHandler<R>>> {
        if let Some(handler) = self.handler.take() {
            return Some(handler);
        }

        let run = self.run.take()?;
        let catch = self.catch.take();
        Some(Arc::new(FnHandler { run, catch }))
    }
}

/// Index of a node in the registry table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered command
pub struct CommandNode<R: Interaction> {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) enabled: bool,
    pub(crate) permissions: Permissions,
    pub(crate) arguments: Vec<Argument<R>>,
    pub(crate) children: HashMap<String, NodeId>,
    pub(crate) order: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) handler: Option<Arc<dyn CommandHandler<R>>>,
    pub(crate) hooks: Vec<EventBinding<GatewayEvent<R>>>,
    pub(crate) depth: usize,
}

impl<R: Interaction> CommandNode<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Bits declared on this node alone
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn arguments(&self) -> &[Argument<R>] {
        &self.arguments
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    /// Children in registration order
    pub fn children(&self) -> &[NodeId] {
        &self.order
    }

    /// A container has no handler and only groups its children
    pub fn is_container(&self) -> bool {
        self.handler.is_none()
    }

    pub fn handler(&self) -> Option<&Arc<dyn CommandHandler<R>>> {
        self.handler.as_ref()
    }

    pub fn hooks(&self) -> &[EventBinding<GatewayEvent<R>>] {
        &self.hooks
    }

    /// 0 for roots, 1 for their children, 2 below that
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<R: Interaction> fmt::Debug for CommandNode<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("permissions", &self.permissions)
            .field("arguments", &self.arguments)
            .field("children", &self.order)
            .field("parent", &self.parent)
            .field("container", &self.is_container())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::InteractionData;
    use crate::model::User;
    use crate::Reply;

    fn source() -> InteractionData {
        InteractionData::new("ping", User::new(1, "alice"))
    }

    #[test]
    fn test_group_has_no_handler() {
        let mut group = Command::<InteractionData>::group("mod", "Moderation")
            .subcommand(Command::new("ban", "Ban"));
        assert!(group.take_handler().is_none());
        assert_eq!(group.children.len(), 1);
    }

    #[tokio::test]
    async fn test_closure_handler_runs() {
        let mut command = Command::<InteractionData>::new("ping", "Ping")
            .run(|source, _args| {
                let name = source.user.name.clone();
                Box::pin(async move { Ok(Reply::from(format!("pong, {}", name))) })
            });

        let handler = command.take_handler().unwrap();
        let reply = handler.run(&source(), &Arguments::new()).await.unwrap();
        assert!(matches!(reply, Reply::Text(ref text) if text == "pong, alice"));
    }

    #[tokio::test]
    async fn test_default_catch_rethrows() {
        let mut command = Command::<InteractionData>::new("ping", "Ping")
            .run(|_, _| Box::pin(async { Err(CommandError::system(anyhow::anyhow!("db down"))) }));

        let handler = command.take_handler().unwrap();
        let error = anyhow::anyhow!("db down");
        let result = handler.catch(&error, &source(), &Arguments::new()).await;
        match result {
            Err(CommandError::System(err)) => assert!(err.to_string().contains("db down")),
            other => panic!("expected rethrow, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_closure_catch_is_used() {
        let mut command = Command::<InteractionData>::new("ping", "Ping")
            .run(|_, _| Box::pin(async { Err(CommandError::system(anyhow::anyhow!("db down"))) }))
            .catch(|_, _, _| Box::pin(async { Ok(Reply::from("try again later")) }));

        let handler = command.take_handler().unwrap();
        let error = anyhow::anyhow!("db down");
        let reply = handler.catch(&error, &source(), &Arguments::new()).await.unwrap();
        assert!(matches!(reply, Reply::Text(ref text) if text == "try again later"));
    }
}
