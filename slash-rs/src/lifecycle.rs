//! Execution lifecycle: resolve, check, run and catch.
//!
//! Every request moves through
//! `Resolving -> Checking -> Running -> (Catching) -> Done`. Nothing raised
//! by a handler escapes [`Lifecycle::execute`]; failures end either as a
//! user-facing [`Message`] or as a logged, silent outcome.

use crate::argument::{ArgumentError, ArgumentOutcome, Arguments, ValidationFailure};
use crate::command::NodeId;
use crate::interaction::Interaction;
use crate::message::{Embed, Message, Messages};
use crate::permission;
use crate::registry::CommandRegistry;
use crate::{CommandError, Reply};

/// Lifecycle phase, traced on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Resolving,
    Checking,
    Running,
    Catching,
    Done,
}

/// Result of the checking phase
#[derive(Debug, Clone)]
pub enum CheckOutcome {
    /// Values in handler order
    Passed(Arguments),
    Failed(ValidationFailure),
}

/// How a request ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No command matches the request
    Unresolved,
    /// Permission or argument validation failed
    Rejected(Message),
    /// The handler (or its fallback) produced a message
    Replied(Message),
    /// Finished without anything to send
    Silent,
    /// An argument mapper or default provider failed
    Failed,
}

impl Outcome {
    /// Message to deliver, if any
    pub fn into_response(self) -> Option<Message> {
        match self {
            Outcome::Rejected(message) | Outcome::Replied(message) => Some(message),
            Outcome::Unresolved | Outcome::Silent | Outcome::Failed => None,
        }
    }
}

fn enter(command: &str, state: LifecycleState) {
    tracing::debug!(command, state = ?state, "Lifecycle transition");
}

/// Runs commands from a [`CommandRegistry`]
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    messages: Messages,
}

impl Lifecycle {
    pub fn new(messages: Messages) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Permission gate, then every argument in declaration order.
    ///
    /// A value that stays at its own index goes to the next free position;
    /// a redirected value goes to its target slot. The first invalid
    /// argument ends the phase.
    pub async fn check<R: Interaction>(
        &self,
        registry: &CommandRegistry<R>,
        id: NodeId,
        source: &R,
    ) -> Result<CheckOutcome, ArgumentError> {
        let Some(node) = registry.get(id) else {
            let message = format!("Unknown command id {}", id);
            return Ok(CheckOutcome::Failed(ValidationFailure::new(message, None)));
        };

        let required = registry.required_permissions(id);
        if let Err(missing) = permission::check(source.member_permissions(), required) {
            tracing::debug!(
                command = %registry.path(id),
                missing = %missing.bits(),
                "Permission check failed"
            );
            let message = self.messages.insufficient_permissions(&missing.bits().names());
            return Ok(CheckOutcome::Failed(ValidationFailure::new(message, None)));
        }

        let mut args = Arguments::with_capacity(node.arguments().len());
        let mut next_index = 0;

        for (index, argument) in node.arguments().iter().enumerate() {
            match argument.run(source, &args, index).await? {
                ArgumentOutcome::Invalid(failure) => return Ok(CheckOutcome::Failed(failure)),
                ArgumentOutcome::Valid { value, apply_to } => {
                    let slot = if apply_to == index {
                        next_index += 1;
                        next_index - 1
                    } else {
                        apply_to
                    };
                    args.set(slot, value);
                }
            }
        }

        Ok(CheckOutcome::Passed(args))
    }

    /// Check and run the command at `id`
    pub async fn execute<R: Interaction>(
        &self,
        registry: &CommandRegistry<R>,
        id: NodeId,
        source: &R,
    ) -> Outcome {
        let Some(node) = registry.get(id) else {
            tracing::warn!(id = %id, "Command id not in registry");
            return Outcome::Unresolved;
        };
        let path = registry.path(id);

        enter(&path, LifecycleState::Checking);
        let args = match self.check(registry, id, source).await {
            Ok(CheckOutcome::Passed(args)) => args,
            Ok(CheckOutcome::Failed(failure)) => {
                tracing::debug!(command = %path, source = ?failure.source, "Request rejected");
                enter(&path, LifecycleState::Done);
                return Outcome::Rejected(self.rejection(failure));
            }
            Err(err) => {
                tracing::error!(command = %path, error = %err, "Argument pipeline failed");
                enter(&path, LifecycleState::Done);
                return Outcome::Failed;
            }
        };

        let Some(handler) = node.handler() else {
            enter(&path, LifecycleState::Done);
            return Outcome::Silent;
        };

        enter(&path, LifecycleState::Running);
        let error = match handler.run(source, &args).await {
            Ok(reply) => return self.finish(&path, reply),
            Err(CommandError::User(message)) => return self.user_error(&path, message),
            Err(CommandError::System(error)) => error,
        };

        enter(&path, LifecycleState::Catching);
        match handler.catch(&error, source, &args).await {
            Ok(reply) => self.finish(&path, reply),
            Err(CommandError::User(message)) => self.user_error(&path, message),
            Err(CommandError::System(fallback)) => {
                let error = format!("{:#}", error);
                let fallback = format!("{:#}", fallback);
                tracing::error!(
                    command = %path,
                    error = %error,
                    fallback = %fallback,
                    "Command failed"
                );
                enter(&path, LifecycleState::Done);
                Outcome::Silent
            }
        }
    }

    /// Resolve the request, then execute it
    pub async fn dispatch<R: Interaction>(
        &self,
        registry: &CommandRegistry<R>,
        source: &R,
    ) -> Outcome {
        enter(source.command_name(), LifecycleState::Resolving);

        match registry.resolve_interaction(source) {
            Some(id) => self.execute(registry, id, source).await,
            None => {
                tracing::debug!(
                    command = source.command_name(),
                    group = ?source.subcommand_group(),
                    subcommand = ?source.subcommand(),
                    "No matching command"
                );
                Outcome::Unresolved
            }
        }
    }

    fn finish(&self, path: &str, reply: Reply) -> Outcome {
        enter(path, LifecycleState::Done);
        match reply.into_message() {
            Some(message) => Outcome::Replied(message),
            None => Outcome::Silent,
        }
    }

    fn user_error(&self, path: &str, message: String) -> Outcome {
        enter(path, LifecycleState::Done);
        Outcome::Replied(Message::embed(
            Embed::new()
                .title(&self.messages.error_title)
                .description(message),
        ))
    }

    fn rejection(&self, failure: ValidationFailure) -> Message {
        let mut embed = Embed::new().description(failure.message);
        if let Some(source) = &failure.source {
            embed = embed.title(self.messages.parameter_failure(source));
        }
        Message::embed(embed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{Argument, ArgumentKind, ArgumentValue};
    use crate::command::Command;
    use crate::interaction::InteractionData;
    use crate::model::{Member, User};
    use crate::permission::Permissions;
    use crate::registry::RegistryBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type Cmd = Command<InteractionData>;
    type Arg = Argument<InteractionData>;

    async fn registry(commands: Vec<Cmd>) -> CommandRegistry<InteractionData> {
        let mut builder = RegistryBuilder::new();
        for command in commands {
            builder.register(command).unwrap();
        }
        builder.initialize().await.unwrap()
    }

    fn request(name: &str) -> InteractionData {
        InteractionData::new(name, User::new(1, "alice"))
    }

    fn text(outcome: Outcome) -> String {
        outcome
            .into_response()
            .and_then(|message| message.text().map(str::to_string))
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_permission_rejection_lists_missing_bits() {
        let registry = registry(vec![Cmd::new("ban", "Ban")
            .permissions(Permissions::BAN_MEMBERS | Permissions::KICK_MEMBERS)
            .run(|_, _| Box::pin(async { Ok("banned".into()) }))])
        .await;

        let source = request("ban").permissions(Permissions::KICK_MEMBERS);
        let outcome = Lifecycle::default().dispatch(&registry, &source).await;

        let message = match outcome {
            Outcome::Rejected(message) => message,
            other => panic!("expected rejection, got {:?}", other),
        };
        assert_eq!(message.text(), Some("You need `BanMembers` in order to run this command."));
        assert!(message.embeds[0].title.is_none());
    }

    #[tokio::test]
    async fn test_validation_rejection_is_titled_with_parameter() {
        let registry = registry(vec![Cmd::new("ban", "Ban")
            .argument(
                Arg::builder(ArgumentKind::User, "user", "Who")
                    .filter(|user, source: &InteractionData| {
                        user.as_user().map(|u| u.id) != Some(source.user.id)
                    })
                    .error("You cannot ban yourself")
                    .build()
                    .unwrap(),
            )
            .run(|_, _| Box::pin(async { Ok("banned".into()) }))])
        .await;

        let source = request("ban").option("user", User::new(1, "alice").into());
        let message = Lifecycle::default()
            .dispatch(&registry, &source)
            .await
            .into_response()
            .unwrap();

        assert_eq!(message.embeds[0].title.as_deref(), Some("Error with parameter `user`"));
        assert_eq!(message.text(), Some("You cannot ban yourself"));
    }

    #[tokio::test]
    async fn test_user_error_text_is_exact() {
        let registry = registry(vec![Cmd::new("say", "Say")
            .run(|_, _| Box::pin(async { Err(CommandError::user("too long")) }))])
        .await;

        let outcome = Lifecycle::default().dispatch(&registry, &request("say")).await;
        let message = outcome.into_response().unwrap();
        assert_eq!(message.text(), Some("too long"));
        assert_eq!(message.embeds[0].title.as_deref(), Some("Error"));
    }

    #[tokio::test]
    async fn test_system_error_without_fallback_is_silent() {
        let registry = registry(vec![Cmd::new("say", "Say")
            .run(|_, _| Box::pin(async { Err(anyhow::anyhow!("socket closed").into()) }))])
        .await;

        let outcome = Lifecycle::default().dispatch(&registry, &request("say")).await;
        assert_eq!(outcome, Outcome::Silent);
    }

    #[tokio::test]
    async fn test_fallback_reply_and_user_error() {
        let registry = registry(vec![
            Cmd::new("a", "A")
                .run(|_, _| Box::pin(async { Err(anyhow::anyhow!("boom").into()) }))
                .catch(|_, _, _| Box::pin(async { Ok("recovered".into()) })),
            Cmd::new("b", "B")
                .run(|_, _| Box::pin(async { Err(anyhow::anyhow!("boom").into()) }))
                .catch(|_, _, _| Box::pin(async { Err(CommandError::user("try later")) })),
        ])
        .await;

        let lifecycle = Lifecycle::default();
        assert_eq!(text(lifecycle.dispatch(&registry, &request("a")).await), "recovered");
        assert_eq!(text(lifecycle.dispatch(&registry, &request("b")).await), "try later");
    }

    #[tokio::test]
    async fn test_empty_reply_and_container_are_silent() {
        let registry = registry(vec![
            Cmd::new("quiet", "Quiet").run(|_, _| Box::pin(async { Ok("".into()) })),
            Cmd::group("group", "Group"),
        ])
        .await;

        let lifecycle = Lifecycle::default();
        assert_eq!(lifecycle.dispatch(&registry, &request("quiet")).await, Outcome::Silent);
        assert_eq!(lifecycle.dispatch(&registry, &request("group")).await, Outcome::Silent);
        assert_eq!(lifecycle.dispatch(&registry, &request("nothing")).await, Outcome::Unresolved);
    }

    #[tokio::test]
    async fn test_mapper_failure_is_failed() {
        let registry = registry(vec![Cmd::new("say", "Say")
            .argument(
                Arg::builder(ArgumentKind::String, "text", "Text")
                    .map(|_, _| Err(anyhow::anyhow!("bad mapper")))
                    .build()
                    .unwrap(),
            )
            .run(|_, _| Box::pin(async { Ok("said".into()) }))])
        .await;

        let source = request("say").option("text", "hi".into());
        assert_eq!(Lifecycle::default().dispatch(&registry, &source).await, Outcome::Failed);
    }

    #[tokio::test]
    async fn test_check_compacts_redirected_arguments() {
        let registry = registry(vec![Cmd::new("warn", "Warn")
            .argument(Arg::builder(ArgumentKind::Member, "user", "Who").build().unwrap())
            .argument(
                Arg::builder(ArgumentKind::String, "reason", "Why")
                    .optional()
                    .build()
                    .unwrap(),
            )
            .argument(
                Arg::builder(ArgumentKind::String, "note", "Note")
                    .optional()
                    .ignore_if_defined(-1)
                    .build()
                    .unwrap(),
            )
            .run(|_, _| Box::pin(async { Ok(().into()) }))])
        .await;

        let member = Member::new(User::new(2, "bob"), Permissions::empty());
        let source = request("warn")
            .option("user", ArgumentValue::Member(member))
            .option("note", "first offence".into());

        let id = registry.resolve("warn", None, None).unwrap();
        let args = match Lifecycle::default().check(&registry, id, &source).await.unwrap() {
            CheckOutcome::Passed(args) => args,
            CheckOutcome::Failed(failure) => panic!("unexpected failure: {:?}", failure),
        };

        assert_eq!(args.len(), 2);
        assert_eq!(args.member(0).map(Member::display_name), Some("bob"));
        assert_eq!(args.str(1), Some("first offence"));
    }

    #[tokio::test]
    async fn test_handler_receives_checked_arguments() {
        let registry = registry(vec![Cmd::new("days", "Days")
            .argument(
                Arg::builder(ArgumentKind::Integer, "count", "Count")
                    .optional()
                    .default(7i64)
                    .build()
                    .unwrap(),
            )
            .run(|_, args| {
                let count = args.i64(0);
                Box::pin(async move { Ok(format!("{:?}", count).into()) })
            })])
        .await;

        let outcome = Lifecycle::default().dispatch(&registry, &request("days")).await;
        assert_eq!(text(outcome), "Some(7)");
    }

    fn counting_filter(name: &str, calls: &Arc<AtomicUsize>) -> Arg {
        let calls = calls.clone();
        Arg::builder(ArgumentKind::String, name, "Counted")
            .filter(move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            })
            .error("never shown")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_invalid_argument_stops_the_pipeline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry(vec![Cmd::new("pair", "Pair")
            .argument(
                Arg::builder(ArgumentKind::String, "a", "First")
                    .filter(|_, _| false)
                    .error("a is wrong")
                    .build()
                    .unwrap(),
            )
            .argument(counting_filter("b", &calls))
            .run(|_, _| Box::pin(async { Ok("ran".into()) }))])
        .await;

        let source = request("pair").option("a", "x".into()).option("b", "y".into());
        let message = match Lifecycle::default().dispatch(&registry, &source).await {
            Outcome::Rejected(message) => message,
            other => panic!("expected rejection, got {:?}", other),
        };

        assert_eq!(message.embeds[0].title.as_deref(), Some("Error with parameter `a`"));
        assert_eq!(message.text(), Some("a is wrong"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_permission_rejection_skips_arguments() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry(vec![Cmd::new("ban", "Ban")
            .permissions(Permissions::BAN_MEMBERS)
            .argument(counting_filter("reason", &calls))
            .run(|_, _| Box::pin(async { Ok("banned".into()) }))])
        .await;

        let source = request("ban").option("reason", "spam".into());
        let outcome = Lifecycle::default().dispatch(&registry, &source).await;

        assert!(matches!(outcome, Outcome::Rejected(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_foreign_node_id_is_unresolved() {
        let small = registry(vec![
            Cmd::new("ping", "Ping").run(|_, _| Box::pin(async { Ok("pong".into()) })),
        ])
        .await;
        let large = registry(vec![
            Cmd::new("a", "A").run(|_, _| Box::pin(async { Ok(().into()) })),
            Cmd::new("b", "B").run(|_, _| Box::pin(async { Ok(().into()) })),
            Cmd::new("c", "C").run(|_, _| Box::pin(async { Ok(().into()) })),
        ])
        .await;
        let foreign = large.resolve("c", None, None).unwrap();

        let lifecycle = Lifecycle::default();
        assert_eq!(lifecycle.execute(&small, foreign, &request("c")).await, Outcome::Unresolved);
        assert!(matches!(
            lifecycle.check(&small, foreign, &request("c")).await,
            Ok(CheckOutcome::Failed(_))
        ));
        assert!(small.path(foreign).is_empty());
        assert_eq!(small.required_permissions(foreign), Permissions::empty());
    }

    #[test]
    fn test_outcome_response() {
        assert!(Outcome::Unresolved.into_response().is_none());
        assert!(Outcome::Failed.into_response().is_none());
        assert!(Outcome::Replied(Message::content("x")).into_response().is_some());
    }
}
