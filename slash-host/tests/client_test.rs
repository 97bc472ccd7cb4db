//! End-to-end tests: commands registered on a client, interactions emitted
//! on the local bus, responses captured by a recording responder.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use slash::{
    Argument, ArgumentKind, ArgumentValue, Command, CommandError, EventBinding, EventBindings,
    EventName, GatewayEvent, Handler, InteractionData, Member, Message, Permissions, Reply,
    Snowflake, User,
};
use slash_api::{CommandSchema, OptionType};
use slash_host::{
    Client, ClientBuilder, ClientConfig, CommandPublisher, HostError, LocalEventBus, Responder,
};

type Bus = LocalEventBus<GatewayEvent<InteractionData>>;
type Cmd = Command<InteractionData>;
type Arg = Argument<InteractionData>;

#[derive(Default)]
struct RecordingResponder {
    sent: Mutex<Vec<Message>>,
}

impl RecordingResponder {
    fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder<InteractionData> for RecordingResponder {
    async fn reply(&self, _source: &InteractionData, message: Message) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    calls: Mutex<Vec<(Vec<CommandSchema>, Option<Snowflake>)>>,
}

#[async_trait]
impl CommandPublisher for RecordingPublisher {
    async fn set_commands(
        &self,
        commands: Vec<CommandSchema>,
        guild: Option<Snowflake>,
    ) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push((commands, guild));
        Ok(())
    }
}

fn moderation() -> Cmd {
    Cmd::group("mod", "Moderation tools").subcommand(
        Cmd::group("ban", "Ban members").subcommand(
            Cmd::new("user", "Ban a user")
                .permissions(Permissions::BAN_MEMBERS)
                .argument(
                    Arg::builder(ArgumentKind::Member, "target", "The member to ban")
                        .filter(|target, source: &InteractionData| {
                            target.as_user().map(|user| user.id) != Some(source.user.id)
                        })
                        .error("You cannot ban yourself")
                        .build()
                        .unwrap(),
                )
                .argument(
                    Arg::builder(ArgumentKind::String, "reason", "Why")
                        .optional()
                        .max_length(128)
                        .build()
                        .unwrap(),
                )
                .run(|_source, args| {
                    let name = args.member(0).map(|m| m.display_name().to_string());
                    let reason = args.str(1).unwrap_or("no reason").to_string();
                    Box::pin(async move {
                        let name = name.ok_or_else(|| CommandError::user("No member given"))?;
                        Ok(Reply::from(format!("**{}** has been banned: {}", name, reason)))
                    })
                }),
        ),
    )
}

fn say() -> Cmd {
    Cmd::new("say", "Repeat text")
        .argument(Arg::builder(ArgumentKind::String, "text", "Text").build().unwrap())
        .run(|_source, args| {
            let text = args.str(0).unwrap_or_default().to_string();
            Box::pin(async move {
                if text.len() > 5 {
                    return Err(CommandError::user("too long"));
                }
                if text == "crash" {
                    return Err(CommandError::system(anyhow::anyhow!("renderer crashed")));
                }
                Ok(Reply::from(text))
            })
        })
}

struct Fixture {
    client: Client<InteractionData>,
    bus: Bus,
    responder: Arc<RecordingResponder>,
    publisher: Arc<RecordingPublisher>,
}

async fn fixture(config: ClientConfig, commands: Vec<Cmd>) -> Fixture {
    let responder = Arc::new(RecordingResponder::default());
    let publisher = Arc::new(RecordingPublisher::default());

    let mut builder = ClientBuilder::new(config);
    for command in commands {
        builder = builder.command(command);
    }
    let client = builder
        .build(responder.clone(), publisher.clone())
        .await
        .unwrap();

    let bus = Bus::new();
    client.init(&bus);

    Fixture {
        client,
        bus,
        responder,
        publisher,
    }
}

fn moderator() -> InteractionData {
    InteractionData::new("mod", User::new(1, "mod")).permissions(Permissions::BAN_MEMBERS)
}

async fn interact(fixture: &Fixture, interaction: InteractionData) {
    fixture
        .bus
        .emit(
            EventName::InteractionCreate,
            GatewayEvent::InteractionCreate(Arc::new(interaction)),
        )
        .await;
}

#[tokio::test]
async fn test_nested_command_replies() {
    let fixture = fixture(ClientConfig::default(), vec![moderation()]).await;

    let target = Member::new(User::new(2, "bob"), Permissions::empty());
    let interaction = moderator()
        .group("ban")
        .subcommand("user")
        .option("target", ArgumentValue::Member(target));
    interact(&fixture, interaction).await;

    let sent = fixture.responder.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text(), Some("**bob** has been banned: no reason"));
    assert_eq!(sent[0].embeds[0].colour, Some(0xffffff));
}

#[tokio::test]
async fn test_unknown_subcommand_gets_no_response() {
    let fixture = fixture(ClientConfig::default(), vec![moderation()]).await;

    interact(&fixture, moderator().group("ban").subcommand("temp")).await;
    interact(&fixture, InteractionData::new("unknown", User::new(1, "a"))).await;

    assert!(fixture.responder.sent().is_empty());
}

#[tokio::test]
async fn test_missing_permission_is_reported() {
    let fixture = fixture(ClientConfig::default(), vec![moderation()]).await;

    let interaction = InteractionData::new("mod", User::new(3, "eve"))
        .group("ban")
        .subcommand("user")
        .option("target", User::new(2, "bob").into());
    interact(&fixture, interaction).await;

    let sent = fixture.responder.sent();
    assert_eq!(
        sent[0].text(),
        Some("You need `BanMembers` in order to run this command.")
    );
}

#[tokio::test]
async fn test_filter_rejection_is_reported() {
    let fixture = fixture(ClientConfig::default(), vec![moderation()]).await;

    let me = Member::new(User::new(1, "mod"), Permissions::BAN_MEMBERS);
    let interaction = moderator()
        .group("ban")
        .subcommand("user")
        .option("target", ArgumentValue::Member(me));
    interact(&fixture, interaction).await;

    let sent = fixture.responder.sent();
    assert_eq!(sent[0].embeds[0].title.as_deref(), Some("Error with parameter `target`"));
    assert_eq!(sent[0].text(), Some("You cannot ban yourself"));
}

#[tokio::test]
async fn test_user_error_and_system_error() {
    let fixture = fixture(ClientConfig::default(), vec![say()]).await;
    let say = |text: &str| {
        InteractionData::new("say", User::new(1, "a")).option("text", text.into())
    };

    interact(&fixture, say("far too long")).await;
    interact(&fixture, say("crash")).await;
    interact(&fixture, say("hi")).await;

    let sent = fixture.responder.sent();
    assert_eq!(sent.len(), 2, "the system error produces no response");
    assert_eq!(sent[0].text(), Some("too long"));
    assert_eq!(sent[0].embeds[0].title.as_deref(), Some("Error"));
    assert_eq!(sent[1].text(), Some("hi"));
}

#[tokio::test]
async fn test_non_chat_input_is_ignored() {
    let fixture = fixture(ClientConfig::default(), vec![say()]).await;

    let mut interaction =
        InteractionData::new("say", User::new(1, "a")).option("text", "hi".into());
    interaction.chat_input = false;
    interact(&fixture, interaction).await;

    assert!(fixture.responder.sent().is_empty());
}

#[tokio::test]
async fn test_dispatcher_can_be_disabled() {
    let config = ClientConfig {
        register_command_handler: false,
        ..Default::default()
    };
    let fixture = fixture(config, vec![say()]).await;

    assert_eq!(fixture.bus.listener_count(EventName::InteractionCreate), 0);
    interact(
        &fixture,
        InteractionData::new("say", User::new(1, "a")).option("text", "hi".into()),
    )
    .await;
    assert!(fixture.responder.sent().is_empty());
}

#[tokio::test]
async fn test_publish_on_ready_once() {
    let config = ClientConfig {
        publish_commands_on_ready: true,
        guild_id: Some(Snowflake(77)),
        ..Default::default()
    };
    let fixture = fixture(config, vec![moderation(), say()]).await;

    fixture.bus.emit(EventName::Ready, GatewayEvent::Ready).await;
    fixture.bus.emit(EventName::Ready, GatewayEvent::Ready).await;

    let calls = fixture.publisher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);

    let (schemas, guild) = &calls[0];
    assert_eq!(*guild, Some(Snowflake(77)));
    assert_eq!(schemas.len(), 2);

    let user = &schemas[0].options[0].options[0];
    assert_eq!(user.name, "user");
    assert_eq!(user.options[0].kind, OptionType::User);
    assert_eq!(user.options[1].extras.max_length, Some(128));
    assert!(fixture.client.commands_published());
}

#[tokio::test]
async fn test_ready_without_publishing() {
    let fixture = fixture(ClientConfig::default(), vec![say()]).await;

    fixture.bus.emit(EventName::Ready, GatewayEvent::Ready).await;
    assert!(fixture.publisher.calls.lock().unwrap().is_empty());

    assert!(fixture.client.publish_commands(None).await.unwrap());
    assert!(!fixture.client.publish_commands(None).await.unwrap());
    assert_eq!(fixture.publisher.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_publish_requires_init() {
    let client = ClientBuilder::new(ClientConfig::default())
        .command(say())
        .build(
            Arc::new(RecordingResponder::default()),
            Arc::new(RecordingPublisher::default()),
        )
        .await
        .unwrap();

    assert!(matches!(
        client.publish_commands(None).await,
        Err(HostError::NotInitialized)
    ));
}

#[tokio::test]
async fn test_invalid_command_fails_build() {
    let result = ClientBuilder::new(ClientConfig::default())
        .command(say())
        .command(say())
        .build(
            Arc::new(RecordingResponder::default()),
            Arc::new(RecordingPublisher::default()),
        )
        .await;

    assert!(matches!(result, Err(HostError::Config(_))));
}

struct Greeter {
    joined: AtomicUsize,
    initialized: AtomicUsize,
}

impl Handler<GatewayEvent<InteractionData>> for Greeter {
    fn events(self: Arc<Self>) -> Vec<EventBinding<GatewayEvent<InteractionData>>> {
        EventBindings::new(self)
            .on(EventName::GuildMemberAdd, |greeter, _event| async move {
                greeter.joined.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .into_bindings()
    }

    fn init(&self) {
        self.initialized.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_handlers_and_command_hooks_are_bound_once() {
    let greeter = Arc::new(Greeter {
        joined: AtomicUsize::new(0),
        initialized: AtomicUsize::new(0),
    });
    let hook_calls = Arc::new(AtomicUsize::new(0));

    let counter = hook_calls.clone();
    let hooked = say().hook(EventBinding::from_fn(
        EventName::Ready,
        true,
        move |_event: GatewayEvent<InteractionData>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        },
    ));

    let client = ClientBuilder::new(ClientConfig::default())
        .command(hooked)
        .handler(greeter.clone())
        .build(
            Arc::new(RecordingResponder::default()),
            Arc::new(RecordingPublisher::default()),
        )
        .await
        .unwrap();

    let bus = Bus::new();
    assert!(client.init(&bus) > 0);
    assert_eq!(client.init(&bus), 0);
    assert!(client.is_initialized());
    assert_eq!(greeter.initialized.load(Ordering::SeqCst), 1);

    let data = serde_json::json!({"user": {"id": 5}});
    bus.emit(
        EventName::GuildMemberAdd,
        GatewayEvent::Dispatch {
            event: EventName::GuildMemberAdd,
            data,
        },
    )
    .await;
    bus.emit(EventName::Ready, GatewayEvent::Ready).await;
    bus.emit(EventName::Ready, GatewayEvent::Ready).await;

    assert_eq!(greeter.joined.load(Ordering::SeqCst), 1);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1, "once hook fires a single time");
}
