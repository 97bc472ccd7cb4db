//! Permission gate.
//!
//! Commands declare the permission bits they require; the gate compares them
//! against the bits the invoking member holds and reports exactly the bits
//! that are missing.

use std::fmt;

bitflags::bitflags! {
    /// Platform permission bits.
    ///
    /// Declared in ascending bit order, which is also the order used when
    /// listing missing permissions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permissions: u64 {
        const CREATE_INSTANT_INVITE = 1 << 0;
        const KICK_MEMBERS = 1 << 1;
        const BAN_MEMBERS = 1 << 2;
        const ADMINISTRATOR = 1 << 3;
        const MANAGE_CHANNELS = 1 << 4;
        const MANAGE_GUILD = 1 << 5;
        const ADD_REACTIONS = 1 << 6;
        const VIEW_AUDIT_LOG = 1 << 7;
        const PRIORITY_SPEAKER = 1 << 8;
        const STREAM = 1 << 9;
        const VIEW_CHANNEL = 1 << 10;
        const SEND_MESSAGES = 1 << 11;
        const SEND_TTS_MESSAGES = 1 << 12;
        const MANAGE_MESSAGES = 1 << 13;
        const EMBED_LINKS = 1 << 14;
        const ATTACH_FILES = 1 << 15;
        const READ_MESSAGE_HISTORY = 1 << 16;
        const MENTION_EVERYONE = 1 << 17;
        const USE_EXTERNAL_EMOJIS = 1 << 18;
        const VIEW_GUILD_INSIGHTS = 1 << 19;
        const CONNECT = 1 << 20;
        const SPEAK = 1 << 21;
        const MUTE_MEMBERS = 1 << 22;
        const DEAFEN_MEMBERS = 1 << 23;
        const MOVE_MEMBERS = 1 << 24;
        const USE_VAD = 1 << 25;
        const CHANGE_NICKNAME = 1 << 26;
        const MANAGE_NICKNAMES = 1 << 27;
        const MANAGE_ROLES = 1 << 28;
        const MANAGE_WEBHOOKS = 1 << 29;
        const MANAGE_GUILD_EXPRESSIONS = 1 << 30;
        const USE_APPLICATION_COMMANDS = 1 << 31;
        const REQUEST_TO_SPEAK = 1 << 32;
        const MANAGE_EVENTS = 1 << 33;
        const MANAGE_THREADS = 1 << 34;
        const CREATE_PUBLIC_THREADS = 1 << 35;
        const CREATE_PRIVATE_THREADS = 1 << 36;
        const USE_EXTERNAL_STICKERS = 1 << 37;
        const SEND_MESSAGES_IN_THREADS = 1 << 38;
        const USE_EMBEDDED_ACTIVITIES = 1 << 39;
        const MODERATE_MEMBERS = 1 << 40;
    }
}

impl Permissions {
    /// Human-readable names of the contained bits (`BAN_MEMBERS` becomes
    /// `BanMembers`). Bits without a name are appended as one hex value.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.iter_names().map(|(name, _)| pascal_case(name)).collect();

        let unknown = self.bits() & !Self::all().bits();
        if unknown != 0 {
            names.push(format!("{:#x}", unknown));
        }

        names
    }
}

fn pascal_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Permissions required by a command but not held by the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("missing permissions: {}", .0.names().join(", "))]
pub struct MissingPermissions(pub Permissions);

impl MissingPermissions {
    pub fn bits(&self) -> Permissions {
        self.0
    }
}

/// Compare held bits against required bits.
///
/// Passes when every required bit is held; otherwise returns exactly the
/// required bits the actor lacks: `(actor & required) ^ required`.
pub fn check(actor: Permissions, required: Permissions) -> Result<(), MissingPermissions> {
    let missing =
        Permissions::from_bits_retain((actor.bits() & required.bits()) ^ required.bits());

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MissingPermissions(missing))
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(", "))
    }
}
