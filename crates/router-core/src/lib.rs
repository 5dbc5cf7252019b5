pub mod access;
pub mod ambient;
pub mod gate;
pub mod prefix;
pub mod router;
pub mod table;
pub mod testing;
pub mod transport;

use core::fmt;
use std::sync::Arc;

use anyhow::{Context as _, Result};

pub use access::{AccessLevel, AccessResolver, GuildPerms};
pub use ambient::{AmbientSupervisor, Scope, StartOutcome, StopOutcome};
pub use gate::{Authorization, PreconditionGate};
pub use prefix::{AddressedVia, PrefixMatch, PrefixMatcher};
pub use router::{MessageRouter, RouteOutcome};
pub use table::{Command, CommandSpec, CommandTable, RegisterError};
pub use transport::{ChatFallback, ChatTransport, DeliveryError, ErrorResponder};

/// Platform user id, opaque to the router.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

/// Platform channel id, opaque to the router.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Immutable snapshot of a message sender, taken per message and discarded
/// after handling. Never cached across messages.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: UserId,
    pub display_name: String,
    pub is_bot: bool,
    /// Guild-scoped permission bits; `None` outside a guild.
    pub guild_perms: Option<GuildPerms>,
}

impl Identity {
    pub fn user(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            display_name: display_name.into(),
            is_bot: false,
            guild_perms: None,
        }
    }
}

/// Where a message arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    DirectMessage,
    GuildChannel,
}

/// Guild-level facts needed for access resolution.
#[derive(Debug, Clone)]
pub struct GuildContext {
    pub owner_id: UserId,
}

/// One inbound message event as delivered by the platform receive loop.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender: Identity,
    pub channel: ChannelId,
    pub kind: ChannelKind,
    pub guild: Option<GuildContext>,
    pub text: String,
    /// Non-user platform events (joins, pins, ...) that still surface as
    /// messages. The router drops these without a response.
    pub system: bool,
}

impl InboundMessage {
    pub fn new(sender: Identity, channel: ChannelId, kind: ChannelKind, text: impl Into<String>) -> Self {
        Self {
            sender,
            channel,
            kind,
            guild: None,
            text: text.into(),
            system: false,
        }
    }
}

/// The bot's own identity, used for self-message guards and mention matching.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: UserId,
    pub display_name: String,
}

/// Everything a command handler gets to work with. Built fresh per dispatch.
#[derive(Clone)]
pub struct CommandContext {
    pub transport: Arc<dyn ChatTransport>,
    pub table: Arc<CommandTable>,
    pub gate: PreconditionGate,
    pub channel: ChannelId,
    pub kind: ChannelKind,
    pub sender: Identity,
    pub level: AccessLevel,
}

/// Reply into the channel the triggering message came from.
pub async fn send_text(ctx: &CommandContext, text: impl Into<String>) -> Result<()> {
    ctx.transport
        .send_message(&ctx.channel, &text.into())
        .await
        .with_context(|| format!("sending reply to {}", ctx.channel))
}
