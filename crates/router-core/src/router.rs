//! Per-message classification and dispatch.
//!
//! Every inbound event runs the same machine: decide whether the bot is
//! addressed, find the command, authorize it, and fall back to free-form
//! chat or a structured error notice. Classification itself never fails;
//! only handler invocation and outbound delivery can, and those are caught
//! here.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::gate::Authorization;
use crate::{
    AccessResolver, BotIdentity, ChannelKind, ChatFallback, ChatTransport, CommandContext,
    CommandTable, ErrorResponder, InboundMessage, PreconditionGate, PrefixMatcher,
};

const DM_PREFIX_NOTICE: &str = "No prefix needed here, just type the command.";

/// Terminal state of handling one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Own/system message, or an unaddressed guild message. No response.
    Ignored,
    /// Command found, authorized and completed.
    Dispatched { command: String },
    /// Command found and authorized, but the handler returned an error; the
    /// requester was notified privately.
    HandlerFailed { command: String },
    /// Command found but the requester's level was insufficient.
    Denied { command: String },
    /// Unknown command carrying a sub-command marker; a typo notice naming
    /// the token went out.
    TypoNotice { token: String },
    /// Unknown non-command text, forwarded to the conversational fallback.
    ChattedFallback,
    /// DM began with a prefix; told the sender none is needed there.
    PrefixNotNeeded,
}

pub struct MessageRouter {
    bot: BotIdentity,
    matcher: PrefixMatcher,
    resolver: AccessResolver,
    gate: PreconditionGate,
    table: Arc<CommandTable>,
    transport: Arc<dyn ChatTransport>,
    fallback: Arc<dyn ChatFallback>,
    errors: Arc<dyn ErrorResponder>,
}

impl MessageRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bot: BotIdentity,
        matcher: PrefixMatcher,
        resolver: AccessResolver,
        gate: PreconditionGate,
        table: Arc<CommandTable>,
        transport: Arc<dyn ChatTransport>,
        fallback: Arc<dyn ChatFallback>,
        errors: Arc<dyn ErrorResponder>,
    ) -> Self {
        Self {
            bot,
            matcher,
            resolver,
            gate,
            table,
            transport,
            fallback,
            errors,
        }
    }

    pub async fn handle(&self, msg: InboundMessage) -> RouteOutcome {
        if msg.system || msg.sender.id == self.bot.id {
            debug!(sender = %msg.sender.id, system = msg.system, "dropping own/system message");
            return RouteOutcome::Ignored;
        }
        match msg.kind {
            ChannelKind::GuildChannel => self.handle_guild(msg).await,
            ChannelKind::DirectMessage => self.handle_dm(msg).await,
        }
    }

    async fn handle_guild(&self, msg: InboundMessage) -> RouteOutcome {
        let Some(matched) = self.matcher.match_text(&msg.text) else {
            // Shared channel, bot not addressed. Never treated as chat.
            return RouteOutcome::Ignored;
        };
        let rest = &msg.text[matched.command_start..];
        let (name, args) = split_command(rest);
        debug!(channel = %msg.channel, via = ?matched.via, command = %name, "addressed in guild channel");
        let name = name.to_owned();
        let args = args.to_owned();
        self.dispatch(msg, &name, &args, true).await
    }

    async fn handle_dm(&self, msg: InboundMessage) -> RouteOutcome {
        if msg.sender.display_name == self.bot.display_name {
            debug!(sender = %msg.sender.id, "dropping DM from namesake");
            return RouteOutcome::Ignored;
        }
        if self.matcher.match_text(&msg.text).is_some() {
            // DMs are always addressed; a prefix only gets in the way.
            if let Err(error) = self
                .transport
                .send_message(&msg.channel, DM_PREFIX_NOTICE)
                .await
            {
                warn!(channel = %msg.channel, error = %error, "failed to deliver prefix notice");
            }
            return RouteOutcome::PrefixNotNeeded;
        }
        let (name, args) = split_command(&msg.text);
        let name = name.to_owned();
        let args = args.to_owned();
        self.dispatch(msg, &name, &args, false).await
    }

    async fn dispatch(
        &self,
        msg: InboundMessage,
        name: &str,
        args: &str,
        in_guild: bool,
    ) -> RouteOutcome {
        if let Some(spec) = self.table.lookup(name) {
            let level = self.resolver.resolve(&msg.sender, msg.guild.as_ref());
            match self.gate.authorize(spec.required, level) {
                Authorization::Allow => {
                    let command = spec.name().to_owned();
                    info!(command = %command, sender = %msg.sender.id, level = %level, "dispatching");
                    let ctx = CommandContext {
                        transport: Arc::clone(&self.transport),
                        table: Arc::clone(&self.table),
                        gate: self.gate,
                        channel: msg.channel.clone(),
                        kind: msg.kind,
                        sender: msg.sender.clone(),
                        level,
                    };
                    match spec.handler.run(&ctx, args).await {
                        Ok(()) => RouteOutcome::Dispatched { command },
                        Err(error) => {
                            warn!(command = %command, error = %error, "handler failed");
                            self.report(&msg, &error.to_string()).await;
                            RouteOutcome::HandlerFailed { command }
                        }
                    }
                }
                Authorization::Deny { reason } => {
                    let command = spec.name().to_owned();
                    info!(command = %command, sender = %msg.sender.id, level = %level, "denied");
                    self.report(&msg, reason).await;
                    RouteOutcome::Denied { command }
                }
            }
        } else if self.matcher.is_sub_prefixed(name) {
            // Marked as a command but unknown: almost certainly a typo.
            let reason = self.typo_reason(name);
            info!(token = %name, sender = %msg.sender.id, "unknown marked command");
            self.report(&msg, &reason).await;
            RouteOutcome::TypoNotice {
                token: name.to_owned(),
            }
        } else {
            debug!(sender = %msg.sender.id, "no command matched, chatting");
            if let Err(error) = self
                .fallback
                .reply(&msg.sender, &msg.channel, &msg.text, in_guild)
                .await
            {
                warn!(channel = %msg.channel, error = %error, "chat fallback failed");
            }
            RouteOutcome::ChattedFallback
        }
    }

    fn typo_reason(&self, token: &str) -> String {
        let stripped = self.matcher.strip_sub_prefix(token);
        let mut reason = format!("unknown command {token:?}");
        if !stripped.is_empty() {
            let near: Vec<&str> = self
                .table
                .search(stripped)
                .into_iter()
                .take(3)
                .map(|spec| spec.name())
                .collect();
            if !near.is_empty() {
                reason.push_str(&format!(", did you mean {}?", near.join(", ")));
            }
        }
        reason
    }

    async fn report(&self, msg: &InboundMessage, reason: &str) {
        if let Err(error) = self.errors.report(&msg.sender, &msg.text, reason).await {
            warn!(sender = %msg.sender.id, error = %error, "failed to deliver error notice");
        }
    }
}

/// Tokenization splits on a single ASCII space; no command token means an
/// empty name, which routes through the unknown-command path.
fn split_command(rest: &str) -> (&str, &str) {
    rest.split_once(' ').unwrap_or((rest, ""))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::testing::{RecordingFallback, RecordingResponder, RecordingTransport};
    use crate::{
        AccessLevel, ChannelId, Command, CommandSpec, GuildContext, GuildPerms, Identity, UserId,
        send_text,
    };

    struct Ack;

    #[async_trait]
    impl Command for Ack {
        async fn run(&self, ctx: &CommandContext, args: &str) -> Result<()> {
            send_text(ctx, format!("ack {args}")).await
        }
    }

    struct Boom;

    #[async_trait]
    impl Command for Boom {
        async fn run(&self, _ctx: &CommandContext, _args: &str) -> Result<()> {
            anyhow::bail!("dice jammed")
        }
    }

    struct Fixture {
        router: MessageRouter,
        transport: Arc<RecordingTransport>,
        fallback: Arc<RecordingFallback>,
        errors: Arc<RecordingResponder>,
    }

    fn fixture() -> Fixture {
        let mut table = CommandTable::new();
        table
            .register(CommandSpec::new(
                vec!["help".to_owned()],
                AccessLevel::User,
                "list commands",
                Arc::new(Ack),
            ))
            .unwrap();
        table
            .register(CommandSpec::new(
                vec!["attract".to_owned()],
                AccessLevel::ServerMod,
                "conversation starters",
                Arc::new(Ack),
            ))
            .unwrap();
        table
            .register(CommandSpec::new(
                vec!["roll".to_owned()],
                AccessLevel::User,
                "roll dice",
                Arc::new(Boom),
            ))
            .unwrap();

        let transport = RecordingTransport::new();
        let fallback = RecordingFallback::new();
        let errors = RecordingResponder::new();
        let router = MessageRouter::new(
            BotIdentity {
                id: UserId::from("bot-1"),
                display_name: "Switchboard".to_owned(),
            },
            PrefixMatcher::new(
                vec!["!".to_owned()],
                vec!["#".to_owned()],
                Some("@switchboard".to_owned()),
            ),
            AccessResolver::new([UserId::from("owner-1")]),
            PreconditionGate::new(false),
            Arc::new(table),
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
            Arc::clone(&fallback) as Arc<dyn ChatFallback>,
            Arc::clone(&errors) as Arc<dyn ErrorResponder>,
        );
        Fixture {
            router,
            transport,
            fallback,
            errors,
        }
    }

    fn guild_msg(text: &str) -> InboundMessage {
        let mut msg = InboundMessage::new(
            Identity::user("user-7", "Sam"),
            ChannelId::from("general"),
            ChannelKind::GuildChannel,
            text,
        );
        msg.guild = Some(GuildContext {
            owner_id: UserId::from("guild-owner"),
        });
        msg
    }

    fn dm_msg(text: &str) -> InboundMessage {
        InboundMessage::new(
            Identity::user("user-7", "Sam"),
            ChannelId::from("dm-7"),
            ChannelKind::DirectMessage,
            text,
        )
    }

    #[tokio::test]
    async fn guild_command_dispatches() {
        let f = fixture();
        let outcome = f.router.handle(guild_msg("!help now")).await;
        assert_eq!(
            outcome,
            RouteOutcome::Dispatched {
                command: "help".to_owned()
            }
        );
        assert_eq!(f.transport.sent()[0].1, "ack now");
    }

    #[tokio::test]
    async fn guild_mention_dispatches_too() {
        let f = fixture();
        let outcome = f.router.handle(guild_msg("@Switchboard: help")).await;
        assert_eq!(
            outcome,
            RouteOutcome::Dispatched {
                command: "help".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn unaddressed_guild_message_is_ignored() {
        let f = fixture();
        let outcome = f.router.handle(guild_msg("morning everyone")).await;
        assert_eq!(outcome, RouteOutcome::Ignored);
        assert!(f.transport.sent().is_empty());
        assert!(f.fallback.calls().is_empty());
    }

    #[tokio::test]
    async fn marked_unknown_command_gets_typo_notice() {
        let f = fixture();
        let outcome = f.router.handle(guild_msg("!#nosuchcmd")).await;
        assert_eq!(
            outcome,
            RouteOutcome::TypoNotice {
                token: "#nosuchcmd".to_owned()
            }
        );
        let reports = f.errors.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].2.contains("#nosuchcmd"));
    }

    #[tokio::test]
    async fn typo_notice_suggests_near_matches() {
        let f = fixture();
        f.router.handle(guild_msg("!#hel")).await;
        assert!(f.errors.reports()[0].2.contains("did you mean help"));
    }

    #[tokio::test]
    async fn unmarked_unknown_text_chats_with_username_in_guild() {
        let f = fixture();
        let outcome = f.router.handle(guild_msg("!just chatting")).await;
        assert_eq!(outcome, RouteOutcome::ChattedFallback);
        let calls = f.fallback.calls();
        assert_eq!(calls, vec![(UserId::from("user-7"), "!just chatting".to_owned(), true)]);
        assert!(f.errors.reports().is_empty());
    }

    #[tokio::test]
    async fn dm_dispatches_without_prefix() {
        let f = fixture();
        let outcome = f.router.handle(dm_msg("help me out")).await;
        assert_eq!(
            outcome,
            RouteOutcome::Dispatched {
                command: "help".to_owned()
            }
        );
        assert_eq!(f.transport.sent()[0].1, "ack me out");
    }

    #[tokio::test]
    async fn dm_unknown_text_chats_without_username() {
        let f = fixture();
        let outcome = f.router.handle(dm_msg("hello")).await;
        assert_eq!(outcome, RouteOutcome::ChattedFallback);
        assert_eq!(f.fallback.calls(), vec![(UserId::from("user-7"), "hello".to_owned(), false)]);
    }

    #[tokio::test]
    async fn dm_with_prefix_gets_notice_instead_of_dispatch() {
        let f = fixture();
        let outcome = f.router.handle(dm_msg("!help")).await;
        assert_eq!(outcome, RouteOutcome::PrefixNotNeeded);
        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelId::from("dm-7"));
        assert!(sent[0].1.contains("No prefix needed"));
    }

    #[tokio::test]
    async fn dm_marked_unknown_first_token_is_a_typo() {
        let f = fixture();
        let outcome = f.router.handle(dm_msg("#nosuchcmd")).await;
        assert_eq!(
            outcome,
            RouteOutcome::TypoNotice {
                token: "#nosuchcmd".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn underprivileged_sender_is_denied_privately() {
        let f = fixture();
        let outcome = f.router.handle(guild_msg("!attract")).await;
        assert_eq!(
            outcome,
            RouteOutcome::Denied {
                command: "attract".to_owned()
            }
        );
        let reports = f.errors.reports();
        assert_eq!(reports[0].2, "insufficient permissions");
        assert!(f.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn moderator_clears_the_gate() {
        let f = fixture();
        let mut msg = guild_msg("!attract");
        msg.sender.guild_perms = Some(GuildPerms {
            manage_messages: true,
            ..GuildPerms::default()
        });
        assert_eq!(
            f.router.handle(msg).await,
            RouteOutcome::Dispatched {
                command: "attract".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn other_bots_resolve_blocked_and_are_denied() {
        let f = fixture();
        let mut msg = guild_msg("!help");
        msg.sender.is_bot = true;
        assert_eq!(
            f.router.handle(msg).await,
            RouteOutcome::Denied {
                command: "help".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn own_and_system_messages_are_dropped() {
        let f = fixture();
        let mut own = guild_msg("!help");
        own.sender.id = UserId::from("bot-1");
        assert_eq!(f.router.handle(own).await, RouteOutcome::Ignored);

        let mut system = guild_msg("!help");
        system.system = true;
        assert_eq!(f.router.handle(system).await, RouteOutcome::Ignored);

        let mut namesake = dm_msg("!help");
        namesake.sender.display_name = "Switchboard".to_owned();
        assert_eq!(f.router.handle(namesake).await, RouteOutcome::Ignored);
        assert!(f.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_is_reported_privately() {
        let f = fixture();
        let outcome = f.router.handle(guild_msg("!roll 2d6")).await;
        assert_eq!(
            outcome,
            RouteOutcome::HandlerFailed {
                command: "roll".to_owned()
            }
        );
        let reports = f.errors.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].1, "!roll 2d6");
        assert!(reports[0].2.contains("dice jammed"));
    }

    #[tokio::test]
    async fn bare_prefix_routes_to_chat() {
        let f = fixture();
        // "!" alone leaves an empty command name, which is unknown and
        // carries no marker.
        let outcome = f.router.handle(guild_msg("!")).await;
        assert_eq!(outcome, RouteOutcome::ChattedFallback);
    }
}
