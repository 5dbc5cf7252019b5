//! Command-table wiring plus the trivial built-in leaves.

use core::time::Duration;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use command_ambient::{Attract, Playback};
use command_help::Help;
use router_core::{
    AccessLevel, AmbientSupervisor, Command, CommandContext, CommandSpec, CommandTable, send_text,
};

use crate::config::BotConfig;

struct Ping;

#[async_trait]
impl Command for Ping {
    async fn run(&self, ctx: &CommandContext, _args: &str) -> Result<()> {
        send_text(ctx, "pong").await
    }
}

/// Reports the requester's resolved access level; handy when debugging
/// owner/mod configuration.
struct Whoami;

#[async_trait]
impl Command for Whoami {
    async fn run(&self, ctx: &CommandContext, _args: &str) -> Result<()> {
        send_text(
            ctx,
            format!("{}, you rank as: {}", ctx.sender.display_name, ctx.level),
        )
        .await
    }
}

/// Registers every command. Runs once at startup; the table is read-only
/// afterwards.
pub fn build_table(
    config: &BotConfig,
    playback_sup: &Arc<AmbientSupervisor>,
    attract_sup: &Arc<AmbientSupervisor>,
) -> Result<CommandTable> {
    let prefix = config.prefixes.first().cloned().unwrap_or_default();
    let mut table = CommandTable::new();

    table.register(CommandSpec::new(
        vec!["help".to_owned(), "commands".to_owned()],
        AccessLevel::User,
        "list commands, or search with `help <fragment>`",
        Arc::new(Help::new(prefix)),
    ))?;
    table.register(CommandSpec::new(
        vec!["ping".to_owned()],
        AccessLevel::User,
        "check that I'm alive",
        Arc::new(Ping),
    ))?;
    table.register(CommandSpec::new(
        vec!["whoami".to_owned()],
        AccessLevel::User,
        "show your access level",
        Arc::new(Whoami),
    ))?;
    table.register(CommandSpec::new(
        vec!["playback".to_owned(), "play".to_owned()],
        AccessLevel::User,
        "perform the configured song in this channel: playback <start|stop>",
        Arc::new(Playback::new(
            Arc::clone(playback_sup),
            config.playback.lines.clone(),
            Duration::from_secs(config.playback.step_delay_secs),
        )),
    ))?;
    table.register(CommandSpec::new(
        vec!["attract".to_owned()],
        AccessLevel::ServerMod,
        "periodically post conversation starters: attract <start|stop>",
        Arc::new(Attract::new(
            Arc::clone(attract_sup),
            config.attract.lines.clone(),
            Duration::from_secs(config.attract.period_secs),
            config.attract.rounds,
        )),
    ))?;

    Ok(table)
}
