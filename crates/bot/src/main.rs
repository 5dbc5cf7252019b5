mod commands;
mod config;
mod console;
mod fallback;
mod logging;

use core::time::Duration;
use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{debug, info};

use router_core::{
    AccessResolver, AmbientSupervisor, BotIdentity, ChannelId, ChannelKind, ChatFallback,
    ChatTransport, ErrorResponder, Identity, InboundMessage, MessageRouter, PreconditionGate,
    PrefixMatcher, UserId,
};

use crate::console::ConsoleTransport;
use crate::fallback::{CannedFallback, PrivateNotices};
use crate::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about = "Chat command router bot")]
struct Args {
    /// Path to the YAML bot configuration
    #[arg(long, env = "SWITCHBOARD_CONFIG", default_value = "./config.yaml")]
    config: PathBuf,

    /// Authorize every command regardless of access level (debug bypass)
    #[arg(long, env = "SWITCHBOARD_PERMIT_ALL")]
    permit_all: bool,

    /// Sender id the console operator appears as
    #[arg(long, env = "SWITCHBOARD_OPERATOR", default_value = "operator")]
    operator: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // Load .env if present so clap can pick up env vars.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = config::load(&args.config).context("loading bot configuration")?;
    let permit_all = args.permit_all || config.permit_all;
    if permit_all {
        print_bypass_banner();
    }

    let playback_sup = Arc::new(supervisor(config.playback.cooldown_secs));
    let attract_sup = Arc::new(supervisor(config.attract.cooldown_secs));
    let table = Arc::new(commands::build_table(&config, &playback_sup, &attract_sup)?);
    info!(commands = table.len(), "command table registered");

    let transport: Arc<dyn ChatTransport> = Arc::new(ConsoleTransport);
    let fallback: Arc<dyn ChatFallback> = Arc::new(CannedFallback::new(
        Arc::clone(&transport),
        config.fallback_replies.clone(),
    ));
    let errors: Arc<dyn ErrorResponder> = Arc::new(PrivateNotices::new(Arc::clone(&transport)));

    let router = MessageRouter::new(
        BotIdentity {
            id: UserId(config.bot_id.clone()),
            display_name: config.bot_name.clone(),
        },
        PrefixMatcher::new(
            config.prefixes.clone(),
            config.sub_prefixes.clone(),
            Some(config.mention_token()),
        ),
        AccessResolver::new(config.owner_ids.iter().map(|id| UserId(id.clone()))),
        PreconditionGate::new(permit_all),
        Arc::clone(&table),
        transport,
        fallback,
        errors,
    );

    let operator = Identity::user(args.operator.clone(), args.operator.clone());
    let mut lines = console::spawn_stdin_reader();
    info!(operator = %operator.id, "console ready, type a message; ctrl-c to quit");

    loop {
        tokio::select! {
            maybe_line = lines.recv() => {
                let Some(text) = maybe_line else {
                    info!("stdin closed");
                    break;
                };
                let msg = InboundMessage::new(
                    operator.clone(),
                    ChannelId::from("console"),
                    ChannelKind::DirectMessage,
                    text,
                );
                let outcome = router.handle(msg).await;
                debug!(?outcome, "handled console line");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    let stopped = playback_sup.stop_all().await + attract_sup.stop_all().await;
    if stopped > 0 {
        info!(stopped, "cancelled ambient runners");
    }
    Ok(())
}

fn supervisor(cooldown_secs: u64) -> AmbientSupervisor {
    if cooldown_secs == 0 {
        AmbientSupervisor::new()
    } else {
        AmbientSupervisor::with_cooldown(Duration::from_secs(cooldown_secs))
    }
}

/// Loud so a forgotten bypass cannot hide in scrollback.
fn print_bypass_banner() {
    let is_tty = std::io::stderr().is_terminal();
    let body = "==============================\n  PERMIT-ALL ACTIVE\n  every command is authorized for everyone\n==============================";
    if is_tty {
        eprintln!("\x1b[1;33m{body}\x1b[0m");
    } else {
        eprintln!("{body}");
    }
}
