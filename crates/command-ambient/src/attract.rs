//! Periodic conversation starter: every period, drops a random configured
//! line into the channel where it was started. Globally scoped, so only one
//! instance runs across the whole bot, with a cooldown between runs.

use core::time::Duration;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom as _;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use router_core::{
    AmbientSupervisor, ChannelId, ChatTransport, Command, CommandContext, Scope, StartOutcome,
    StopOutcome, send_text,
};

use crate::Action;

pub struct Attract {
    supervisor: Arc<AmbientSupervisor>,
    lines: Arc<Vec<String>>,
    period: Duration,
    rounds: u32,
}

impl Attract {
    #[must_use]
    pub fn new(
        supervisor: Arc<AmbientSupervisor>,
        lines: Vec<String>,
        period: Duration,
        rounds: u32,
    ) -> Self {
        Self {
            supervisor,
            lines: Arc::new(lines),
            period,
            rounds,
        }
    }

    async fn start(&self, ctx: &CommandContext) -> Result<()> {
        if self.lines.is_empty() {
            return send_text(ctx, "No conversation starters configured.").await;
        }
        let transport = Arc::clone(&ctx.transport);
        let channel = ctx.channel.clone();
        let lines = Arc::clone(&self.lines);
        let period = self.period;
        let rounds = self.rounds;
        let outcome = self
            .supervisor
            .start(Scope::Global, move |token| {
                attract_loop(transport, channel, lines, period, rounds, token)
            })
            .await;
        match outcome {
            StartOutcome::Started => send_text(ctx, "I'll keep this place lively for a while.").await,
            StartOutcome::AlreadyRunning => send_text(ctx, "Already on it.").await,
            StartOutcome::TooSoon => {
                send_text(ctx, "I just did a round of that, give it some time.").await
            }
        }
    }

    async fn stop(&self, ctx: &CommandContext) -> Result<()> {
        match self.supervisor.stop(&Scope::Global).await {
            StopOutcome::Stopped => send_text(ctx, "Going quiet.").await,
            StopOutcome::NotRunning => send_text(ctx, "I wasn't doing anything.").await,
        }
    }
}

#[async_trait]
impl Command for Attract {
    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<()> {
        match Action::parse(args) {
            Some(Action::Start) => self.start(ctx).await,
            Some(Action::Stop) => self.stop(ctx).await,
            None => send_text(ctx, "usage: attract <start|stop>").await,
        }
    }
}

/// Bounded loop: waits out the period, then posts one random line, for at
/// most `rounds` rounds. The cancellation signal is checked on every wait.
async fn attract_loop(
    transport: Arc<dyn ChatTransport>,
    channel: ChannelId,
    lines: Arc<Vec<String>>,
    period: Duration,
    rounds: u32,
    token: CancellationToken,
) -> Result<()> {
    for round in 0..rounds {
        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(period) => {}
        }
        // Scope the RNG so it does not live across the send await.
        let line = {
            let mut rng = rand::thread_rng();
            lines.choose(&mut rng).cloned()
        };
        if let Some(line) = line {
            debug!(channel = %channel, round, "posting conversation starter");
            transport.send_message(&channel, &line).await?;
        }
    }
    Ok(())
}
