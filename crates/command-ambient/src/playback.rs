//! Scripted playback: sends a configured sequence of lines into the channel
//! the command came from, one per step delay, until done or stopped.

use core::time::Duration;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use router_core::{
    AmbientSupervisor, ChannelId, ChatTransport, Command, CommandContext, Scope, StartOutcome,
    StopOutcome, send_text,
};

use crate::Action;

pub struct Playback {
    supervisor: Arc<AmbientSupervisor>,
    lines: Arc<Vec<String>>,
    step_delay: Duration,
}

impl Playback {
    #[must_use]
    pub fn new(
        supervisor: Arc<AmbientSupervisor>,
        lines: Vec<String>,
        step_delay: Duration,
    ) -> Self {
        Self {
            supervisor,
            lines: Arc::new(lines),
            step_delay,
        }
    }

    async fn start(&self, ctx: &CommandContext) -> Result<()> {
        let scope = Scope::Channel(ctx.channel.clone());
        let transport = Arc::clone(&ctx.transport);
        let channel = ctx.channel.clone();
        let lines = Arc::clone(&self.lines);
        let step_delay = self.step_delay;
        let outcome = self
            .supervisor
            .start(scope, move |token| {
                play_lines(transport, channel, lines, step_delay, token)
            })
            .await;
        match outcome {
            // The playback itself is the response.
            StartOutcome::Started => Ok(()),
            StartOutcome::AlreadyRunning => {
                send_text(ctx, "Already mid-performance in this channel.").await
            }
            StartOutcome::TooSoon => {
                send_text(ctx, "That one needs a breather, try again in a bit.").await
            }
        }
    }

    async fn stop(&self, ctx: &CommandContext) -> Result<()> {
        match self.supervisor.stop(&Scope::Channel(ctx.channel.clone())).await {
            StopOutcome::Stopped => send_text(ctx, "Okay, okay, stopping.").await,
            StopOutcome::NotRunning => send_text(ctx, "Nothing is playing here.").await,
        }
    }
}

#[async_trait]
impl Command for Playback {
    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<()> {
        match Action::parse(args) {
            Some(Action::Start) => self.start(ctx).await,
            Some(Action::Stop) => self.stop(ctx).await,
            None => send_text(ctx, "usage: playback <start|stop>").await,
        }
    }
}

/// Sends each line, re-checking the cancellation signal between every send
/// and delay. A delivery failure ends the run; the supervisor records
/// completion either way.
async fn play_lines(
    transport: Arc<dyn ChatTransport>,
    channel: ChannelId,
    lines: Arc<Vec<String>>,
    step_delay: Duration,
    token: CancellationToken,
) -> Result<()> {
    for line in lines.iter() {
        if token.is_cancelled() {
            break;
        }
        transport.send_message(&channel, line).await?;
        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(step_delay) => {}
        }
    }
    Ok(())
}
