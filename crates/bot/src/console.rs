//! Local console channel: stdin lines become direct messages, outbound
//! sends go to stdout. Stands in for a real platform client.

use std::io::BufRead as _;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use router_core::{ChannelId, ChatTransport, DeliveryError, UserId};

/// Prints outbound traffic. Channel sends and private notices are kept
/// visually distinct so the routing behavior is obvious when driving the
/// bot by hand.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_message(&self, channel: &ChannelId, text: &str) -> Result<(), DeliveryError> {
        println!("[{channel}] {text}");
        Ok(())
    }

    async fn send_private(&self, user: &UserId, text: &str) -> Result<(), DeliveryError> {
        println!("(to {user}) {text}");
        Ok(())
    }
}

/// Reads stdin on a plain thread and forwards non-empty lines into an async
/// channel; the reader ends when stdin closes or the receiver is dropped.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if tx.blocking_send(line.to_owned()).is_err() {
                debug!("console receiver dropped, stopping stdin reader");
                break;
            }
        }
    });
    rx
}
