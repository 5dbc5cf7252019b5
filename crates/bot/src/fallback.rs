//! Boundary collaborators the router talks to when a message is not a
//! dispatchable command: the canned chat fallback and the private error
//! responder.

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom as _;

use router_core::{
    ChannelId, ChatFallback, ChatTransport, DeliveryError, ErrorResponder, Identity,
};

/// Replies with a random canned line. A stand-in for a real conversational
/// engine; the router only cares about the trait.
pub struct CannedFallback {
    transport: Arc<dyn ChatTransport>,
    replies: Vec<String>,
}

impl CannedFallback {
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>, replies: Vec<String>) -> Self {
        Self { transport, replies }
    }
}

#[async_trait]
impl ChatFallback for CannedFallback {
    async fn reply(
        &self,
        sender: &Identity,
        channel: &ChannelId,
        _text: &str,
        address_user: bool,
    ) -> Result<(), DeliveryError> {
        let reply = {
            let mut rng = rand::thread_rng();
            self.replies.choose(&mut rng).cloned()
        }
        .unwrap_or_else(|| "Hm.".to_owned());
        let text = if address_user {
            format!("{}: {reply}", sender.display_name)
        } else {
            reply
        };
        self.transport.send_message(channel, &text).await
    }
}

/// Delivers error reports as private notices, away from the channel the
/// failing message was seen in.
pub struct PrivateNotices {
    transport: Arc<dyn ChatTransport>,
}

impl PrivateNotices {
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ErrorResponder for PrivateNotices {
    async fn report(
        &self,
        requester: &Identity,
        failed_input: &str,
        reason: &str,
    ) -> Result<(), DeliveryError> {
        let text = format!("Command failed: {reason} (while handling {failed_input:?})");
        self.transport.send_private(&requester.id, &text).await
    }
}
