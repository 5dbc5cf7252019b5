//! Boundary traits towards the chat platform and the conversational
//! fallback. The router core never touches a platform SDK directly; the
//! composition root supplies implementations of these.

use async_trait::async_trait;
use thiserror::Error;

use crate::{ChannelId, Identity, UserId};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("recipient {0} unreachable")]
    Unreachable(String),
    #[error("transport closed")]
    Closed,
}

/// Outbound message delivery. Implementations must be safe for concurrent
/// use: ambient runners and the router send through the same instance.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send text into a channel.
    async fn send_message(&self, channel: &ChannelId, text: &str) -> Result<(), DeliveryError>;

    /// Deliver a private notice to a user, outside any shared channel.
    async fn send_private(&self, user: &UserId, text: &str) -> Result<(), DeliveryError>;
}

/// Free-form conversational responder for messages that address the bot but
/// match no command. Opaque beyond this contract.
#[async_trait]
pub trait ChatFallback: Send + Sync {
    /// `address_user` controls whether the reply names the sender; DM replies
    /// do not.
    async fn reply(
        &self,
        sender: &Identity,
        channel: &ChannelId,
        text: &str,
        address_user: bool,
    ) -> Result<(), DeliveryError>;
}

/// Structured error reporting back to the requester, conventionally as a
/// private notice rather than into the original channel.
#[async_trait]
pub trait ErrorResponder: Send + Sync {
    async fn report(
        &self,
        requester: &Identity,
        failed_input: &str,
        reason: &str,
    ) -> Result<(), DeliveryError>;
}
