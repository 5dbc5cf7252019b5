//! Recording doubles for the transport-boundary traits, shared by this
//! crate's tests and by the command crates' tests.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{ChannelId, ChatFallback, ChatTransport, DeliveryError, ErrorResponder, Identity, UserId};

/// Captures channel sends and private notices; optionally fails every send
/// to exercise delivery-error paths.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    fail: bool,
    sent: Mutex<Vec<(ChannelId, String)>>,
    private: Mutex<Vec<(UserId, String)>>,
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().unwrap().clone()
    }

    #[must_use]
    pub fn private_notices(&self) -> Vec<(UserId, String)> {
        self.private.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, channel: &ChannelId, text: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Unreachable(channel.0.clone()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel.clone(), text.to_owned()));
        Ok(())
    }

    async fn send_private(&self, user: &UserId, text: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Unreachable(user.0.clone()));
        }
        self.private
            .lock()
            .unwrap()
            .push((user.clone(), text.to_owned()));
        Ok(())
    }
}

/// Captures fallback calls: (sender id, original text, address_user).
#[derive(Debug, Default)]
pub struct RecordingFallback {
    calls: Mutex<Vec<(UserId, String, bool)>>,
}

impl RecordingFallback {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn calls(&self) -> Vec<(UserId, String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatFallback for RecordingFallback {
    async fn reply(
        &self,
        sender: &Identity,
        _channel: &ChannelId,
        text: &str,
        address_user: bool,
    ) -> Result<(), DeliveryError> {
        self.calls
            .lock()
            .unwrap()
            .push((sender.id.clone(), text.to_owned(), address_user));
        Ok(())
    }
}

/// Captures error reports: (requester id, failed input, reason).
#[derive(Debug, Default)]
pub struct RecordingResponder {
    reports: Mutex<Vec<(UserId, String, String)>>,
}

impl RecordingResponder {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn reports(&self) -> Vec<(UserId, String, String)> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ErrorResponder for RecordingResponder {
    async fn report(
        &self,
        requester: &Identity,
        failed_input: &str,
        reason: &str,
    ) -> Result<(), DeliveryError> {
        self.reports
            .lock()
            .unwrap()
            .push((requester.id.clone(), failed_input.to_owned(), reason.to_owned()));
        Ok(())
    }
}
