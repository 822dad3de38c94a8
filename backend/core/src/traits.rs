use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use crate::message::ReplyPayload;

/// Sink for replies produced while handling one invocation.
///
/// `reply` answers the invocation itself (interaction response or message
/// reply); `send` posts a fresh message in the invoking channel.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, payload: ReplyPayload) -> Result<()>;
    async fn send(&self, payload: ReplyPayload) -> Result<()>;
}

/// Which responder method produced a buffered payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Reply,
    Send,
}

/// In-memory responder that keeps every payload, in order.
#[derive(Default)]
pub struct BufferedResponder {
    sent: Mutex<Vec<(Delivery, ReplyPayload)>>,
}

impl BufferedResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<(Delivery, ReplyPayload)> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().map(|v| v.is_empty()).unwrap_or(true)
    }

    fn push(&self, delivery: Delivery, payload: ReplyPayload) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("responder buffer poisoned"))?
            .push((delivery, payload));
        Ok(())
    }
}

#[async_trait]
impl Responder for BufferedResponder {
    async fn reply(&self, payload: ReplyPayload) -> Result<()> {
        self.push(Delivery::Reply, payload)
    }

    async fn send(&self, payload: ReplyPayload) -> Result<()> {
        self.push(Delivery::Send, payload)
    }
}
