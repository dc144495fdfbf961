//! Output transports.
//!
//! A transport accepts bytes without blocking or hands them back when it is
//! full. The producer then awaits [`OutputTransport::ready`] and retries with
//! the same bytes, so backpressure never drops or duplicates output.

use crate::error::{Result, TailError};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Result of a non-blocking write
#[derive(Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The bytes were taken
    Accepted,
    /// The transport is full; the bytes are returned untouched
    Pending(Bytes),
    /// The consumer is gone
    Closed,
}

/// Destination of extracted output.
#[async_trait]
pub trait OutputTransport: Send {
    /// Offer `bytes` to the consumer without waiting
    fn write(&mut self, bytes: Bytes) -> WriteOutcome;

    /// Resolve once a write is likely to be accepted again
    async fn ready(&mut self) -> Result<()>;

    /// Report that the output failed and will not be completed
    async fn fail(&mut self, message: String);

    /// Finish the output
    async fn end(&mut self);
}

/// Unit sent through a [`ChannelTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(Bytes),
    Failed(String),
}

impl Frame {
    pub fn into_data(self) -> Option<Bytes> {
        match self {
            Frame::Data(bytes) => Some(bytes),
            Frame::Failed(_) => None,
        }
    }
}

/// Transport backed by a bounded tokio channel.
///
/// A full channel is backpressure; a dropped receiver means the consumer
/// disconnected. Ending the output drops the sender, which closes the stream
/// on the receiving side.
#[derive(Debug)]
pub struct ChannelTransport {
    tx: Option<mpsc::Sender<Frame>>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<Frame>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Create a transport together with the receiving end
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl OutputTransport for ChannelTransport {
    fn write(&mut self, bytes: Bytes) -> WriteOutcome {
        let Some(tx) = self.tx.as_ref() else {
            return WriteOutcome::Closed;
        };
        match tx.try_send(Frame::Data(bytes)) {
            Ok(()) => WriteOutcome::Accepted,
            Err(TrySendError::Full(frame)) => frame
                .into_data()
                .map_or(WriteOutcome::Closed, WriteOutcome::Pending),
            Err(TrySendError::Closed(_)) => WriteOutcome::Closed,
        }
    }

    async fn ready(&mut self) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(TailError::Disconnected)?;
        // Only this transport sends, so the released slot stays free for the retry
        tx.reserve().await.map(drop).map_err(|_| TailError::Disconnected)
    }

    async fn fail(&mut self, message: String) {
        if let Some(tx) = self.tx.take() {
            if tx.send(Frame::Failed(message)).await.is_err() {
                log::debug!("consumer gone before failure could be reported");
            }
        }
    }

    async fn end(&mut self) {
        self.tx = None;
    }
}

/// Transport that collects output in memory.
///
/// It can be told to refuse a number of writes and to delay readiness, which
/// simulates a slow consumer.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    output: Vec<u8>,
    refusals_left: usize,
    ready_delay: Duration,
    ready_waits: usize,
    failure: Option<String>,
    ended: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report "not ready" for the next `refusals` writes, and take `ready_delay`
    /// to signal readiness after each refusal
    pub fn with_backpressure(refusals: usize, ready_delay: Duration) -> Self {
        Self {
            refusals_left: refusals,
            ready_delay,
            ..Self::default()
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// Number of times a producer waited for readiness
    pub fn ready_waits(&self) -> usize {
        self.ready_waits
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

#[async_trait]
impl OutputTransport for MemoryTransport {
    fn write(&mut self, bytes: Bytes) -> WriteOutcome {
        if self.ended || self.failure.is_some() {
            return WriteOutcome::Closed;
        }
        if self.refusals_left > 0 {
            self.refusals_left -= 1;
            return WriteOutcome::Pending(bytes);
        }
        self.output.extend_from_slice(&bytes);
        WriteOutcome::Accepted
    }

    async fn ready(&mut self) -> Result<()> {
        self.ready_waits += 1;
        if !self.ready_delay.is_zero() {
            tokio::time::sleep(self.ready_delay).await;
        }
        Ok(())
    }

    async fn fail(&mut self, message: String) {
        self.failure = Some(message);
    }

    async fn end(&mut self) {
        self.ended = true;
    }
}
