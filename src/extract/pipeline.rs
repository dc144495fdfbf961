//! Streaming extraction sink.
//!
//! [`StreamingExtractor`] is the concrete [`ExtractionSink`]: it filters each
//! batch of lines, frames the survivors and pushes them into an
//! [`OutputTransport`], pausing the reader while the transport is full.

use crate::error::{Result, TailError};
use crate::extract::filter::LineFilter;
use crate::extract::transport::{OutputTransport, WriteOutcome};
use crate::tail::{ExtractionSink, Line, SinkSignal};
use async_trait::async_trait;
use bstr::ByteSlice;
use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::sync::CancellationToken;

/// First and last non-blank lines forwarded, trimmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LineProbe {
    first: Option<String>,
    last: Option<String>,
}

impl LineProbe {
    fn record(&mut self, line: &[u8]) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        let text = trimmed.to_str_lossy().into_owned();
        if self.first.is_none() {
            self.first = Some(text.clone());
        }
        self.last = Some(text);
    }
}

/// Sink that forwards filtered lines to a transport.
///
/// Forwarded lines are joined by the delimiter: the first one is written as
/// is, each later one is preceded by the delimiter byte. Each batch becomes a
/// single transport write.
pub struct StreamingExtractor<T> {
    transport: T,
    filter: LineFilter,
    delimiter: u8,
    cancel: CancellationToken,
    probe: Option<LineProbe>,
    lines_forwarded: usize,
    bytes_written: u64,
    backpressure_waits: usize,
    failed: bool,
    completed: bool,
}

impl<T: OutputTransport> StreamingExtractor<T> {
    pub fn new(transport: T, filter: LineFilter, delimiter: u8, cancel: CancellationToken) -> Self {
        Self {
            transport,
            filter,
            delimiter,
            cancel,
            probe: None,
            lines_forwarded: 0,
            bytes_written: 0,
            backpressure_waits: 0,
            failed: false,
            completed: false,
        }
    }

    /// Remember the first and last forwarded lines and log them at completion
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.probe = debug.then(LineProbe::default);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn filter(&self) -> &LineFilter {
        &self.filter
    }

    pub fn lines_forwarded(&self) -> usize {
        self.lines_forwarded
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn backpressure_waits(&self) -> usize {
        self.backpressure_waits
    }

    /// First non-blank line forwarded; only tracked in debug mode
    pub fn first_line_read(&self) -> Option<&str> {
        self.probe.as_ref().and_then(|probe| probe.first.as_deref())
    }

    /// Last non-blank line forwarded; only tracked in debug mode
    pub fn last_line_read(&self) -> Option<&str> {
        self.probe.as_ref().and_then(|probe| probe.last.as_deref())
    }

    fn frame_batch(&mut self, lines: Vec<Line>) -> BytesMut {
        let mut batch = BytesMut::new();
        for line in lines {
            if self.filter.is_limit_reached() {
                break;
            }
            if !self.filter.admit(line.as_bytes()) {
                continue;
            }
            if let Some(probe) = self.probe.as_mut() {
                probe.record(line.as_bytes());
            }
            if self.lines_forwarded > 0 {
                batch.put_u8(self.delimiter);
            }
            batch.put_slice(line.as_bytes());
            self.lines_forwarded += 1;
        }
        batch
    }

    /// Write `bytes`, waiting out backpressure until the transport takes them
    async fn send(&mut self, mut bytes: Bytes) -> Result<()> {
        let len = bytes.len() as u64;
        loop {
            match self.transport.write(bytes) {
                WriteOutcome::Accepted => {
                    self.bytes_written += len;
                    return Ok(());
                }
                WriteOutcome::Closed => return Err(TailError::Disconnected),
                WriteOutcome::Pending(returned) => {
                    bytes = returned;
                    self.backpressure_waits += 1;
                    log::trace!("transport full, pausing with {len} bytes pending");
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(TailError::Cancelled),
                        ready = self.transport.ready() => ready?,
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<T: OutputTransport> ExtractionSink for StreamingExtractor<T> {
    async fn consume(&mut self, lines: Vec<Line>) -> Result<SinkSignal> {
        let batch = self.frame_batch(lines);
        if !batch.is_empty() {
            self.send(batch.freeze()).await?;
        }

        if self.filter.is_limit_reached() {
            log::debug!(
                "match limit of {} reached, stopping scan",
                self.filter.matches_counted()
            );
            Ok(SinkSignal::Stop)
        } else {
            Ok(SinkSignal::Continue)
        }
    }

    async fn on_failure(&mut self, error: &TailError) {
        if self.failed {
            return;
        }
        self.failed = true;

        if self.bytes_written == 0 {
            log::error!("tail failed before any output: {error}");
        } else {
            log::error!(
                "tail failed after {} bytes, output is truncated: {error}",
                self.bytes_written
            );
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            _ = self.transport.fail(error.to_string()) => {}
        }
    }

    async fn on_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;

        if let Some(probe) = &self.probe {
            log::debug!(
                "tail complete: {} lines, {} bytes, first {:?}, last {:?}",
                self.lines_forwarded,
                self.bytes_written,
                probe.first,
                probe.last
            );
        }
        self.transport.end().await;
    }
}
