//! Consumer side of the reverse scan.

use crate::error::{Result, TailError};
use crate::tail::Line;
use async_trait::async_trait;

/// What the sink wants the reader to do after a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkSignal {
    /// Keep scanning toward the beginning of the file
    Continue,
    /// Enough output was produced; stop without reading further
    Stop,
}

impl SinkSignal {
    pub fn is_stop(self) -> bool {
        matches!(self, SinkSignal::Stop)
    }
}

/// Receiver of reconstructed lines.
///
/// The reader calls [`consume`](ExtractionSink::consume) once per chunk with the
/// lines that chunk completed, in reverse file order. It calls
/// [`on_failure`](ExtractionSink::on_failure) at most once, and
/// [`on_completed`](ExtractionSink::on_completed) exactly once after the file
/// handle has been released, whatever the outcome.
#[async_trait]
pub trait ExtractionSink: Send {
    /// Take ownership of a batch of lines.
    ///
    /// Returning [`TailError::Cancelled`] or [`TailError::Disconnected`] ends
    /// the scan as cancelled; any other error ends it as failed.
    async fn consume(&mut self, lines: Vec<Line>) -> Result<SinkSignal>;

    /// The scan failed and will not produce further lines
    async fn on_failure(&mut self, error: &TailError);

    /// The scan is over; finalize the output
    async fn on_completed(&mut self);
}
