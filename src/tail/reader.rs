//! Chunked reverse reader.
//!
//! This module provides the [`ReverseChunkReader`], which reads a file from its
//! last byte toward its first in bounded chunks and pushes completed lines into
//! an [`ExtractionSink`]. Reads are strictly sequential: the range of chunk
//! *k+1* depends on where chunk *k* started.

use crate::config::MAX_READ_BYTES;
use crate::error::{Result, TailError};
use crate::tail::cursor::{ChunkRange, ReadCursor};
use crate::tail::reconstructor::LineReconstructor;
use crate::tail::sink::{ExtractionSink, SinkSignal};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;

/// Parameters of a reverse scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailSettings {
    /// Preferred chunk size in bytes
    pub buffer_size: usize,
    /// Hard cap on a single chunk, applied on top of `buffer_size`
    pub max_read_bytes: usize,
    /// Line delimiter byte
    pub delimiter: u8,
}

impl Default for TailSettings {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
            max_read_bytes: MAX_READ_BYTES,
            delimiter: b'\n',
        }
    }
}

impl TailSettings {
    /// Bytes read per iteration
    pub fn chunk_size(&self) -> usize {
        self.buffer_size.min(self.max_read_bytes)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(TailError::invalid_settings("buffer_size must be positive"));
        }
        if self.max_read_bytes == 0 {
            return Err(TailError::invalid_settings("max_read_bytes must be positive"));
        }
        Ok(())
    }
}

/// How a tail operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TailOutcome {
    /// Every byte of the file was scanned
    #[default]
    ReachedBeginning,
    /// The sink asked to stop before byte 0 was reached
    StoppedEarly,
    /// The cancellation token fired or the consumer went away
    Cancelled,
}

/// Counters describing a finished (or interrupted) tail operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailSummary {
    pub total_length: u64,
    pub chunks_read: usize,
    pub bytes_scanned: u64,
    pub lines_emitted: usize,
    pub outcome: TailOutcome,
}

/// Reads one file backward, chunk by chunk.
#[derive(Debug, Clone)]
pub struct ReverseChunkReader {
    path: PathBuf,
    settings: TailSettings,
}

impl ReverseChunkReader {
    pub fn new(path: impl Into<PathBuf>, settings: TailSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &TailSettings {
        &self.settings
    }

    /// Stream the file's lines into `sink`, last line first.
    ///
    /// The file is closed before `sink.on_completed()` runs, and `on_completed`
    /// runs exactly once on every path. Failures other than cancellation are
    /// reported to `sink.on_failure()` once and returned. Cancellation is not
    /// an error: the summary reports [`TailOutcome::Cancelled`].
    pub async fn tail<S>(&self, sink: &mut S, cancel: &CancellationToken) -> Result<TailSummary>
    where
        S: ExtractionSink + ?Sized,
    {
        let mut summary = TailSummary::default();

        let result = match self.scan(sink, cancel, &mut summary).await {
            Ok(()) => Ok(summary),
            Err(err) if err.is_cancellation() => {
                log::debug!("tail of {} cancelled: {err}", self.path.display());
                summary.outcome = TailOutcome::Cancelled;
                Ok(summary)
            }
            Err(err) => {
                if err.is_io() {
                    log::warn!("tail of {} failed: {err}", self.path.display());
                } else {
                    log::error!("tail of {} rejected: {err}", self.path.display());
                }
                sink.on_failure(&err).await;
                Err(err)
            }
        };

        sink.on_completed().await;
        result
    }

    async fn scan<S>(
        &self,
        sink: &mut S,
        cancel: &CancellationToken,
        summary: &mut TailSummary,
    ) -> Result<()>
    where
        S: ExtractionSink + ?Sized,
    {
        self.settings.validate()?;

        let mut file = File::open(&self.path)
            .await
            .map_err(|source| TailError::OpenFailed {
                path: self.path.clone(),
                source,
            })?;

        let total_length = file
            .metadata()
            .await
            .map_err(|source| TailError::StatFailed {
                path: self.path.clone(),
                source,
            })?
            .len();

        let chunk_size = self.settings.chunk_size();
        log::debug!(
            "tailing {} ({} bytes) in chunks of {} bytes",
            self.path.display(),
            total_length,
            chunk_size
        );

        let mut cursor = ReadCursor::at_end(total_length);
        let mut reconstructor = LineReconstructor::new(self.settings.delimiter);
        let capacity = usize::try_from(total_length).map_or(chunk_size, |len| len.min(chunk_size));
        let mut buffer = vec![0u8; capacity];
        summary.total_length = total_length;

        while !cursor.is_finished() {
            if cancel.is_cancelled() {
                return Err(TailError::Cancelled);
            }
            let Some(chunk) = cursor.next_chunk(chunk_size) else {
                break;
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TailError::Cancelled),
                read = read_chunk(&mut file, chunk, &mut buffer[..chunk.len()]) => {
                    read.map_err(|source| TailError::ReadFailed {
                        path: self.path.clone(),
                        position: chunk.start,
                        source,
                    })?;
                }
            }

            let mut lines = Vec::new();
            reconstructor.push_chunk(chunk.start, &buffer[..chunk.len()], &mut lines);
            if chunk.start == 0 {
                reconstructor.finish(&mut lines);
            }

            summary.chunks_read += 1;
            summary.bytes_scanned += chunk.len() as u64;
            summary.lines_emitted += lines.len();
            log::trace!(
                "chunk [{}, {}) produced {} lines, {} bytes pending",
                chunk.start,
                chunk.end,
                lines.len(),
                reconstructor.pending_len()
            );

            let signal = if lines.is_empty() {
                SinkSignal::Continue
            } else {
                sink.consume(lines).await?
            };
            cursor.advance(chunk, signal.is_stop());
        }

        summary.outcome = if cursor.reached_beginning() {
            TailOutcome::ReachedBeginning
        } else {
            TailOutcome::StoppedEarly
        };
        log::debug!(
            "tail of {} finished after {} chunks: {:?}",
            self.path.display(),
            summary.chunks_read,
            summary.outcome
        );
        Ok(())
    }
}

/// Read exactly the bytes of `chunk` into `buf`
async fn read_chunk(file: &mut File, chunk: ChunkRange, buf: &mut [u8]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(chunk.start)).await?;
    file.read_exact(buf).await?;
    Ok(())
}
