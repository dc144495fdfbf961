//! Reverse tailing engine.
//!
//! The reader walks a file backward in bounded chunks ([`cursor`]), the
//! reconstructor rebuilds line boundaries from the reversed byte stream
//! ([`reconstructor`]), and completed lines are handed to an
//! [`ExtractionSink`] which decides what reaches the output.

pub mod cursor;
pub mod reader;
pub mod reconstructor;
pub mod sink;

pub use cursor::{ChunkRange, ReadCursor};
pub use reader::{ReverseChunkReader, TailOutcome, TailSettings, TailSummary};
pub use reconstructor::{Line, LineReconstructor};
pub use sink::{ExtractionSink, SinkSignal};
