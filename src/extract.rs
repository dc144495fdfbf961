//! Extraction pipeline: what happens to a line after the reader rebuilt it.
//!
//! - [`filter`] - Keyword matching and match-count limiting
//! - [`transport`] - Output transports with backpressure
//! - [`pipeline`] - The [`StreamingExtractor`] sink tying both together

pub mod filter;
pub mod pipeline;
pub mod transport;

pub use filter::LineFilter;
pub use pipeline::StreamingExtractor;
pub use transport::{ChannelTransport, Frame, MemoryTransport, OutputTransport, WriteOutcome};
