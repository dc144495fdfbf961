//! # rtail - Reverse Log Tailing Agent
//!
//! A small HTTP agent that serves the tail of large log files newest line
//! first, reading them backward in bounded chunks so memory stays flat
//! regardless of file size.
//!
//! ## Features
//!
//! - **Reverse Streaming**: Lines are delivered last-to-first as chunks are read
//! - **Keyword Extraction**: Optional substring filter with a match limit that stops the scan early
//! - **Backpressure**: The reader pauses while the HTTP client is slow to drain
//! - **Access Control**: Only files below configured log directories can be tailed
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`config`] - TOML runtime configuration
//! - [`tail`] - Chunked reverse reader and line reconstruction
//! - [`extract`] - Filtering sink and output transports
//! - [`registry`] - Allow-list of tailable files
//! - [`server`] - HTTP routes and response streaming

// Core modules
pub mod config;
pub mod error;

// Reading and extraction
pub mod extract;
pub mod tail;

// HTTP agent
pub mod registry;
pub mod server;

// Re-export commonly used types for convenience
pub use error::{Result, TailError};

// Public API surface for external usage
pub use config::Config;
pub use extract::{ChannelTransport, LineFilter, OutputTransport, StreamingExtractor};
pub use registry::AccessRegistry;
pub use tail::{ExtractionSink, Line, ReverseChunkReader, TailOutcome, TailSettings, TailSummary};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
