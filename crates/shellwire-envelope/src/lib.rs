//! Result envelope decoding and category broadcast.
//!
//! Every frame an engine prints carries one JSON envelope with six output
//! categories. This crate decodes that envelope into typed values and
//! republishes each non-empty category on its own broadcast channel, so
//! observers can follow engine output independently of any single call.

pub mod category;
pub mod config;
pub mod demux;
pub mod envelope;
pub mod error;
pub mod format;
pub mod registry;

pub use category::{Category, CategoryValue, Decoding};
pub use config::ChannelConfig;
pub use demux::Demultiplexer;
pub use envelope::ResultEnvelope;
pub use error::{ParseError, Result};
pub use format::OutputFormat;
pub use registry::ChannelRegistry;
