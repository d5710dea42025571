//! Sentinel-delimited framing over an engine's byte streams.
//!
//! The engine has no native request/response correlation. Each command's
//! result is printed on stdout as one frame:
//!
//! ```text
//! <head sentinel> payload <tail sentinel>
//! ```
//!
//! - [`FrameReader`] turns an arbitrarily chunked output stream into a lazy
//!   sequence of frame payloads (partial frames survive read boundaries, one
//!   chunk may yield many frames).
//! - [`TransportWriter`] writes encoded commands to the engine's input,
//!   suspending while the pipe is congested.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    extract_frame, Frame, FrameConfig, SentinelCodec, Sentinels, DEFAULT_HEAD, DEFAULT_MAX_FRAME,
    DEFAULT_TAIL,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::TransportWriter;
