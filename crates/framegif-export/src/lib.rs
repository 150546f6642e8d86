//! framegif-export: Animation encoders (sans-IO)
//!
//! Turns ordered PNG frames into an animation file. Currently supports
//! GIF. [`run_job`] wraps the encoder for callers that report progress
//! across a thread or worker boundary.

pub mod gif;
pub mod job;

pub use gif::{EncodeError, GifEncoder, to_gif};
pub use job::{EncodeEvent, EncodeRequest, run_job};
