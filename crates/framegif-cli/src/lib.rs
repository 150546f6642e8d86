//! framegif-cli: run the plugin's host and UI controllers in one process.
//!
//! A list of PNG files stands in for the design document: every file is
//! a selected frame. [`Session`] passes messages between a
//! [`HostController`](framegif_core::HostController) and a
//! [`UiController`](framegif_core::UiController) through their JSON wire
//! format, exactly as the plugin sandbox and the UI iframe would, and
//! runs the encoder jobs the UI asks for on the current thread.

pub mod session;
pub mod source;

pub use session::{Session, SessionError};
pub use source::{SourceError, load_document};
