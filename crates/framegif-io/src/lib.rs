//! framegif-io: Browser I/O and Dioxus components for framegif.
//!
//! This crate holds everything in the plugin UI that touches the
//! browser:
//!
//! - the `postMessage` bridge to the host ([`bridge`]),
//! - object URLs and file downloads ([`blob`], [`download`]),
//! - the encoder web worker ([`worker`]),
//! - the UI components ([`components`]).
//!
//! State transitions live in `framegif_core::UiController`; components
//! only render its state and report user input.

pub mod blob;
pub mod bridge;
pub mod components;
pub mod download;
pub mod worker;

pub use blob::{BlobError, ObjectUrl};
pub use bridge::{BridgeError, HostListener, post_to_host};
pub use components::{ConvertPanel, FrameListView, PreviewAsset, ResultPreview, StatusBar};
pub use download::{DownloadError, download_animation};
pub use worker::{EncoderWorker, WorkerError};
