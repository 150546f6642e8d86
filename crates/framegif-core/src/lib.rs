//! framegif-core: Frame selection, message protocol and controllers (sans-IO).
//!
//! A design-tool plugin runs in two contexts that only talk through
//! messages:
//!
//! - the **host**, which owns the design document and exports frames as
//!   PNG ([`HostController`]),
//! - the **UI**, which lists and reorders frames and assembles the
//!   animation ([`UiController`]).
//!
//! This crate has **no I/O dependencies**. Controllers take incoming
//! messages and return outgoing ones; the document and the animation
//! encoder are traits. All browser interaction lives in `framegif-io`,
//! the GIF encoder in `framegif-export`.

pub mod base64;
pub mod config;
pub mod debounce;
pub mod document;
pub mod encode;
pub mod frame_list;
pub mod host;
pub mod protocol;
pub mod types;
pub mod ui;

pub use config::{
    ConfigError, GifSettings, HostConfig, PartialFailurePolicy, PipelineVariant, Repeat,
    ResultDelivery, UiConfig,
};
pub use document::{Document, MemoryDocument};
pub use encode::{AnimationEncoder, EncoderFactory};
pub use frame_list::FrameList;
pub use host::HostController;
pub use protocol::{ConvertRequest, HostMessage, ProtocolError, UiMessage};
pub use types::{
    AnimationFormat, ConvertError, DocumentError, EncodedAnimation, FrameDescriptor, NodeId,
    NodeInfo, NodeKind, RasterFrame, UiError,
};
pub use ui::{EncodeJob, EncodeProgress, Status, UiController, UiEffect, UiPhase};
