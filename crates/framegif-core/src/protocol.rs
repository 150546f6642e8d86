//! Messages exchanged between host and UI.
//!
//! Both directions are tagged unions serialized as JSON objects with a
//! `type` field, e.g. `{"type":"frame-list","frames":[...]}`. Field
//! names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::types::{AnimationFormat, FrameDescriptor, NodeId};

/// Messages sent from the host to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostMessage {
    /// The current selection's frames, in selection order.
    FrameList { frames: Vec<FrameDescriptor> },

    /// Any failure, as a human-readable string.
    Error { message: String },

    /// Exported frames as base64 PNGs, in requested order, for
    /// UI-side encoding.
    #[serde(rename_all = "camelCase")]
    FrameImages {
        images: Vec<String>,
        format: AnimationFormat,
        frame_delay: u32,
    },

    /// A fully encoded animation produced by the host.
    #[serde(rename_all = "camelCase")]
    Success {
        data: Vec<u8>,
        #[serde(default)]
        format: AnimationFormat,
    },
}

impl HostMessage {
    /// The wire `type` tag, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FrameList { .. } => "frame-list",
            Self::Error { .. } => "error",
            Self::FrameImages { .. } => "frame-images",
            Self::Success { .. } => "success",
        }
    }

    /// Build an `error` message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// A conversion request: which frames, in which order, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub format: AnimationFormat,
    /// Per-frame delay in milliseconds.
    pub frame_delay: u32,
    /// Frame ids in export order.
    ///
    /// Empty means "the live selection": the host then converts the
    /// selected frames in document order, and reports
    /// [`ConvertError::NoSelection`] or
    /// [`ConvertError::NoFrameTypeSelected`] instead of
    /// [`ConvertError::NoValidFrames`] when there is nothing to take.
    /// See [`HostController::handle_convert_request`].
    ///
    /// [`ConvertError::NoSelection`]: crate::ConvertError::NoSelection
    /// [`ConvertError::NoFrameTypeSelected`]: crate::ConvertError::NoFrameTypeSelected
    /// [`ConvertError::NoValidFrames`]: crate::ConvertError::NoValidFrames
    /// [`HostController::handle_convert_request`]: crate::HostController::handle_convert_request
    pub frame_ids: Vec<NodeId>,
}

/// Messages sent from the UI to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiMessage {
    /// Ask the host to re-read the selection.
    RefreshFrames,

    /// Export the listed frames, in this order, and assemble them.
    Convert(ConvertRequest),

    /// The finished animation as base64, handed to the outer page.
    GifData { data: String },
}

impl UiMessage {
    /// The wire `type` tag, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RefreshFrames => "refresh-frames",
            Self::Convert(_) => "convert",
            Self::GifData { .. } => "gif-data",
        }
    }
}

/// Errors from decoding a message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Serialize a message to its JSON wire form.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if serialization fails.
pub fn to_json<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Parse a message from its JSON wire form.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] for invalid JSON, an unknown
/// `type` tag or missing fields.
pub fn from_json<'a, T: Deserialize<'a>>(json: &'a str) -> Result<T, ProtocolError> {
    Ok(serde_json::from_str(json)?)
}
